//! HTTP client for the to-do REST API
//!
//! One method per backend endpoint. Non-success responses keep the raw body
//! so it can be shown to the caller as-is.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::envelope::Collection;
use crate::model::{NewItem, UpdateItem};

/// Errors talking to the backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// What to show the caller: the backend's own body when it rejected the
    /// request, the error description otherwise.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            http,
            base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Send a request, turning non-success statuses into [`ApiError::Status`]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request: RequestBuilder = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            // Fall back to the status line so the message is never blank
            let body = match response.text().await {
                Ok(body) if !body.trim().is_empty() => body,
                Ok(_) => status.to_string(),
                Err(e) => {
                    debug!("Could not read error body from {}: {}", url, e);
                    status.to_string()
                }
            };
            debug!("{} answered {}: {}", url, status, body);
            return Err(ApiError::Status { status, body });
        }

        Ok(response)
    }

    /// Read a success body as JSON, or `None` when it isn't any
    async fn optional_json(response: Response) -> Result<Option<Value>, ApiError> {
        let url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { url, source })?;
        Ok(serde_json::from_str(&text).ok())
    }

    /// `GET /todoitems` or `GET /todolists`, body left unclassified
    pub async fn fetch_collection(&self, collection: Collection) -> Result<Value, ApiError> {
        let response = self.send(Method::GET, collection.path(), None::<&()>).await?;
        let url = response.url().to_string();
        response
            .json::<Value>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    /// `POST /todoitems`
    pub async fn create_item(&self, item: &NewItem) -> Result<Option<Value>, ApiError> {
        let response = self.send(Method::POST, "todoitems", Some(item)).await?;
        Self::optional_json(response).await
    }

    /// `PATCH /todoitems/{id}/complete`
    pub async fn complete_item(&self, id: i64) -> Result<Option<Value>, ApiError> {
        let path = format!("todoitems/{}/complete", id);
        let response = self.send(Method::PATCH, &path, None::<&()>).await?;
        Self::optional_json(response).await
    }

    /// `PUT /todoitems/{id}`
    pub async fn update_item(
        &self,
        id: i64,
        update: &UpdateItem,
    ) -> Result<Option<Value>, ApiError> {
        let path = format!("todoitems/{}", id);
        let response = self.send(Method::PUT, &path, Some(update)).await?;
        Self::optional_json(response).await
    }

    /// `DELETE /todoitems/{id}`
    pub async fn delete_item(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("todoitems/{}", id);
        self.send(Method::DELETE, &path, None::<&()>).await?;
        Ok(())
    }
}
