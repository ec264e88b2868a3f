//! Description-based resolution
//!
//! Turns a list name or item description into the backend record it refers
//! to. Every call fetches the collection fresh; matching is exact and
//! ignores case, and the first match in source order wins.

use thiserror::Error;
use tracing::debug;

use crate::client::{ApiClient, ApiError};
use crate::envelope::{Collection, Envelope, EnvelopeError};
use crate::model::{ToDoItem, ToDoList};

/// Why a name or description could not be resolved
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Transport(#[from] ApiError),

    #[error("unrecognized collection shape: {0}")]
    InvalidShape(#[from] EnvelopeError),

    #[error("collection is empty")]
    Empty,

    #[error("nothing matches '{0}'")]
    NotFound(String),
}

async fn fetch<T: serde::de::DeserializeOwned>(
    client: &ApiClient,
    collection: Collection,
) -> Result<Vec<T>, ResolveError> {
    let body = client.fetch_collection(collection).await?;
    let envelope = Envelope::parse(body, collection)?;
    debug!(
        "Fetched {} {} entries",
        envelope.entries().len(),
        collection.path()
    );
    Ok(envelope.decode())
}

/// Fetch every item, whatever envelope the backend wraps them in
pub async fn fetch_items(client: &ApiClient) -> Result<Vec<ToDoItem>, ResolveError> {
    fetch(client, Collection::Items).await
}

/// Fetch every list, whatever envelope the backend wraps them in
pub async fn fetch_lists(client: &ApiClient) -> Result<Vec<ToDoList>, ResolveError> {
    fetch(client, Collection::Lists).await
}

/// First item whose description equals `description`, ignoring case
pub fn select_item(items: Vec<ToDoItem>, description: &str) -> Result<ToDoItem, ResolveError> {
    items
        .into_iter()
        .find(|item| item.matches(description))
        .ok_or_else(|| ResolveError::NotFound(description.to_string()))
}

/// First list whose name equals `name`, ignoring case. An empty collection
/// is reported as [`ResolveError::Empty`] rather than a miss.
pub fn select_list(lists: Vec<ToDoList>, name: &str) -> Result<ToDoList, ResolveError> {
    if lists.is_empty() {
        return Err(ResolveError::Empty);
    }
    lists
        .into_iter()
        .find(|list| list.matches(name))
        .ok_or_else(|| ResolveError::NotFound(name.to_string()))
}

pub async fn find_item_by_description(
    client: &ApiClient,
    description: &str,
) -> Result<ToDoItem, ResolveError> {
    select_item(fetch_items(client).await?, description)
}

pub async fn find_list_by_name(client: &ApiClient, name: &str) -> Result<ToDoList, ResolveError> {
    select_list(fetch_lists(client).await?, name)
}
