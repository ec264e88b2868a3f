//! Tool Handler
//!
//! Validates tool arguments, resolves lists and items by name, and issues the
//! one backend call each tool maps to. Every outcome, including backend and
//! lookup failures, comes back as a single text result.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use todoitem_core::{
    find_item_by_description, find_list_by_name, ApiClient, NewItem, ResolveError, ToDoItem,
    UpdateItem,
};

use crate::protocol::ToolResult;

/// Argument problems caught before any backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument: {0}")]
    Missing(&'static str),

    #[error("Argument '{0}' must be a non-empty string")]
    Invalid(&'static str),
}

/// A validated tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateItem { list: String, description: String },
    CompleteItem { description: String },
    UpdateItem { current_description: String, new_description: String },
    DeleteItem { description: String },
}

/// Required string argument under `key`, or its older Spanish `alias`
fn required_str(
    args: &Map<String, Value>,
    key: &'static str,
    alias: &str,
) -> Result<String, ArgumentError> {
    match args.get(key).or_else(|| args.get(alias)) {
        None | Some(Value::Null) => Err(ArgumentError::Missing(key)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(ArgumentError::Invalid(key)),
    }
}

impl Operation {
    /// Validate a `tools/call` request. The original Spanish tool names are
    /// accepted alongside the English ones.
    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, ArgumentError> {
        match name {
            "create_item" | "crear_item" => Ok(Operation::CreateItem {
                list: required_str(args, "list", "lista")?,
                description: required_str(args, "description", "descripcion")?,
            }),
            "complete_item" | "completar_item" => Ok(Operation::CompleteItem {
                description: required_str(args, "description", "descripcion")?,
            }),
            "update_item" | "actualizar_item" => Ok(Operation::UpdateItem {
                current_description: required_str(args, "current_description", "descripcionActual")?,
                new_description: required_str(args, "new_description", "nuevaDescripcion")?,
            }),
            "delete_item" | "eliminar_item" => Ok(Operation::DeleteItem {
                description: required_str(args, "description", "descripcion")?,
            }),
            _ => Err(ArgumentError::UnknownTool(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateItem { .. } => "create_item",
            Operation::CompleteItem { .. } => "complete_item",
            Operation::UpdateItem { .. } => "update_item",
            Operation::DeleteItem { .. } => "delete_item",
        }
    }
}

/// `description` from a backend item body, or `fallback`
fn returned_description(body: Option<&Value>, fallback: &str) -> String {
    body.and_then(|b| b.get("description"))
        .and_then(|d| d.as_str())
        .unwrap_or(fallback)
        .to_string()
}

fn item_not_found(description: &str) -> ToolResult {
    ToolResult::error(format!("Item with description \"{}\" not found.", description))
}

/// Runs tool calls against one backend
pub struct ToolHandler {
    client: ApiClient,
}

impl ToolHandler {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Handle a tool call
    pub async fn handle_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult {
        match Operation::parse(name, &arguments) {
            Ok(operation) => self.dispatch(operation).await,
            Err(e) => {
                warn!("Rejected call to {}: {}", name, e);
                ToolResult::error(e.to_string())
            }
        }
    }

    pub async fn dispatch(&self, operation: Operation) -> ToolResult {
        info!("Running {}", operation.name());
        match operation {
            Operation::CreateItem { list, description } => self.create_item(&list, &description).await,
            Operation::CompleteItem { description } => self.complete_item(&description).await,
            Operation::UpdateItem {
                current_description,
                new_description,
            } => self.update_item(&current_description, &new_description).await,
            Operation::DeleteItem { description } => self.delete_item(&description).await,
        }
    }

    /// Look up an item, rendering any failure as "not found"
    async fn resolve_item(&self, description: &str) -> Result<ToDoItem, ToolResult> {
        find_item_by_description(&self.client, description)
            .await
            .map_err(|e| {
                match &e {
                    ResolveError::NotFound(_) => debug!("No item matches {:?}", description),
                    other => warn!("Item lookup for {:?} failed: {}", description, other),
                }
                item_not_found(description)
            })
    }

    async fn create_item(&self, list_name: &str, description: &str) -> ToolResult {
        let list = match find_list_by_name(&self.client, list_name).await {
            Ok(list) => list,
            Err(ResolveError::Transport(e)) => {
                warn!("Fetching lists failed: {}", e);
                return ToolResult::error("Failed to fetch lists from the API.");
            }
            Err(e @ (ResolveError::InvalidShape(_) | ResolveError::Empty)) => {
                warn!("Unusable list collection: {}", e);
                return ToolResult::error("The API response does not contain valid lists.");
            }
            Err(ResolveError::NotFound(_)) => {
                return ToolResult::error(format!("List '{}' not found.", list_name));
            }
        };

        let new_item = NewItem {
            todo_list_id: list.id,
            description: description.to_string(),
        };

        match self.client.create_item(&new_item).await {
            Ok(body) => ToolResult::success(format!(
                "Item created: \"{}\" in list \"{}\".",
                returned_description(body.as_ref(), description),
                list.name
            )),
            Err(e) => ToolResult::error(format!("Failed to create item: {}", e.detail())),
        }
    }

    async fn complete_item(&self, description: &str) -> ToolResult {
        let item = match self.resolve_item(description).await {
            Ok(item) => item,
            Err(not_found) => return not_found,
        };

        match self.client.complete_item(item.id).await {
            Ok(body) => ToolResult::success(format!(
                "Item \"{}\" marked as completed.",
                returned_description(body.as_ref(), &item.description)
            )),
            Err(e) => ToolResult::error(format!("Failed to complete item: {}", e.detail())),
        }
    }

    async fn update_item(&self, current_description: &str, new_description: &str) -> ToolResult {
        let item = match self.resolve_item(current_description).await {
            Ok(item) => item,
            Err(not_found) => return not_found,
        };

        let update = UpdateItem {
            description: new_description.to_string(),
        };

        match self.client.update_item(item.id, &update).await {
            Ok(body) => ToolResult::success(format!(
                "Item updated: \"{}\".",
                returned_description(body.as_ref(), new_description)
            )),
            Err(e) => ToolResult::error(format!("Failed to update item: {}", e.detail())),
        }
    }

    async fn delete_item(&self, description: &str) -> ToolResult {
        let item = match self.resolve_item(description).await {
            Ok(item) => item,
            Err(not_found) => return not_found,
        };

        // The backend forgets the item, so name it from the lookup
        match self.client.delete_item(item.id).await {
            Ok(()) => ToolResult::success(format!("Item \"{}\" deleted successfully.", item.description)),
            Err(e) => ToolResult::error(format!("Failed to delete item: {}", e.detail())),
        }
    }
}
