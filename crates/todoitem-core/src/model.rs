//! Backend records
//!
//! Snapshots of what the REST API returned. They are never written back
//! directly; every change goes through an HTTP call.

use serde::{Deserialize, Deserializer, Serialize};

/// A to-do item as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToDoItem {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub todo_list_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
}

impl ToDoItem {
    pub fn matches(&self, description: &str) -> bool {
        eq_ignore_case(&self.description, description)
    }
}

/// A to-do list as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoList {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl ToDoList {
    pub fn matches(&self, name: &str) -> bool {
        eq_ignore_case(&self.name, name)
    }
}

/// Body of `POST /todoitems`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub todo_list_id: i64,
    pub description: String,
}

/// Body of `PUT /todoitems/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateItem {
    pub description: String,
}

/// Unicode-aware, exact comparison ignoring case
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
