//! todoitem core - shared functionality for the to-do item tools
//!
//! Talks to the to-do REST API and turns human-readable list names and item
//! descriptions into the backend records they refer to.

pub mod client;
pub mod config;
pub mod envelope;
pub mod model;
pub mod resolve;

pub use client::{ApiClient, ApiError};
pub use config::Config;
pub use envelope::{Collection, Envelope, EnvelopeError};
pub use model::{NewItem, ToDoItem, ToDoList, UpdateItem};
pub use resolve::{find_item_by_description, find_list_by_name, ResolveError};
