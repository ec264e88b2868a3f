//! todoitem MCP Server
//!
//! Exposes to-do item tools to Claude and other AI assistants via the
//! Model Context Protocol (MCP). Items are addressed by their description;
//! the server looks up the matching record on the REST backend and issues
//! the create, complete, update or delete call for it.

pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;

pub use handler::{Operation, ToolHandler};
pub use server::McpServer;
