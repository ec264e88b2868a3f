//! Tool Definitions
//!
//! The four to-do item tools advertised through `tools/list`.

use serde_json::{json, Value};

use crate::protocol::{InputSchema, Tool};

/// Create a tool definition with the given name, description, and schema properties
fn tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let props = properties.as_object().cloned().unwrap_or_default();
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: InputSchema {
            schema_type: "object".to_string(),
            properties: props,
            required: required.into_iter().map(|s| s.to_string()).collect(),
        },
    }
}

fn text_arg(description: &str) -> Value {
    json!({"type": "string", "minLength": 1, "description": description})
}

/// Get all available tools
pub fn all_tools() -> Vec<Tool> {
    vec![
        tool(
            "create_item",
            "Create an item in an existing to-do list, found by name.",
            json!({
                "list": text_arg("Name of the list (case-insensitive)"),
                "description": text_arg("Description of the new item")
            }),
            vec!["list", "description"],
        ),
        tool(
            "complete_item",
            "Mark an item as completed, found by its description.",
            json!({
                "description": text_arg("Current description of the item (case-insensitive)")
            }),
            vec!["description"],
        ),
        tool(
            "update_item",
            "Change the description of an item, found by its current description.",
            json!({
                "current_description": text_arg("Current description of the item (case-insensitive)"),
                "new_description": text_arg("Replacement description")
            }),
            vec!["current_description", "new_description"],
        ),
        tool(
            "delete_item",
            "Delete an item, found by its description.",
            json!({
                "description": text_arg("Description of the item to delete (case-insensitive)")
            }),
            vec!["description"],
        ),
    ]
}
