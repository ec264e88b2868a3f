//! Collection envelopes
//!
//! The backend has been seen returning collections as a bare array, wrapped
//! under a well-known key, or wrapped under some other key entirely. Each
//! shape is a variant of [`Envelope`], parsed in one place, so callers never
//! inspect response fields themselves.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Response shapes that cannot carry a collection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("expected a JSON array or object, got {0}")]
    NotACollection(&'static str),

    #[error("response object has no array-valued field")]
    NoSequence,
}

/// A backend collection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Items,
    Lists,
}

impl Collection {
    /// Path below the API base
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Items => "todoitems",
            Collection::Lists => "todolists",
        }
    }

    /// Wrapper keys tried, in order, before falling back to the first array
    pub fn wrapper_keys(&self) -> &'static [&'static str] {
        match self {
            Collection::Items => &["items", "value"],
            Collection::Lists => &["value", "listas", "todolists"],
        }
    }
}

/// A collection response, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `[...]`
    Bare(Vec<Value>),
    /// `{"items": [...]}` and the other known wrapper keys
    Wrapped {
        key: &'static str,
        entries: Vec<Value>,
    },
    /// `{"whatever": [...]}`, the first array-valued field in document order
    FirstSequence { key: String, entries: Vec<Value> },
}

impl Envelope {
    /// Classify a response body read from `collection`
    pub fn parse(body: Value, collection: Collection) -> Result<Self, EnvelopeError> {
        let mut fields = match body {
            Value::Array(entries) => return Ok(Envelope::Bare(entries)),
            Value::Object(fields) => fields,
            other => return Err(EnvelopeError::NotACollection(kind_of(&other))),
        };

        for &key in collection.wrapper_keys() {
            if let Some(Value::Array(entries)) = fields.get_mut(key) {
                return Ok(Envelope::Wrapped {
                    key,
                    entries: std::mem::take(entries),
                });
            }
        }

        fields
            .into_iter()
            .find_map(|(key, value)| match value {
                Value::Array(entries) => Some(Envelope::FirstSequence { key, entries }),
                _ => None,
            })
            .ok_or(EnvelopeError::NoSequence)
    }

    pub fn entries(&self) -> &[Value] {
        match self {
            Envelope::Bare(entries)
            | Envelope::Wrapped { entries, .. }
            | Envelope::FirstSequence { entries, .. } => entries,
        }
    }

    pub fn into_entries(self) -> Vec<Value> {
        match self {
            Envelope::Bare(entries)
            | Envelope::Wrapped { entries, .. }
            | Envelope::FirstSequence { entries, .. } => entries,
        }
    }

    /// Decode every entry as `T`, keeping source order and skipping entries
    /// that are not records of that type.
    pub fn decode<T: DeserializeOwned>(self) -> Vec<T> {
        self.into_entries()
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Skipping collection entry {}: {}", index, e);
                    None
                }
            })
            .collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ToDoItem, ToDoList};
    use serde_json::json;

    fn sample_items() -> Value {
        json!([
            {"id": 1, "description": "Buy milk", "todoListId": 1, "isCompleted": false},
            {"id": 2, "description": "Pay rent", "todoListId": 1, "isCompleted": true}
        ])
    }

    #[test]
    fn test_bare_array() {
        let envelope = Envelope::parse(sample_items(), Collection::Items).unwrap();
        assert!(matches!(envelope, Envelope::Bare(_)));
        assert_eq!(envelope.entries().len(), 2);
    }

    #[test]
    fn test_all_shapes_yield_same_items() {
        let bodies = [
            sample_items(),
            json!({"items": sample_items()}),
            json!({"value": sample_items(), "count": 2}),
            json!({"count": 2, "data": sample_items()}),
        ];

        let expected: Vec<ToDoItem> = serde_json::from_value(sample_items()).unwrap();
        for body in bodies {
            let items: Vec<ToDoItem> = Envelope::parse(body, Collection::Items)
                .unwrap()
                .decode();
            assert_eq!(items, expected);
        }
    }

    #[test]
    fn test_named_key_preferred_over_earlier_array() {
        let body = json!({"tags": ["a"], "value": sample_items()});
        let envelope = Envelope::parse(body, Collection::Items).unwrap();
        assert!(matches!(envelope, Envelope::Wrapped { key: "value", .. }));
    }

    #[test]
    fn test_items_key_wins_over_value() {
        let body = json!({"value": [], "items": sample_items()});
        let envelope = Envelope::parse(body, Collection::Items).unwrap();
        assert!(matches!(envelope, Envelope::Wrapped { key: "items", .. }));
        assert_eq!(envelope.entries().len(), 2);
    }

    #[test]
    fn test_non_array_wrapper_key_is_ignored() {
        let body = json!({"items": "none", "results": sample_items()});
        match Envelope::parse(body, Collection::Items).unwrap() {
            Envelope::FirstSequence { key, entries } => {
                assert_eq!(key, "results");
                assert_eq!(entries.len(), 2);
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_first_sequence_follows_document_order() {
        let body: Value =
            serde_json::from_str(r#"{"zeta": [{"id": 9, "name": "Z"}], "alpha": []}"#).unwrap();
        match Envelope::parse(body, Collection::Lists).unwrap() {
            Envelope::FirstSequence { key, .. } => assert_eq!(key, "zeta"),
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_list_aliases() {
        for key in ["value", "listas", "todolists"] {
            let body = json!({ key: [{"id": 1, "name": "Home"}] });
            let lists: Vec<ToDoList> = Envelope::parse(body, Collection::Lists).unwrap().decode();
            assert_eq!(lists.len(), 1);
            assert_eq!(lists[0].name, "Home");
        }
    }

    #[test]
    fn test_object_without_array_is_error() {
        let err = Envelope::parse(json!({"count": 0}), Collection::Items).unwrap_err();
        assert_eq!(err, EnvelopeError::NoSequence);
    }

    #[test]
    fn test_scalar_is_error() {
        assert_eq!(
            Envelope::parse(Value::Null, Collection::Items).unwrap_err(),
            EnvelopeError::NotACollection("null")
        );
        assert_eq!(
            Envelope::parse(json!("oops"), Collection::Lists).unwrap_err(),
            EnvelopeError::NotACollection("a string")
        );
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let body = json!([{"description": "no id"}, 42, {"id": 7, "description": "ok"}]);
        let items: Vec<ToDoItem> = Envelope::parse(body, Collection::Items).unwrap().decode();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 7);
    }
}
