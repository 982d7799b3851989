//! Validation and dump errors.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use serde_json::Value as Json;

/// Error messages for one field: a flat list, or per-key messages for nested
/// documents, lists and maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorMessages {
    List(Vec<String>),
    Nested(BTreeMap<String, ErrorMessages>),
}

impl ErrorMessages {
    /// A single message.
    pub fn message(msg: impl Into<String>) -> Self {
        ErrorMessages::List(vec![msg.into()])
    }

    /// Flat messages, empty for nested errors.
    pub fn as_list(&self) -> &[String] {
        match self {
            ErrorMessages::List(messages) => messages,
            ErrorMessages::Nested(_) => &[],
        }
    }

    /// Messages for a nested key.
    pub fn get(&self, key: &str) -> Option<&ErrorMessages> {
        match self {
            ErrorMessages::Nested(map) => map.get(key),
            ErrorMessages::List(_) => None,
        }
    }

    /// True if any message, at any depth, contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            ErrorMessages::List(messages) => messages.iter().any(|m| m.contains(needle)),
            ErrorMessages::Nested(map) => map.values().any(|m| m.contains(needle)),
        }
    }
}

impl From<String> for ErrorMessages {
    fn from(msg: String) -> Self {
        ErrorMessages::message(msg)
    }
}

impl From<&str> for ErrorMessages {
    fn from(msg: &str) -> Self {
        ErrorMessages::message(msg)
    }
}

impl fmt::Display for ErrorMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessages::List(messages) => f.write_str(&messages.join(" ")),
            ErrorMessages::Nested(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join("; "))
            }
        }
    }
}

/// Aggregate failure of one `load` call: every failing field with its
/// messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    messages: BTreeMap<String, ErrorMessages>,
}

/// Key used for errors that concern the whole payload.
pub const SCHEMA_ERROR_KEY: &str = "_schema";

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error concerning the whole payload rather than a field.
    pub fn schema(msg: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(SCHEMA_ERROR_KEY, ErrorMessages::message(msg));
        err
    }

    /// Record messages for `field`, merging flat lists.
    pub fn add(&mut self, field: impl Into<String>, messages: ErrorMessages) {
        let field = field.into();
        match (self.messages.get_mut(&field), messages) {
            (Some(ErrorMessages::List(existing)), ErrorMessages::List(more)) => {
                existing.extend(more);
            }
            (_, messages) => {
                self.messages.insert(field, messages);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages by field name.
    pub fn messages(&self) -> &BTreeMap<String, ErrorMessages> {
        &self.messages
    }

    /// Messages of one field.
    pub fn field(&self, name: &str) -> Option<&ErrorMessages> {
        self.messages.get(name)
    }

    /// JSON object of field name to messages.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(&self.messages).unwrap_or(Json::Null)
    }

    pub fn into_messages(self) -> BTreeMap<String, ErrorMessages> {
        self.messages
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, (field, messages)) in self.messages.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, field, messages)?;
        }
        Ok(())
    }
}

impl StdError for ValidationError {}

/// Failure while serializing a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpError {
    pub field: String,
    pub message: String,
}

impl DumpError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot serialize `{}`: {}", self.field, self.message)
    }
}

impl StdError for DumpError {}
