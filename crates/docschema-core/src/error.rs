//! Error types for the document model.

use std::error::Error as StdError;
use std::fmt;

/// Errors raised by document types, identifiers and stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No document type is registered under this name.
    UnknownDocumentType(String),
    /// Text is not a 24-digit hex object id.
    InvalidObjectId(String),
    /// The identifier value cannot be used as a store key.
    InvalidIdentifier { document: String, value: String },
    /// The document declares its own identifier but none is set.
    MissingIdentifier(String),
    /// Embedded documents have no identity and cannot be stored.
    NotStorable(String),
    /// Backend failure reported by a store implementation.
    Store(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownDocumentType(name) => {
                write!(f, "unknown document type `{}`", name)
            }
            Error::InvalidObjectId(value) => write!(f, "invalid ObjectId `{}`", value),
            Error::InvalidIdentifier { document, value } => {
                write!(f, "`{}` cannot use a {} value as identifier", document, value)
            }
            Error::MissingIdentifier(name) => {
                write!(f, "`{}` document has no identifier set", name)
            }
            Error::NotStorable(name) => {
                write!(f, "`{}` is an embedded document type and cannot be stored", name)
            }
            Error::Store(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl StdError for Error {}

/// Result alias for document-model operations.
pub type Result<T> = std::result::Result<T, Error>;
