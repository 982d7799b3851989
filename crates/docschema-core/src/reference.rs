//! Document-type references and the process-wide document-type registry.
//!
//! Reference and embedded-document fields point at another document type.
//! The target may be given directly or by name; names are resolved on demand
//! through the registry, which lets types refer to themselves or to types
//! declared later.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::document::DocumentType;
use crate::error::{Error, Result};

/// Target of a reference or embedded-document field.
#[derive(Debug, Clone)]
pub enum DocumentRef {
    /// A concrete document type.
    Type(Arc<DocumentType>),
    /// A type name resolved through the registry when first needed.
    Named(String),
}

impl DocumentRef {
    /// Name of the target type.
    pub fn name(&self) -> &str {
        match self {
            DocumentRef::Type(doc_type) => doc_type.name(),
            DocumentRef::Named(name) => name,
        }
    }

    /// Resolve to a document type.
    pub fn resolve(&self) -> Result<Arc<DocumentType>> {
        match self {
            DocumentRef::Type(doc_type) => Ok(Arc::clone(doc_type)),
            DocumentRef::Named(name) => lookup_document(name),
        }
    }
}

impl From<Arc<DocumentType>> for DocumentRef {
    fn from(doc_type: Arc<DocumentType>) -> Self {
        DocumentRef::Type(doc_type)
    }
}

impl From<&Arc<DocumentType>> for DocumentRef {
    fn from(doc_type: &Arc<DocumentType>) -> Self {
        DocumentRef::Type(Arc::clone(doc_type))
    }
}

impl From<&str> for DocumentRef {
    fn from(name: &str) -> Self {
        DocumentRef::Named(name.to_string())
    }
}

impl From<String> for DocumentRef {
    fn from(name: String) -> Self {
        DocumentRef::Named(name)
    }
}

fn registry() -> &'static RwLock<HashMap<String, Arc<DocumentType>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<DocumentType>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a document type under its name, replacing any previous entry.
pub fn register_document(doc_type: Arc<DocumentType>) {
    tracing::info!(document = doc_type.name(), "Registering document type");
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(doc_type.name().to_string(), doc_type);
}

/// Look up a registered document type.
pub fn lookup_document(name: &str) -> Result<Arc<DocumentType>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownDocumentType(name.to_string()))
}

/// True if `name` is a registered document type.
pub fn is_registered(name: &str) -> bool {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(name)
}
