//! Document lookup by identifier.
//!
//! Reference fields resolve identifiers through a [`DocumentStore`]. Real
//! applications implement it over their database; [`InMemoryStore`] keeps
//! documents in a map and is what the test-suite uses.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::document::{Document, DocumentType};
use crate::error::{Error, Result};
use crate::oid::ObjectId;
use crate::value::Value;

/// Identifier lookup used by reference fields.
pub trait DocumentStore: Send + Sync {
    /// Find the document of `doc_type` whose identifier equals `id`.
    fn find_by_id(&self, doc_type: &DocumentType, id: &Value) -> Result<Option<Document>>;
}

/// Stable map key for an identifier value: variant tag plus content.
fn id_key(id: &Value) -> Option<String> {
    match id {
        Value::Int(i) => Some(format!("i:{}", i)),
        Value::String(s) => Some(format!("s:{}", s)),
        Value::Decimal(s) => Some(format!("d:{}", s)),
        Value::ObjectId(oid) => Some(format!("o:{}", oid)),
        Value::Uuid(uuid) => Some(format!("u:{}", uuid)),
        Value::DateTime(dt) => Some(format!("t:{}", dt.timestamp_nanos_opt().unwrap_or_default())),
        Value::Bool(b) => Some(format!("b:{}", b)),
        _ => None,
    }
}

/// A [`DocumentStore`] backed by a map, keyed by type name and identifier.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document, assigning an identifier first if the type generates
    /// them and none is set. Returns the identifier.
    pub fn save(&self, doc: &mut Document) -> Result<Value> {
        let doc_type = doc.doc_type().clone();
        let Some(id_field) = doc_type.id_field() else {
            return Err(Error::NotStorable(doc_type.name().to_string()));
        };

        let id = match doc.pk() {
            Some(id) => id.clone(),
            None if doc_type.auto_id() => {
                let id = Value::ObjectId(ObjectId::new());
                doc.set(id_field, id.clone());
                id
            }
            None => return Err(Error::MissingIdentifier(doc_type.name().to_string())),
        };

        let key = id_key(&id).ok_or_else(|| Error::InvalidIdentifier {
            document: doc_type.name().to_string(),
            value: id.type_name().to_string(),
        })?;

        tracing::debug!(document = doc_type.name(), id = %key, "Saving document");
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((doc_type.name().to_string(), key), doc.clone());
        Ok(id)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryStore {
    fn find_by_id(&self, doc_type: &DocumentType, id: &Value) -> Result<Option<Document>> {
        let Some(key) = id_key(id) else {
            return Ok(None);
        };
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(doc_type.name().to_string(), key))
            .cloned())
    }
}
