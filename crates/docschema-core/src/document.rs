//! Document types and dynamic document instances.
//!
//! A [`DocumentType`] is the runtime model: a named, ordered set of field
//! descriptors plus identifier metadata. [`Document`] is an instance of one,
//! storing attribute values by field name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::descriptor::FieldDescriptor;
use crate::kind::kinds;
use crate::reference::register_document;
use crate::value::Value;

/// Name of the identifier field added to top-level documents that do not
/// declare a primary key.
pub const DEFAULT_ID_FIELD: &str = "id";

/// A document model definition.
///
/// # Example
///
/// ```
/// use docschema_core::{DocumentType, FieldDescriptor};
///
/// let student = DocumentType::document("Student")
///     .field("full_name", FieldDescriptor::string().max_length(255))
///     .field("dob", FieldDescriptor::datetime().null(true))
///     .build();
///
/// assert_eq!(student.id_field(), Some("id"));
/// assert!(student.auto_id());
/// assert!(student.field("full_name").is_some());
/// ```
#[derive(Debug)]
pub struct DocumentType {
    name: String,
    fields: Vec<FieldDescriptor>,
    id_field: Option<String>,
    auto_id: bool,
    embedded: bool,
}

impl DocumentType {
    /// Start a top-level (collection-backed) document type.
    pub fn document(name: impl Into<String>) -> DocumentTypeBuilder {
        DocumentTypeBuilder::new(name.into(), false)
    }

    /// Start an embedded document type (no identifier).
    pub fn embedded(name: impl Into<String>) -> DocumentTypeBuilder {
        DocumentTypeBuilder::new(name.into(), true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field descriptor by attribute name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the identifier field, if this type has one.
    pub fn id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    /// True if the identifier is generated by the store rather than declared.
    pub const fn auto_id(&self) -> bool {
        self.auto_id
    }

    pub const fn is_embedded(&self) -> bool {
        self.embedded
    }
}

/// Builder for [`DocumentType`].
#[derive(Debug)]
pub struct DocumentTypeBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    embedded: bool,
}

impl DocumentTypeBuilder {
    fn new(name: String, embedded: bool) -> Self {
        Self {
            name,
            fields: Vec::new(),
            embedded,
        }
    }

    /// Add a field. A later field with the same name replaces the earlier one.
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        let descriptor = descriptor.named(name);
        self.fields.retain(|f| f.name != descriptor.name);
        self.fields.push(descriptor);
        self
    }

    /// Finish the type.
    pub fn build(self) -> Arc<DocumentType> {
        let mut fields = self.fields;
        let mut id_field = None;
        let mut auto_id = false;

        if !self.embedded {
            if let Some(pk) = fields.iter().find(|f| f.primary_key) {
                id_field = Some(pk.name.clone());
            } else {
                fields.retain(|f| f.name != DEFAULT_ID_FIELD);
                fields.insert(
                    0,
                    FieldDescriptor::new(&kinds::OBJECT_ID).named(DEFAULT_ID_FIELD),
                );
                id_field = Some(DEFAULT_ID_FIELD.to_string());
                auto_id = true;
            }
        }

        Arc::new(DocumentType {
            name: self.name,
            fields,
            id_field,
            auto_id,
            embedded: self.embedded,
        })
    }

    /// Finish the type and add it to the document-type registry.
    pub fn register(self) -> Arc<DocumentType> {
        let doc_type = self.build();
        register_document(Arc::clone(&doc_type));
        doc_type
    }
}

/// An instance of a [`DocumentType`].
#[derive(Debug, Clone)]
pub struct Document {
    doc_type: Arc<DocumentType>,
    values: BTreeMap<String, Value>,
}

impl Document {
    /// Create a document with every field at its initial value.
    pub fn new(doc_type: &Arc<DocumentType>) -> Self {
        let values = doc_type
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.initial_value()))
            .collect();
        Self {
            doc_type: Arc::clone(doc_type),
            values,
        }
    }

    /// Create a document and set the given attributes over the initial values.
    pub fn from_values<K: Into<String>>(
        doc_type: &Arc<DocumentType>,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        let mut doc = Self::new(doc_type);
        for (name, value) in values {
            doc.set(name, value);
        }
        doc
    }

    pub fn doc_type(&self) -> &Arc<DocumentType> {
        &self.doc_type
    }

    /// Attribute value, `None` if never set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// All attributes.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Identifier value; `None` for embedded types or unset identifiers.
    pub fn pk(&self) -> Option<&Value> {
        self.doc_type
            .id_field()
            .and_then(|id| self.values.get(id))
            .filter(|v| !v.is_null())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.doc_type.name() == other.doc_type.name() && self.values == other.values
    }
}
