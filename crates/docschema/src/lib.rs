//! Derive serialization schemas from document models.
//!
//! `docschema` reads the field declarations of a document type and builds the
//! matching serialization fields: validators from length, range, pattern and
//! choice constraints, nullability, required-ness, nested schemas for
//! embedded documents and lookups for references. Declared once on the
//! model, the shape and its constraints do not have to be repeated on the
//! wire side.
//!
//! # Role In The Architecture
//!
//! - **Parameter extractors** ([`Param`]): one descriptor attribute to field
//!   arguments.
//! - **Field builders** ([`FieldBuilder`]): one descriptor to one field.
//! - **Builder registry** ([`BuilderRegistry`]): field kind to builder, with
//!   ancestor-chain lookup and late registration.
//! - **Model converter** ([`ModelConverter`]): a whole model to a field set.
//! - **Schema assembly** ([`ComposedSchema`]): derived fields merged with
//!   declared ones, patched, filtered and frozen.
//!
//! The persistence model lives in `docschema-core`; field types, validators
//! and the dump/load loop live in `docschema-fields`.
//!
//! # Example
//!
//! ```
//! use docschema::prelude::*;
//! use serde_json::json;
//!
//! let student = DocumentType::document("DocExampleStudent")
//!     .field("full_name", FieldDescriptor::string().max_length(255).required(true))
//!     .field("age", FieldDescriptor::int().min_value(10.0).max_value(99.0))
//!     .build();
//!
//! let schema = ModelSchema::new(ComposedSchema::for_model(&student).unwrap());
//!
//! let loaded = schema.load(&json!({"full_name": "John Doe", "age": 55})).unwrap();
//! let doc = loaded.into_document().unwrap();
//! assert_eq!(doc.get("age"), Some(&Value::Int(55)));
//!
//! let err = schema.load(&json!({"full_name": "John Doe", "age": 100})).unwrap_err();
//! assert!(err.field("age").is_some());
//! ```

pub mod convert;
pub mod error;
pub mod fields;
pub mod schema;

pub use convert::{
    BuilderFactory, BuilderRegistry, FieldBuilder, KindBuilder, ModelConverter, Param, Target,
    convert_field, field_for, fields_for_model,
};
pub use error::{ModelConversionError, SchemaError};
pub use schema::{ComposedSchema, ComposedSchemaBuilder, Loaded, ModelSchema, SchemaOpts};

/// Common imports.
pub mod prelude {
    pub use crate::convert::{BuilderRegistry, FieldBuilder, ModelConverter, Param};
    pub use crate::error::{ModelConversionError, SchemaError};
    pub use crate::schema::{ComposedSchema, Loaded, ModelSchema, SchemaOpts};
    pub use docschema_core::{
        Document, DocumentRef, DocumentStore, DocumentType, FieldDescriptor, FieldKind,
        InMemoryStore, ObjectId, Value, kinds,
    };
    pub use docschema_fields::{
        ErrorMessages, Field, FieldArgs, FieldSet, FieldType, ValidationError, Validator,
    };
}
