//! Document model types for docschema.
//!
//! `docschema-core` is the **persistence-side contract** the rest of the
//! workspace converts from. It describes models, not storage.
//!
//! # Role In The Architecture
//!
//! - **Kinds**: [`FieldKind`] statics with an explicit parent chain, walked by
//!   the converter's most-specific-ancestor lookup.
//! - **Descriptors**: [`FieldDescriptor`] carries one field's kind and
//!   constraints (length, range, choices, nullability, defaults, targets).
//! - **Documents**: [`DocumentType`] is a named set of descriptors with
//!   identifier metadata; [`Document`] is a dynamic instance holding [`Value`]s.
//! - **Resolution**: [`DocumentRef`] names a target type directly or by name,
//!   resolved through the process-wide document-type registry.
//! - **Lookup**: [`DocumentStore`] finds documents by identifier for reference
//!   fields; [`InMemoryStore`] is a map-backed implementation.
//!
//! # Who Uses This Crate
//!
//! - `docschema-fields` serializes and validates [`Value`]s and documents.
//! - `docschema` converts descriptors into fields and assembles schemas.

pub mod descriptor;
pub mod document;
pub mod error;
pub mod kind;
pub mod oid;
pub mod reference;
pub mod store;
pub mod value;

pub use descriptor::{Choices, DefaultValue, FieldDescriptor};
pub use document::{DEFAULT_ID_FIELD, Document, DocumentType, DocumentTypeBuilder};
pub use error::{Error, Result};
pub use kind::{FieldKind, kinds};
pub use oid::ObjectId;
pub use reference::{DocumentRef, is_registered, lookup_document, register_document};
pub use store::{DocumentStore, InMemoryStore};
pub use value::Value;
