//! Serialization fields for docschema.
//!
//! `docschema-fields` is the serialization side of docschema: typed fields,
//! validators, and the dump/load loop that runs a set of fields over a
//! document.
//!
//! # Role In The Architecture
//!
//! - **Fields**: [`Field`] and [`FieldType`] convert one attribute between
//!   [`Value`](docschema_core::Value) and JSON.
//! - **Arguments**: [`FieldArgs`] carries the options used to construct or
//!   patch a field.
//! - **Validators**: [`Validator`] constraints with marshmallow-style messages.
//! - **Extension**: [`FieldHooks`] lets other crates define field types
//!   (references, nested documents, skipped fields).
//! - **Errors**: [`ValidationError`] aggregates per-field messages of one load.
//!
//! # Who Uses This Crate
//!
//! The `docschema` crate builds [`Field`]s from document models and drives
//! [`dump_fields`] / [`load_fields`] from its schemas.

pub mod args;
pub mod decimal;
pub mod error;
pub mod field;
pub mod schema;
pub mod validate;

pub use args::FieldArgs;
pub use error::{DumpError, ErrorMessages, SCHEMA_ERROR_KEY, ValidationError};
pub use field::{Field, FieldHooks, FieldType, LoadContext, NULL_MESSAGE, REQUIRED_MESSAGE};
pub use schema::{FieldSet, LoadOptions, dump_fields, load_fields};
pub use validate::{CheckFn, Validator, matches_pattern};
