//! Conversion and schema configuration errors.

use std::error::Error as StdError;
use std::fmt;

/// Failure while turning field descriptors into serialization fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelConversionError {
    /// No builder is registered for the kind or any of its ancestors.
    UnknownFieldKind { kind: String, field: String },
    /// The model has no field with this name.
    UnknownProperty { model: String, property: String },
    /// A reference or embedded-document descriptor without a target type.
    MissingTarget { kind: String, field: String },
}

impl fmt::Display for ModelConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelConversionError::UnknownFieldKind { kind, field } => write!(
                f,
                "no field builder registered for `{}` (field `{}`)",
                kind, field
            ),
            ModelConversionError::UnknownProperty { model, property } => {
                write!(f, "`{}` has no field `{}`", model, property)
            }
            ModelConversionError::MissingTarget { kind, field } => {
                write!(f, "{} `{}` has no target document type", kind, field)
            }
        }
    }
}

impl StdError for ModelConversionError {}

/// Failure while assembling a schema.
#[derive(Debug)]
pub enum SchemaError {
    /// The bound model is not a known document type.
    InvalidModel {
        model: String,
        source: docschema_core::Error,
    },
    /// A model field could not be converted.
    Conversion(ModelConversionError),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidModel { model, source } => {
                write!(f, "`{}` is not a document type: {}", model, source)
            }
            SchemaError::Conversion(err) => write!(f, "model conversion failed: {}", err),
        }
    }
}

impl StdError for SchemaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SchemaError::InvalidModel { source, .. } => Some(source),
            SchemaError::Conversion(err) => Some(err),
        }
    }
}

impl From<ModelConversionError> for SchemaError {
    fn from(err: ModelConversionError) -> Self {
        SchemaError::Conversion(err)
    }
}
