//! Model conversion: from persistence field descriptors to serialization
//! fields.
//!
//! [`ModelConverter`] walks a document type's descriptors and builds one
//! serialization field per descriptor through a [`BuilderRegistry`]. The free
//! functions in this module use a converter bound to the process-wide
//! registry.

pub mod builder;
pub mod params;
pub mod registry;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use docschema_core::{DocumentType, FieldDescriptor};
use docschema_fields::{Field, FieldArgs, FieldSet, FieldType};

use crate::error::ModelConversionError;

pub use builder::{FieldBuilder, KindBuilder, Target, TypeResolver};
pub use params::{BASE_PARAMS, ExtractFn, Param, extract_all};
pub use registry::{BuilderFactory, BuilderRegistry};

/// Converts descriptors using one builder registry.
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone)]
pub struct ModelConverter {
    registry: Arc<BuilderRegistry>,
}

impl Default for ModelConverter {
    fn default() -> Self {
        Self {
            registry: BuilderRegistry::global(),
        }
    }
}

impl ModelConverter {
    /// Converter over the process-wide registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter over a private registry.
    pub fn with_registry(registry: Arc<BuilderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BuilderRegistry> {
        &self.registry
    }

    /// Convert the fields of `model`.
    ///
    /// `fields` restricts conversion to the named fields. `fields_kwargs`
    /// holds per-field overrides passed to the builders.
    #[tracing::instrument(level = "debug", skip_all, fields(model = model.name()))]
    pub fn fields_for_model(
        &self,
        model: &DocumentType,
        fields: Option<&BTreeSet<String>>,
        fields_kwargs: &BTreeMap<String, FieldArgs>,
    ) -> Result<FieldSet, ModelConversionError> {
        let mut result = FieldSet::new();
        for descriptor in model.fields() {
            if fields.is_some_and(|only| !only.contains(&descriptor.name)) {
                continue;
            }
            let overrides = fields_kwargs
                .get(&descriptor.name)
                .cloned()
                .unwrap_or_default();
            let field = self.convert_field(descriptor, overrides)?;
            tracing::trace!(
                field = %descriptor.name,
                kind = descriptor.kind.name(),
                target = field.type_name(),
                "Converted field"
            );
            result.insert(descriptor.name.clone(), field);
        }
        tracing::debug!(count = result.len(), "Converted model fields");
        Ok(result)
    }

    /// Build the field for one descriptor.
    pub fn convert_field(
        &self,
        descriptor: &FieldDescriptor,
        overrides: FieldArgs,
    ) -> Result<Field, ModelConversionError> {
        self.registry
            .builder_for(descriptor, self)?
            .build(overrides)
    }

    /// Resolve the field type for one descriptor without building a field.
    pub fn convert_field_type(
        &self,
        descriptor: &FieldDescriptor,
    ) -> Result<FieldType, ModelConversionError> {
        self.registry.builder_for(descriptor, self)?.field_type()
    }

    /// Build the field for the model field named `property`.
    pub fn field_for(
        &self,
        model: &DocumentType,
        property: &str,
        overrides: FieldArgs,
    ) -> Result<Field, ModelConversionError> {
        let descriptor = model.field(property).ok_or_else(|| {
            ModelConversionError::UnknownProperty {
                model: model.name().to_string(),
                property: property.to_string(),
            }
        })?;
        self.convert_field(descriptor, overrides)
    }
}

/// [`ModelConverter::fields_for_model`] with the default converter.
pub fn fields_for_model(
    model: &DocumentType,
    fields: Option<&BTreeSet<String>>,
    fields_kwargs: &BTreeMap<String, FieldArgs>,
) -> Result<FieldSet, ModelConversionError> {
    ModelConverter::new().fields_for_model(model, fields, fields_kwargs)
}

/// [`ModelConverter::convert_field`] with the default converter.
pub fn convert_field(
    descriptor: &FieldDescriptor,
    overrides: FieldArgs,
) -> Result<Field, ModelConversionError> {
    ModelConverter::new().convert_field(descriptor, overrides)
}

/// [`ModelConverter::field_for`] with the default converter.
pub fn field_for(
    model: &DocumentType,
    property: &str,
    overrides: FieldArgs,
) -> Result<Field, ModelConversionError> {
    ModelConverter::new().field_for(model, property, overrides)
}
