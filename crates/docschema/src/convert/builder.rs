//! Field builders.
//!
//! A [`FieldBuilder`] binds one descriptor, resolves the serialization field
//! type for it and builds the field from the merged extractor output.
//! Composite kinds resolve their inner field or target schema through the
//! converter that created the builder.

use std::sync::Arc;

use docschema_core::FieldDescriptor;
use docschema_fields::{Field, FieldArgs, FieldType};

use crate::convert::ModelConverter;
use crate::convert::params::{BASE_PARAMS, Param, extract_all};
use crate::error::ModelConversionError;
use crate::fields::{
    GenericEmbeddedField, GenericReferenceField, LazySchema, MapField, NestedField,
    ReferenceField,
};

/// Turns one bound descriptor into a serialization field.
pub trait FieldBuilder {
    /// The bound descriptor.
    fn descriptor(&self) -> &FieldDescriptor;

    /// Extractors run by [`build`](Self::build), in order.
    fn params(&self) -> &[Param];

    /// Resolved target field type.
    fn field_type(&self) -> Result<FieldType, ModelConversionError>;

    /// Merge extractor output with `overrides` (overrides win) and build the
    /// field.
    fn build(&self, overrides: FieldArgs) -> Result<Field, ModelConversionError> {
        let mut args = extract_all(self.params(), self.descriptor());
        args.override_with(overrides);
        Ok(Field::with_args(self.field_type()?, args))
    }
}

/// Resolves the field type of a composite kind.
pub type TypeResolver =
    fn(&FieldDescriptor, &ModelConverter) -> Result<FieldType, ModelConversionError>;

/// Target field type of a [`KindBuilder`].
#[derive(Clone)]
pub enum Target {
    Fixed(FieldType),
    Resolved(TypeResolver),
}

/// The builder used for every built-in kind: base extractors, then the
/// kind-specific ones, then a fixed or resolved target type.
pub struct KindBuilder<'a> {
    descriptor: &'a FieldDescriptor,
    converter: &'a ModelConverter,
    target: Target,
    params: Vec<Param>,
}

impl<'a> KindBuilder<'a> {
    /// Builder running [`BASE_PARAMS`] followed by `params`.
    pub fn new(
        descriptor: &'a FieldDescriptor,
        converter: &'a ModelConverter,
        target: Target,
        params: &[Param],
    ) -> Self {
        let mut all = BASE_PARAMS.to_vec();
        all.extend_from_slice(params);
        Self {
            descriptor,
            converter,
            target,
            params: all,
        }
    }
}

impl FieldBuilder for KindBuilder<'_> {
    fn descriptor(&self) -> &FieldDescriptor {
        self.descriptor
    }

    fn params(&self) -> &[Param] {
        &self.params
    }

    fn field_type(&self) -> Result<FieldType, ModelConversionError> {
        match &self.target {
            Target::Fixed(field_type) => Ok(field_type.clone()),
            Target::Resolved(resolve) => resolve(self.descriptor, self.converter),
        }
    }
}

fn missing_target(descriptor: &FieldDescriptor) -> ModelConversionError {
    ModelConversionError::MissingTarget {
        kind: descriptor.kind.name().to_string(),
        field: descriptor.name.clone(),
    }
}

/// List of the element built by its registered builder, without overrides.
/// A list without an element descriptor holds raw values.
pub fn resolve_list(
    descriptor: &FieldDescriptor,
    converter: &ModelConverter,
) -> Result<FieldType, ModelConversionError> {
    let inner = match descriptor.element.as_deref() {
        Some(element) => converter
            .registry()
            .builder_for(element, converter)?
            .build(FieldArgs::new())?,
        None => Field::new(FieldType::Raw),
    };
    Ok(FieldType::List(Box::new(inner)))
}

/// Map whose values go through the converted element field.
pub fn resolve_map(
    descriptor: &FieldDescriptor,
    converter: &ModelConverter,
) -> Result<FieldType, ModelConversionError> {
    let inner = match descriptor.element.as_deref() {
        Some(element) => converter.convert_field(element, FieldArgs::new())?,
        None => Field::new(FieldType::Raw),
    };
    Ok(FieldType::Custom(Arc::new(MapField::new(inner))))
}

pub fn resolve_reference(
    descriptor: &FieldDescriptor,
    _converter: &ModelConverter,
) -> Result<FieldType, ModelConversionError> {
    let target = descriptor
        .target
        .clone()
        .ok_or_else(|| missing_target(descriptor))?;
    Ok(FieldType::Custom(Arc::new(ReferenceField::new(target))))
}

pub fn resolve_generic_reference(
    descriptor: &FieldDescriptor,
    _converter: &ModelConverter,
) -> Result<FieldType, ModelConversionError> {
    Ok(FieldType::Custom(Arc::new(GenericReferenceField::new(
        descriptor.allowed_types.clone(),
    ))))
}

/// Nested schema of the target type, assembled on first use.
pub fn resolve_embedded(
    descriptor: &FieldDescriptor,
    converter: &ModelConverter,
) -> Result<FieldType, ModelConversionError> {
    let target = descriptor
        .target
        .clone()
        .ok_or_else(|| missing_target(descriptor))?;
    let schema = LazySchema::new(target, converter.clone());
    Ok(FieldType::Custom(Arc::new(NestedField::new(schema))))
}

pub fn resolve_generic_embedded(
    _descriptor: &FieldDescriptor,
    converter: &ModelConverter,
) -> Result<FieldType, ModelConversionError> {
    Ok(FieldType::Custom(Arc::new(GenericEmbeddedField::new(
        converter.clone(),
    ))))
}
