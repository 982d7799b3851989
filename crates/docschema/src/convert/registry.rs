//! Builder registry.
//!
//! Maps field kinds to builder factories. Lookup walks the descriptor kind's
//! ancestor chain, most-derived first, so a kind declared outside this crate
//! converts like its nearest registered ancestor until it gets a builder of
//! its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use docschema_core::{FieldDescriptor, FieldKind, kinds};
use docschema_fields::FieldType;

use crate::convert::ModelConverter;
use crate::convert::builder::{
    FieldBuilder, KindBuilder, Target, TypeResolver, resolve_embedded, resolve_generic_embedded,
    resolve_generic_reference, resolve_list, resolve_map, resolve_reference,
};
use crate::convert::params::Param;
use crate::error::ModelConversionError;
use crate::fields::{ObjectIdField, PointField, SkipField};

/// Creates the builder for one descriptor.
pub type BuilderFactory = Arc<
    dyn for<'a> Fn(&'a FieldDescriptor, &'a ModelConverter) -> Box<dyn FieldBuilder + 'a>
        + Send
        + Sync,
>;

/// Kind name to builder factory.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: RwLock<HashMap<String, BuilderFactory>>,
}

impl BuilderRegistry {
    /// A registry with no builders.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in mapping.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register_defaults();
        registry
    }

    /// The process-wide registry used by default converters.
    pub fn global() -> Arc<BuilderRegistry> {
        static GLOBAL: OnceLock<Arc<BuilderRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(BuilderRegistry::with_defaults())))
    }

    /// Register a builder factory for `kind`, replacing any previous one.
    pub fn register_builder<F>(&self, kind: &FieldKind, factory: F)
    where
        F: for<'a> Fn(&'a FieldDescriptor, &'a ModelConverter) -> Box<dyn FieldBuilder + 'a>
            + Send
            + Sync
            + 'static,
    {
        tracing::info!(kind = kind.name(), "Registering field builder");
        self.builders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind.name().to_string(), Arc::new(factory));
    }

    /// Register `kind` as converting to `field_type`, running the base
    /// extractors followed by `params`.
    pub fn register_field(&self, kind: &FieldKind, field_type: FieldType, params: Vec<Param>) {
        self.register_builder(kind, move |descriptor, converter| {
            let target = Target::Fixed(field_type.clone());
            Box::new(KindBuilder::new(descriptor, converter, target, &params))
        });
    }

    /// Register `kind` with a target type resolved per descriptor.
    pub fn register_resolved(&self, kind: &FieldKind, resolve: TypeResolver, params: Vec<Param>) {
        self.register_builder(kind, move |descriptor, converter| {
            Box::new(KindBuilder::new(
                descriptor,
                converter,
                Target::Resolved(resolve),
                &params,
            ))
        });
    }

    /// Factory for the most-derived registered ancestor of `kind`.
    pub fn factory_for(&self, kind: &FieldKind) -> Option<BuilderFactory> {
        let builders = self.builders.read().unwrap_or_else(PoisonError::into_inner);
        kind.ancestors()
            .find_map(|ancestor| builders.get(ancestor.name()))
            .cloned()
    }

    /// True if `kind` itself (not an ancestor) has a builder.
    pub fn contains(&self, kind: &FieldKind) -> bool {
        self.builders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(kind.name())
    }

    /// Builder bound to `descriptor`.
    pub fn builder_for<'a>(
        &self,
        descriptor: &'a FieldDescriptor,
        converter: &'a ModelConverter,
    ) -> Result<Box<dyn FieldBuilder + 'a>, ModelConversionError> {
        let factory = self.factory_for(descriptor.kind).ok_or_else(|| {
            ModelConversionError::UnknownFieldKind {
                kind: descriptor.kind.name().to_string(),
                field: descriptor.name.clone(),
            }
        })?;
        Ok(factory(descriptor, converter))
    }

    fn register_defaults(&self) {
        let skip = FieldType::Custom(Arc::new(SkipField));

        self.register_field(
            &kinds::STRING,
            FieldType::String,
            vec![Param::Length, Param::Regex],
        );
        self.register_field(&kinds::EMAIL, FieldType::Email, vec![Param::Length]);
        self.register_field(&kinds::URL, FieldType::Url, vec![Param::Length]);
        for kind in [&kinds::INT, &kinds::LONG, &kinds::SEQUENCE, &kinds::BINARY] {
            self.register_field(kind, FieldType::Integer, vec![Param::NumericRange]);
        }
        self.register_field(&kinds::FLOAT, FieldType::Float, vec![Param::NumericRange]);
        self.register_field(
            &kinds::DECIMAL,
            FieldType::Decimal,
            vec![Param::NumericRange, Param::Precision],
        );
        self.register_field(&kinds::BOOLEAN, FieldType::Boolean, vec![]);
        self.register_field(&kinds::DATETIME, FieldType::DateTime, vec![]);
        self.register_field(&kinds::COMPLEX_DATETIME, FieldType::DateTime, vec![]);
        self.register_field(
            &kinds::OBJECT_ID,
            FieldType::Custom(Arc::new(ObjectIdField)),
            vec![],
        );
        self.register_field(&kinds::UUID, FieldType::Uuid, vec![]);
        self.register_field(&kinds::POINT, FieldType::Custom(Arc::new(PointField)), vec![]);
        self.register_field(&kinds::DICT, FieldType::Raw, vec![]);
        self.register_field(&kinds::DYNAMIC, FieldType::Raw, vec![]);
        self.register_resolved(&kinds::LIST, resolve_list, vec![]);
        self.register_resolved(&kinds::MAP, resolve_map, vec![]);
        self.register_resolved(&kinds::REFERENCE, resolve_reference, vec![]);
        self.register_resolved(
            &kinds::GENERIC_REFERENCE,
            resolve_generic_reference,
            vec![],
        );
        self.register_resolved(&kinds::EMBEDDED_DOCUMENT, resolve_embedded, vec![]);
        self.register_resolved(
            &kinds::GENERIC_EMBEDDED_DOCUMENT,
            resolve_generic_embedded,
            vec![],
        );
        self.register_field(&kinds::FILE, skip, vec![]);
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let builders = self.builders.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<&str> = builders.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("BuilderRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
