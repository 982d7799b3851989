//! Schema assembly.
//!
//! A [`ComposedSchema`] is the field set derived from a bound document type,
//! overlaid with explicitly declared fields, patched per field and filtered.
//! It is assembled once by [`ComposedSchemaBuilder::build`] and shared
//! immutably afterwards. [`ModelSchema`] runs dump, load and update with an
//! optional document store for resolving references.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use docschema_core::{Document, DocumentRef, DocumentStore, DocumentType, Value};
use docschema_fields::{
    DumpError, Field, FieldArgs, FieldSet, LoadContext, LoadOptions, ValidationError, dump_fields,
    load_fields,
};
use serde_json::{Map, Value as Json};

use crate::convert::ModelConverter;
use crate::error::SchemaError;

// ============================================================================
// Options
// ============================================================================

/// Options of a composed schema.
#[derive(Debug, Clone)]
pub struct SchemaOpts {
    /// Bound document type.
    pub model: Option<DocumentRef>,
    /// Only these fields, if set.
    pub fields: Option<BTreeSet<String>>,
    /// Never these fields.
    pub exclude: BTreeSet<String>,
    /// Per-field option patches, applied after declared fields are merged.
    pub model_fields_kwargs: BTreeMap<String, FieldArgs>,
    /// Make a generated identifier dump-only.
    pub model_dump_only_pk: bool,
    /// Converter, and with it the builder registry, used to derive fields.
    pub model_converter: ModelConverter,
    /// `load` builds a document of the bound type instead of returning data.
    pub model_build_obj: bool,
    /// Dumped values equal to one of these are left out of the output.
    pub model_skip_values: Vec<Json>,
}

impl Default for SchemaOpts {
    fn default() -> Self {
        Self {
            model: None,
            fields: None,
            exclude: BTreeSet::new(),
            model_fields_kwargs: BTreeMap::new(),
            model_dump_only_pk: false,
            model_converter: ModelConverter::default(),
            model_build_obj: true,
            model_skip_values: default_skip_values(),
        }
    }
}

/// `null`, `[]` and `{}`.
pub fn default_skip_values() -> Vec<Json> {
    vec![Json::Null, Json::Array(Vec::new()), Json::Object(Map::new())]
}

// ============================================================================
// Composed schema
// ============================================================================

/// Result of a load.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// A document of the bound type.
    Document(Document),
    /// Loaded attributes, when no document is built.
    Data(BTreeMap<String, Value>),
}

impl Loaded {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Loaded::Document(doc) => Some(doc),
            Loaded::Data(_) => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Loaded::Document(doc) => Some(doc),
            Loaded::Data(_) => None,
        }
    }

    /// Loaded value of one attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Loaded::Document(doc) => doc.get(name),
            Loaded::Data(data) => data.get(name),
        }
    }
}

/// An assembled schema.
#[derive(Debug)]
pub struct ComposedSchema {
    model: Option<Arc<DocumentType>>,
    fields: FieldSet,
    declared: FieldSet,
    opts: SchemaOpts,
}

impl ComposedSchema {
    pub fn builder() -> ComposedSchemaBuilder {
        ComposedSchemaBuilder::default()
    }

    /// Schema of `model` with default options.
    pub fn for_model(model: impl Into<DocumentRef>) -> Result<Arc<Self>, SchemaError> {
        Self::builder().model(model).build()
    }

    /// The bound document type.
    pub fn model(&self) -> Option<&Arc<DocumentType>> {
        self.model.as_ref()
    }

    /// Effective fields.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Explicitly declared fields, including those of extended schemas.
    pub fn declared_fields(&self) -> &FieldSet {
        &self.declared
    }

    pub fn opts(&self) -> &SchemaOpts {
        &self.opts
    }

    /// Serialize `doc`, leaving out skip values.
    pub fn dump(&self, doc: &Document) -> Result<Map<String, Json>, DumpError> {
        let mut out = dump_fields(&self.fields, doc)?;
        out.retain(|_, value| !self.opts.model_skip_values.contains(value));
        Ok(out)
    }

    /// Deserialize and validate `data` into loaded attributes.
    pub fn load_data(
        &self,
        data: &Json,
        ctx: &LoadContext<'_>,
        options: LoadOptions,
    ) -> Result<BTreeMap<String, Value>, ValidationError> {
        load_fields(&self.fields, data, ctx, options)
    }

    /// Deserialize and validate `data`, building a document when configured.
    pub fn load_with(
        &self,
        data: &Json,
        ctx: &LoadContext<'_>,
        options: LoadOptions,
    ) -> Result<Loaded, ValidationError> {
        let loaded = self.load_data(data, ctx, options)?;
        match &self.model {
            Some(model) if self.opts.model_build_obj => {
                Ok(Loaded::Document(Document::from_values(model, loaded)))
            }
            _ => Ok(Loaded::Data(loaded)),
        }
    }
}

/// Collects options and declared fields for a [`ComposedSchema`].
#[derive(Debug, Default)]
pub struct ComposedSchemaBuilder {
    opts: SchemaOpts,
    declared: Vec<(String, Field)>,
    parents: Vec<Arc<ComposedSchema>>,
}

impl ComposedSchemaBuilder {
    /// Replace all options.
    pub fn opts(mut self, opts: SchemaOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Bind a document type.
    pub fn model(mut self, model: impl Into<DocumentRef>) -> Self {
        self.opts.model = Some(model.into());
        self
    }

    /// Declare a field explicitly. Declared fields win over derived ones.
    pub fn declare(mut self, name: impl Into<String>, field: Field) -> Self {
        self.declared.push((name.into(), field));
        self
    }

    /// Inherit the declared fields of `parent`. Later parents and this
    /// schema's own declarations win.
    pub fn extends(mut self, parent: Arc<ComposedSchema>) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn fields<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.opts.fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.opts.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    /// Patch the options of one field.
    pub fn field_kwargs(mut self, name: impl Into<String>, args: FieldArgs) -> Self {
        self.opts.model_fields_kwargs.insert(name.into(), args);
        self
    }

    pub fn dump_only_pk(mut self, value: bool) -> Self {
        self.opts.model_dump_only_pk = value;
        self
    }

    pub fn build_obj(mut self, value: bool) -> Self {
        self.opts.model_build_obj = value;
        self
    }

    pub fn skip_values(mut self, values: impl IntoIterator<Item = Json>) -> Self {
        self.opts.model_skip_values = values.into_iter().collect();
        self
    }

    pub fn converter(mut self, converter: ModelConverter) -> Self {
        self.opts.model_converter = converter;
        self
    }

    /// Assemble the schema.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(model = ?self.opts.model.as_ref().map(DocumentRef::name))
    )]
    pub fn build(self) -> Result<Arc<ComposedSchema>, SchemaError> {
        let opts = self.opts;

        let model = opts
            .model
            .as_ref()
            .map(|target| {
                target.resolve().map_err(|source| SchemaError::InvalidModel {
                    model: target.name().to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut fields = match &model {
            Some(model) => opts.model_converter.fields_for_model(
                model,
                opts.fields.as_ref(),
                &BTreeMap::new(),
            )?,
            None => FieldSet::new(),
        };

        let mut declared = FieldSet::new();
        for parent in &self.parents {
            declared.extend(
                parent
                    .declared
                    .iter()
                    .map(|(name, field)| (name.clone(), field.clone())),
            );
        }
        declared.extend(self.declared);
        fields.extend(
            declared
                .iter()
                .map(|(name, field)| (name.clone(), field.clone())),
        );

        for (name, args) in &opts.model_fields_kwargs {
            if let Some(field) = fields.get_mut(name) {
                field.apply(args.clone());
            }
        }

        if opts.model_dump_only_pk {
            if let Some(id_field) = model
                .as_ref()
                .filter(|model| model.auto_id())
                .and_then(|model| model.id_field())
            {
                if let Some(field) = fields.get_mut(id_field) {
                    field.dump_only = true;
                }
            }
        }

        if let Some(only) = &opts.fields {
            fields.retain(|name, _| only.contains(name));
        }
        fields.retain(|name, _| !opts.exclude.contains(name));

        tracing::debug!(fields = fields.len(), declared = declared.len(), "Assembled schema");
        Ok(Arc::new(ComposedSchema {
            model,
            fields,
            declared,
            opts,
        }))
    }
}

// ============================================================================
// Schema instance
// ============================================================================

/// A composed schema plus the store reference fields resolve through.
#[derive(Clone)]
pub struct ModelSchema {
    schema: Arc<ComposedSchema>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl ModelSchema {
    pub fn new(schema: Arc<ComposedSchema>) -> Self {
        Self {
            schema,
            store: None,
        }
    }

    /// Resolve references through `store`.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn schema(&self) -> &Arc<ComposedSchema> {
        &self.schema
    }

    fn context(&self) -> LoadContext<'_> {
        match &self.store {
            Some(store) => LoadContext::with_store(store.as_ref()),
            None => LoadContext::new(),
        }
    }

    /// Serialize `doc`.
    pub fn dump(&self, doc: &Document) -> Result<Map<String, Json>, DumpError> {
        self.schema.dump(doc)
    }

    /// Deserialize and validate `data`.
    pub fn load(&self, data: &Json) -> Result<Loaded, ValidationError> {
        self.schema
            .load_with(data, &self.context(), LoadOptions::default())
    }

    /// Apply a partial payload to an existing document.
    ///
    /// Required checks are suspended for this call only. Only keys present in
    /// `data` are written; on failure `doc` is left untouched.
    pub fn update(&self, doc: &mut Document, data: &Json) -> Result<(), ValidationError> {
        let loaded = self
            .schema
            .load_data(data, &self.context(), LoadOptions::partial())?;
        let Json::Object(input) = data else {
            return Ok(());
        };
        for (name, value) in loaded {
            if input.contains_key(&name) {
                doc.set(name, value);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSchema")
            .field("schema", &self.schema)
            .field("store", &self.store.as_ref().map(|_| ".."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docschema_core::FieldDescriptor;
    use docschema_fields::FieldType;
    use serde_json::json;

    fn doc_type() -> Arc<DocumentType> {
        DocumentType::document("SchemaUnitDoc")
            .field("name", FieldDescriptor::string().required(true))
            .field("tags", FieldDescriptor::list(FieldDescriptor::string()))
            .build()
    }

    #[test]
    fn test_declared_field_wins() {
        let schema = ComposedSchema::builder()
            .model(doc_type())
            .declare("name", Field::new(FieldType::Email))
            .build()
            .unwrap();
        assert_eq!(schema.field("name").unwrap().type_name(), "Email");
        assert_eq!(schema.field("tags").unwrap().type_name(), "List");
        assert_eq!(schema.declared_fields().len(), 1);
    }

    #[test]
    fn test_schema_without_model() {
        let schema = ComposedSchema::builder()
            .declare("title", Field::new(FieldType::String))
            .build()
            .unwrap();
        assert!(schema.model().is_none());
        let loaded = schema
            .load_with(&json!({"title": "x"}), &LoadContext::new(), LoadOptions::default())
            .unwrap();
        assert!(matches!(loaded, Loaded::Data(_)));
        assert_eq!(loaded.get("title"), Some(&Value::from("x")));
    }

    #[test]
    fn test_unresolvable_model_is_rejected() {
        let err = ComposedSchema::for_model("SchemaUnitNeverRegistered").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidModel { .. }));
    }

    #[test]
    fn test_update_leaves_document_untouched_on_failure() {
        let schema = ModelSchema::new(ComposedSchema::for_model(doc_type()).unwrap());
        let mut doc = Document::new(&doc_type()).with("name", "before");
        let err = schema.update(&mut doc, &json!({"name": 5})).unwrap_err();
        assert!(err.field("name").is_some());
        assert_eq!(doc.get("name"), Some(&Value::from("before")));
    }

    #[test]
    fn test_default_skip_values() {
        assert_eq!(default_skip_values(), vec![json!(null), json!([]), json!({})]);
        assert!(SchemaOpts::default().model_build_obj);
    }
}
