//! Serialization fields for persistence-specific kinds.
//!
//! These plug into `docschema_fields` through [`FieldHooks`]: identifiers,
//! geo points, references resolved through the load context's store,
//! embedded documents serialized through nested schemas, string-keyed maps,
//! and fields that are always skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use docschema_core::{
    Document, DocumentRef, DocumentType, ObjectId, Value, kinds, lookup_document,
};
use docschema_fields::{ErrorMessages, Field, FieldHooks, LoadContext, LoadOptions};
use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::convert::ModelConverter;
use crate::error::SchemaError;
use crate::schema::{ComposedSchema, Loaded};

/// Input value as shown in error messages: strings without quotes.
fn display_json(json: &Json) -> String {
    json.as_str()
        .map_or_else(|| json.to_string(), str::to_string)
}

/// Parse an identifier of `doc_type` from its wire form.
fn parse_identifier(doc_type: &DocumentType, json: &Json) -> Result<Value, String> {
    let id_kind = doc_type
        .id_field()
        .and_then(|name| doc_type.field(name))
        .map(|descriptor| descriptor.kind);

    match id_kind {
        Some(kind) if kind.is_a(&kinds::OBJECT_ID) => json
            .as_str()
            .and_then(|s| ObjectId::parse_str(s).ok())
            .map(Value::ObjectId)
            .ok_or_else(|| format!("invalid ObjectId `{}`", display_json(json))),
        Some(kind)
            if kind.is_a(&kinds::INT) || kind.is_a(&kinds::LONG) || kind.is_a(&kinds::SEQUENCE) =>
        {
            let id = match json {
                Json::Number(n) => n.as_i64(),
                Json::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            id.map(Value::Int)
                .ok_or_else(|| format!("invalid identifier `{}`", display_json(json)))
        }
        Some(kind) if kind.is_a(&kinds::UUID) => json
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Value::Uuid)
            .ok_or_else(|| format!("invalid identifier `{}`", display_json(json))),
        _ => Ok(Value::from_json(json)),
    }
}

/// Find the document of `doc_type` identified by `raw`.
fn resolve_document(
    doc_type: &DocumentType,
    raw: &Json,
    ctx: &LoadContext<'_>,
) -> Result<Document, String> {
    let id = parse_identifier(doc_type, raw)?;
    let store = ctx.store().ok_or_else(|| {
        format!(
            "cannot resolve {} reference without a document store",
            doc_type.name()
        )
    })?;
    match store.find_by_id(doc_type, &id) {
        Ok(Some(doc)) => Ok(doc),
        Ok(None) => Err(format!(
            "unknown document {} `{}`",
            doc_type.name(),
            display_json(raw)
        )),
        Err(err) => Err(err.to_string()),
    }
}

/// Identifier of a referenced document; bare identifiers pass through.
fn reference_to_json(value: &Value) -> Json {
    match value {
        Value::Document(doc) => doc.pk().map_or(Json::Null, Value::to_json),
        other => other.to_json(),
    }
}

/// ObjectId as 24 hex characters.
#[derive(Debug)]
pub struct ObjectIdField;

impl FieldHooks for ObjectIdField {
    fn type_name(&self) -> &'static str {
        "ObjectId"
    }

    fn serialize(&self, value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        match value {
            Value::Null => Ok(Some(Json::Null)),
            Value::ObjectId(oid) => Ok(Some(Json::String(oid.to_hex()))),
            Value::String(s) => Ok(Some(Json::String(s.clone()))),
            other => Err(format!("expected an ObjectId, got {}", other.type_name())),
        }
    }

    fn deserialize(
        &self,
        value: &Json,
        _ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        value
            .as_str()
            .and_then(|s| ObjectId::parse_str(s).ok())
            .map(|oid| Some(Value::ObjectId(oid)))
            .ok_or_else(|| ErrorMessages::message("Invalid ObjectId."))
    }
}

/// Geo point as `{"x": .., "y": ..}`.
#[derive(Debug)]
pub struct PointField;

impl FieldHooks for PointField {
    fn type_name(&self) -> &'static str {
        "Point"
    }

    fn serialize(&self, value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        match value {
            Value::Null => Ok(Some(Json::Null)),
            point @ Value::Point(_) => Ok(Some(point.to_json())),
            other => Err(format!("expected a point, got {}", other.type_name())),
        }
    }

    fn deserialize(
        &self,
        value: &Json,
        _ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        let x = value.get("x").and_then(Json::as_f64);
        let y = value.get("y").and_then(Json::as_f64);
        match (x, y) {
            (Some(x), Some(y)) => Ok(Some(Value::Point([x, y]))),
            _ => Err(ErrorMessages::message("Point must contain x and y.")),
        }
    }
}

/// Never serialized; input is ignored.
#[derive(Debug)]
pub struct SkipField;

impl FieldHooks for SkipField {
    fn type_name(&self) -> &'static str {
        "Skip"
    }

    fn serialize(&self, _value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        Ok(None)
    }

    fn deserialize(
        &self,
        _value: &Json,
        _ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        Ok(None)
    }

    fn accepts_null(&self) -> bool {
        true
    }
}

/// Reference to a document of one type, dumped as its identifier.
#[derive(Debug)]
pub struct ReferenceField {
    target: DocumentRef,
}

impl ReferenceField {
    pub fn new(target: DocumentRef) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &DocumentRef {
        &self.target
    }
}

impl FieldHooks for ReferenceField {
    fn type_name(&self) -> &'static str {
        "Reference"
    }

    fn serialize(&self, value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        Ok(Some(reference_to_json(value)))
    }

    fn deserialize(
        &self,
        value: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        let doc_type = self.target.resolve().map_err(|err| err.to_string())?;
        let doc = resolve_document(&doc_type, value, ctx)?;
        Ok(Some(Value::Document(doc)))
    }
}

/// Reference to a document of any registered type.
///
/// Dumps the identifier only. Loading requires `{"id": .., "_cls": ..}`,
/// where `_cls` names a registered type, restricted to `allowed_types` when
/// that is not empty.
#[derive(Debug)]
pub struct GenericReferenceField {
    allowed_types: Vec<String>,
}

impl GenericReferenceField {
    pub fn new(allowed_types: Vec<String>) -> Self {
        Self { allowed_types }
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }
}

impl FieldHooks for GenericReferenceField {
    fn type_name(&self) -> &'static str {
        "GenericReference"
    }

    fn serialize(&self, value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        Ok(Some(reference_to_json(value)))
    }

    fn deserialize(
        &self,
        value: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        let (Some(id), Some(cls)) = (value.get("id"), value.get("_cls")) else {
            return Err("Need a dict with 'id' and '_cls' fields.".into());
        };
        let Some(cls) = cls.as_str() else {
            return Err(format!("Invalid _cls field `{}`.", cls).into());
        };
        if !self.allowed_types.is_empty() && !self.allowed_types.iter().any(|t| t == cls) {
            return Err(format!(
                "Invalid _cls field `{}`, must be one of {}.",
                cls,
                self.allowed_types.join(", ")
            )
            .into());
        }
        let doc_type =
            lookup_document(cls).map_err(|_| format!("Invalid _cls field `{}`.", cls))?;
        let doc = resolve_document(&doc_type, id, ctx)?;
        Ok(Some(Value::Document(doc)))
    }
}

/// Schema of a document type, assembled on first use and then cached.
pub struct LazySchema {
    target: DocumentRef,
    converter: ModelConverter,
    schema: OnceLock<Arc<ComposedSchema>>,
}

impl LazySchema {
    pub fn new(target: DocumentRef, converter: ModelConverter) -> Self {
        Self {
            target,
            converter,
            schema: OnceLock::new(),
        }
    }

    pub fn target(&self) -> &DocumentRef {
        &self.target
    }

    /// True once the schema has been assembled.
    pub fn is_built(&self) -> bool {
        self.schema.get().is_some()
    }

    /// The schema, assembling it if needed.
    pub fn get(&self) -> Result<Arc<ComposedSchema>, SchemaError> {
        if let Some(schema) = self.schema.get() {
            return Ok(Arc::clone(schema));
        }
        let schema = ComposedSchema::builder()
            .model(self.target.clone())
            .converter(self.converter.clone())
            .build()
            .inspect_err(|err| {
                tracing::warn!(
                    target_type = self.target.name(),
                    error = %err,
                    "Cannot assemble nested schema"
                );
            })?;
        Ok(Arc::clone(self.schema.get_or_init(|| schema)))
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySchema")
            .field("target", &self.target.name())
            .field("built", &self.is_built())
            .finish()
    }
}

/// Embedded document serialized through the schema of its type.
#[derive(Debug)]
pub struct NestedField {
    schema: LazySchema,
}

impl NestedField {
    pub fn new(schema: LazySchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &LazySchema {
        &self.schema
    }
}

impl FieldHooks for NestedField {
    fn type_name(&self) -> &'static str {
        "Nested"
    }

    fn serialize(&self, value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        match value {
            Value::Document(doc) => {
                let schema = self.schema.get().map_err(|err| err.to_string())?;
                let out = schema.dump(doc).map_err(|err| err.to_string())?;
                Ok(Some(Json::Object(out)))
            }
            other => Ok(Some(other.to_json())),
        }
    }

    fn deserialize(
        &self,
        value: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        let schema = self.schema.get().map_err(|err| err.to_string())?;
        match schema.load_with(value, ctx, LoadOptions::default()) {
            Ok(Loaded::Document(doc)) => Ok(Some(Value::Document(doc))),
            Ok(Loaded::Data(data)) => Ok(Some(Value::Map(data))),
            Err(err) => Err(ErrorMessages::Nested(err.into_messages())),
        }
    }
}

/// Embedded document of any type.
///
/// Dumps through a schema assembled for the value's own type. Input carries
/// no type information, so loading discards it.
#[derive(Debug)]
pub struct GenericEmbeddedField {
    converter: ModelConverter,
}

impl GenericEmbeddedField {
    pub fn new(converter: ModelConverter) -> Self {
        Self { converter }
    }
}

impl FieldHooks for GenericEmbeddedField {
    fn type_name(&self) -> &'static str {
        "GenericEmbedded"
    }

    fn serialize(&self, value: &Value, _obj: &Document) -> Result<Option<Json>, String> {
        match value {
            Value::Document(doc) => {
                let schema = ComposedSchema::builder()
                    .model(doc.doc_type())
                    .converter(self.converter.clone())
                    .build()
                    .map_err(|err| err.to_string())?;
                let out = schema.dump(doc).map_err(|err| err.to_string())?;
                Ok(Some(Json::Object(out)))
            }
            other => Ok(Some(other.to_json())),
        }
    }

    fn deserialize(
        &self,
        _value: &Json,
        _ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        Ok(None)
    }

    fn accepts_null(&self) -> bool {
        true
    }
}

/// String-keyed map whose values go through an inner field.
#[derive(Debug)]
pub struct MapField {
    inner: Field,
}

impl MapField {
    pub fn new(inner: Field) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Field {
        &self.inner
    }
}

impl FieldHooks for MapField {
    fn type_name(&self) -> &'static str {
        "Map"
    }

    fn serialize(&self, value: &Value, obj: &Document) -> Result<Option<Json>, String> {
        let map = match value {
            Value::Null => return Ok(Some(Json::Null)),
            Value::Map(map) => map,
            other => return Err(format!("expected a map, got {}", other.type_name())),
        };
        let mut out = Map::new();
        for (key, item) in map {
            if let Some(json) = self.inner.serialize(item, obj)? {
                out.insert(key.clone(), json);
            }
        }
        Ok(Some(Json::Object(out)))
    }

    fn deserialize(
        &self,
        value: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        let Json::Object(input) = value else {
            return Err("Not a valid mapping type.".into());
        };
        let mut values = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (key, item) in input {
            match self.inner.deserialize(item, ctx) {
                Ok(Some(value)) => {
                    values.insert(key.clone(), value);
                }
                Ok(None) => {}
                Err(messages) => {
                    errors.insert(key.clone(), messages);
                }
            }
        }
        if errors.is_empty() {
            Ok(Some(Value::Map(values)))
        } else {
            Err(ErrorMessages::Nested(errors))
        }
    }
}
