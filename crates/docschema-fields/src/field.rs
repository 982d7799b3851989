//! Serialization fields.
//!
//! A [`Field`] turns one document attribute into JSON and back. Built-in
//! behaviour covers scalar types, raw JSON and lists; anything else plugs in
//! through [`FieldHooks`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use docschema_core::{Document, DocumentStore, Value};
use serde_json::{Number, Value as Json};
use uuid::Uuid;

use crate::args::FieldArgs;
use crate::decimal;
use crate::error::ErrorMessages;
use crate::validate::Validator;

/// Message for a required field absent from the input.
pub const REQUIRED_MESSAGE: &str = "Missing data for required field.";
/// Message for `null` input on a field that does not allow it.
pub const NULL_MESSAGE: &str = "Field may not be null.";

/// State available to fields while loading.
#[derive(Clone, Copy, Default)]
pub struct LoadContext<'a> {
    store: Option<&'a dyn DocumentStore>,
}

impl<'a> LoadContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose reference fields resolve through `store`.
    pub fn with_store(store: &'a dyn DocumentStore) -> Self {
        Self { store: Some(store) }
    }

    pub fn store(&self) -> Option<&'a dyn DocumentStore> {
        self.store
    }
}

impl fmt::Debug for LoadContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadContext")
            .field("store", &self.store.map(|_| ".."))
            .finish()
    }
}

/// Behaviour of a field type defined outside this crate.
pub trait FieldHooks: fmt::Debug + Send + Sync {
    /// Name reported by [`Field::type_name`].
    fn type_name(&self) -> &'static str;

    /// Serialize `value`, an attribute of `obj`. `Ok(None)` omits the key.
    fn serialize(&self, value: &Value, obj: &Document) -> Result<Option<Json>, String>;

    /// Deserialize input. `Ok(None)` leaves the attribute out of the result.
    fn deserialize(
        &self,
        value: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages>;

    /// Whether `null` input is passed to [`deserialize`](Self::deserialize)
    /// instead of being checked against `allow_none`.
    fn accepts_null(&self) -> bool {
        false
    }
}

/// What a field serializes to and from.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Email,
    Url,
    Integer,
    Float,
    /// Exact decimal, dumped as a string.
    Decimal,
    Boolean,
    /// RFC 3339 date-time.
    DateTime,
    Uuid,
    /// Arbitrary JSON, passed through unchanged.
    Raw,
    List(Box<Field>),
    Custom(Arc<dyn FieldHooks>),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Email => "Email",
            FieldType::Url => "Url",
            FieldType::Integer => "Integer",
            FieldType::Float => "Float",
            FieldType::Decimal => "Decimal",
            FieldType::Boolean => "Boolean",
            FieldType::DateTime => "DateTime",
            FieldType::Uuid => "UUID",
            FieldType::Raw => "Raw",
            FieldType::List(_) => "List",
            FieldType::Custom(hooks) => hooks.type_name(),
        }
    }
}

/// A serialization field: type plus options.
#[derive(Debug, Clone)]
pub struct Field {
    pub field_type: FieldType,
    /// Input must contain the key.
    pub required: bool,
    /// `null` input is accepted.
    pub allow_none: bool,
    /// Serialized but ignored on load.
    pub dump_only: bool,
    /// Loaded but never serialized.
    pub load_only: bool,
    pub validators: Vec<Validator>,
    pub description: Option<String>,
    /// Decimal places of decimal fields.
    pub places: Option<u32>,
}

impl Field {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            allow_none: false,
            dump_only: false,
            load_only: false,
            validators: Vec::new(),
            description: None,
            places: None,
        }
    }

    /// Construct a field and apply `args`.
    pub fn with_args(field_type: FieldType, args: FieldArgs) -> Self {
        let mut field = Self::new(field_type);
        field.apply(args);
        field
    }

    /// Patch options: set scalars overwrite, non-empty validators replace.
    pub fn apply(&mut self, args: FieldArgs) {
        if !args.validators.is_empty() {
            self.validators = args.validators;
        }
        if let Some(required) = args.required {
            self.required = required;
        }
        if let Some(allow_none) = args.allow_none {
            self.allow_none = allow_none;
        }
        if let Some(description) = args.description {
            self.description = Some(description);
        }
        if let Some(places) = args.places {
            self.places = Some(places);
        }
        if let Some(dump_only) = args.dump_only {
            self.dump_only = dump_only;
        }
        if let Some(load_only) = args.load_only {
            self.load_only = load_only;
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.field_type.name()
    }

    /// Hooks of a custom field.
    pub fn hooks(&self) -> Option<&Arc<dyn FieldHooks>> {
        match &self.field_type {
            FieldType::Custom(hooks) => Some(hooks),
            _ => None,
        }
    }

    /// Inner field of a list field.
    pub fn inner(&self) -> Option<&Field> {
        match &self.field_type {
            FieldType::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Run every validator, collecting all failures.
    pub fn validate(&self, value: &Value) -> Result<(), ErrorMessages> {
        let failures: Vec<String> = self
            .validators
            .iter()
            .filter_map(|v| v.validate(value).err())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ErrorMessages::List(failures))
        }
    }

    /// Serialize `value`, an attribute of `obj`. `Ok(None)` omits the key.
    pub fn serialize(&self, value: &Value, obj: &Document) -> Result<Option<Json>, String> {
        let json = match &self.field_type {
            FieldType::Custom(hooks) => return hooks.serialize(value, obj),
            _ if value.is_null() => Json::Null,
            FieldType::String | FieldType::Email | FieldType::Url => match value.to_json() {
                other @ (Json::Number(_) | Json::Bool(_)) => Json::String(other.to_string()),
                other => other,
            },
            FieldType::Integer => match value {
                Value::Int(i) => Json::from(*i),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Json::from)
                    .map_err(|_| format!("`{}` is not a valid integer", s))?,
                other => other
                    .as_f64()
                    .map(|f| Json::from(f.trunc() as i64))
                    .ok_or_else(|| unexpected("integer", other))?,
            },
            FieldType::Float => {
                let number = match value {
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    other => other.as_f64(),
                }
                .ok_or_else(|| unexpected("number", value))?;
                Number::from_f64(number).map_or(Json::Null, Json::Number)
            }
            FieldType::Decimal => {
                let text = match value {
                    Value::Decimal(s) | Value::String(s) => s.clone(),
                    Value::Int(i) => i.to_string(),
                    Value::Float(f) => format!("{}", f),
                    other => return Err(unexpected("decimal", other)),
                };
                decimal::normalize(&text, self.places)
                    .map(Json::String)
                    .ok_or_else(|| format!("`{}` is not a valid decimal", text))?
            }
            FieldType::Boolean => match value {
                Value::Bool(b) => Json::Bool(*b),
                other => return Err(unexpected("boolean", other)),
            },
            FieldType::DateTime | FieldType::Uuid | FieldType::Raw => value.to_json(),
            FieldType::List(inner) => {
                let items = value.as_list().ok_or_else(|| unexpected("list", value))?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(json) = inner.serialize(item, obj)? {
                        out.push(json);
                    }
                }
                Json::Array(out)
            }
        };
        Ok(Some(json))
    }

    /// Deserialize and validate input. `Ok(None)` leaves the attribute out.
    pub fn deserialize(
        &self,
        json: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        if json.is_null() {
            if let Some(hooks) = self.hooks().filter(|h| h.accepts_null()) {
                return hooks.deserialize(json, ctx);
            }
            return if self.allow_none {
                Ok(Some(Value::Null))
            } else {
                Err(ErrorMessages::message(NULL_MESSAGE))
            };
        }

        let value = self.deserialize_type(json, ctx)?;
        if let Some(value) = &value {
            self.validate(value)?;
        }
        Ok(value)
    }

    fn deserialize_type(
        &self,
        json: &Json,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        let value = match &self.field_type {
            FieldType::String => Value::String(expect_str(json)?.to_string()),
            FieldType::Email => {
                let value = Value::String(expect_str(json)?.to_string());
                Validator::Email.validate(&value)?;
                value
            }
            FieldType::Url => {
                let value = Value::String(expect_str(json)?.to_string());
                Validator::Url.validate(&value)?;
                value
            }
            FieldType::Integer => Value::Int(parse_integer(json).ok_or("Not a valid integer.")?),
            FieldType::Float => Value::Float(parse_float(json).ok_or("Not a valid number.")?),
            FieldType::Decimal => {
                let text = match json {
                    Json::Number(n) => n.to_string(),
                    Json::String(s) => s.clone(),
                    _ => return Err("Not a valid number.".into()),
                };
                Value::Decimal(decimal::normalize(&text, self.places).ok_or("Not a valid number.")?)
            }
            FieldType::Boolean => Value::Bool(parse_bool(json).ok_or("Not a valid boolean.")?),
            FieldType::DateTime => {
                Value::DateTime(parse_datetime(json).ok_or("Not a valid datetime.")?)
            }
            FieldType::Uuid => {
                let uuid = json
                    .as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or("Not a valid UUID.")?;
                Value::Uuid(uuid)
            }
            FieldType::Raw => Value::from_json(json),
            FieldType::List(inner) => {
                let Json::Array(items) = json else {
                    return Err("Not a valid list.".into());
                };
                let mut values = Vec::with_capacity(items.len());
                let mut errors = BTreeMap::new();
                for (index, item) in items.iter().enumerate() {
                    match inner.deserialize(item, ctx) {
                        Ok(Some(value)) => values.push(value),
                        Ok(None) => {}
                        Err(messages) => {
                            errors.insert(index.to_string(), messages);
                        }
                    }
                }
                if !errors.is_empty() {
                    return Err(ErrorMessages::Nested(errors));
                }
                Value::List(values)
            }
            FieldType::Custom(hooks) => return hooks.deserialize(json, ctx),
        };
        Ok(Some(value))
    }
}

fn unexpected(expected: &str, value: &Value) -> String {
    format!("expected {}, got {}", expected, value.type_name())
}

fn expect_str(json: &Json) -> Result<&str, ErrorMessages> {
    json.as_str()
        .ok_or_else(|| ErrorMessages::message("Not a valid string."))
}

fn parse_integer(json: &Json) -> Option<i64> {
    match json {
        Json::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e18)
                .map(|f| f as i64)
        }),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_float(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn parse_bool(json: &Json) -> Option<bool> {
    match json {
        Json::Bool(b) => Some(*b),
        Json::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Json::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
fn parse_datetime(json: &Json) -> Option<DateTime<Utc>> {
    let text = json.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docschema_core::DocumentType;
    use serde_json::json;

    fn load(field: &Field, json: Json) -> Result<Option<Value>, ErrorMessages> {
        field.deserialize(&json, &LoadContext::new())
    }

    fn dump(field: &Field, value: Value) -> Option<Json> {
        let doc_type = DocumentType::embedded("FieldTestDoc").build();
        field.serialize(&value, &Document::new(&doc_type)).unwrap()
    }

    #[test]
    fn test_null_handling() {
        let field = Field::new(FieldType::String);
        assert_eq!(
            load(&field, Json::Null),
            Err(ErrorMessages::message(NULL_MESSAGE))
        );

        let nullable = Field::with_args(FieldType::String, FieldArgs::new().allow_none(true));
        assert_eq!(load(&nullable, Json::Null), Ok(Some(Value::Null)));
        assert_eq!(dump(&field, Value::Null), Some(Json::Null));
    }

    #[test]
    fn test_scalar_loading() {
        assert_eq!(
            load(&Field::new(FieldType::Integer), json!("42")),
            Ok(Some(Value::Int(42)))
        );
        assert_eq!(
            load(&Field::new(FieldType::Integer), json!(4.0)),
            Ok(Some(Value::Int(4)))
        );
        assert!(load(&Field::new(FieldType::Integer), json!(4.5)).is_err());
        assert_eq!(
            load(&Field::new(FieldType::Float), json!(1.5)),
            Ok(Some(Value::Float(1.5)))
        );
        assert_eq!(
            load(&Field::new(FieldType::Boolean), json!("yes")),
            Ok(Some(Value::Bool(true)))
        );
        assert_eq!(
            load(&Field::new(FieldType::String), json!(1)),
            Err(ErrorMessages::message("Not a valid string."))
        );
    }

    #[test]
    fn test_email_and_url_types_check_format() {
        assert!(load(&Field::new(FieldType::Email), json!("a@b.io")).is_ok());
        assert_eq!(
            load(&Field::new(FieldType::Email), json!("nope")),
            Err(ErrorMessages::message("Not a valid email address."))
        );
        assert!(load(&Field::new(FieldType::Url), json!("http://x.org")).is_ok());
        assert!(load(&Field::new(FieldType::Url), json!("x.org")).is_err());
    }

    #[test]
    fn test_decimal_quantizes() {
        let field = Field::with_args(FieldType::Decimal, FieldArgs::new().places(2));
        assert_eq!(
            load(&field, json!("3.14159")),
            Ok(Some(Value::Decimal("3.14".to_string())))
        );
        assert_eq!(
            load(&field, json!(2)),
            Ok(Some(Value::Decimal("2.00".to_string())))
        );
        assert_eq!(
            dump(&field, Value::Decimal("1.5".to_string())),
            Some(json!("1.50"))
        );
        assert!(load(&field, json!("pi")).is_err());
    }

    #[test]
    fn test_datetime_and_uuid() {
        let field = Field::new(FieldType::DateTime);
        let loaded = load(&field, json!("2016-01-02T03:04:05Z")).unwrap().unwrap();
        assert_eq!(dump(&field, loaded), Some(json!("2016-01-02T03:04:05Z")));
        assert!(load(&field, json!("2016-01-02T03:04:05")).unwrap().is_some());
        assert!(load(&field, json!("yesterday")).is_err());

        let uuid = Uuid::new_v4();
        let field = Field::new(FieldType::Uuid);
        assert_eq!(
            load(&field, json!(uuid.to_string())),
            Ok(Some(Value::Uuid(uuid)))
        );
        assert_eq!(dump(&field, Value::Uuid(uuid)), Some(json!(uuid.to_string())));
    }

    #[test]
    fn test_validators_collect_all_failures() {
        let field = Field::with_args(
            FieldType::String,
            FieldArgs::new()
                .validator(Validator::length(None, Some(2)))
                .validator(Validator::regexp("^[0-9]+$")),
        );
        match load(&field, json!("abc")) {
            Err(ErrorMessages::List(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_list_errors_by_index() {
        let field = Field::new(FieldType::List(Box::new(Field::new(FieldType::Integer))));
        assert_eq!(
            load(&field, json!([1, "2"])),
            Ok(Some(Value::List(vec![Value::Int(1), Value::Int(2)])))
        );

        let err = load(&field, json!([1, "x", 3])).unwrap_err();
        assert!(err.get("1").is_some());
        assert!(err.get("0").is_none());
        assert_eq!(
            load(&field, json!("x")),
            Err(ErrorMessages::message("Not a valid list."))
        );
    }

    #[test]
    fn test_list_dump() {
        let field = Field::new(FieldType::List(Box::new(Field::new(FieldType::String))));
        assert_eq!(
            dump(&field, Value::from(vec!["a", "b"])),
            Some(json!(["a", "b"]))
        );
        assert_eq!(dump(&field, Value::List(vec![])), Some(json!([])));
    }

    #[test]
    fn test_raw_passthrough() {
        let field = Field::new(FieldType::Raw);
        let input = json!({"a": [1, 2.5, "x"], "b": {"c": true}});
        let loaded = load(&field, input.clone()).unwrap().unwrap();
        assert_eq!(dump(&field, loaded), Some(input));
    }

    #[test]
    fn test_apply_patches_options() {
        let mut field = Field::with_args(
            FieldType::String,
            FieldArgs::new().validator(Validator::Email).required(true),
        );
        field.apply(FieldArgs::new().dump_only(true).description("Contact"));
        assert!(field.required);
        assert!(field.dump_only);
        assert_eq!(field.validators.len(), 1);
        assert_eq!(field.description.as_deref(), Some("Contact"));
        assert_eq!(field.type_name(), "String");
    }
}
