//! Dump and load over a set of named fields.

use std::collections::BTreeMap;

use docschema_core::{Document, Value};
use serde_json::{Map, Value as Json};

use crate::error::{DumpError, ErrorMessages, ValidationError};
use crate::field::{Field, LoadContext, REQUIRED_MESSAGE};

/// Named fields of a schema.
pub type FieldSet = BTreeMap<String, Field>;

/// Per-call load settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Skip the check for required keys.
    pub partial: bool,
}

impl LoadOptions {
    pub fn partial() -> Self {
        Self { partial: true }
    }
}

/// Serialize the attributes of `obj` named by `fields`.
///
/// Load-only fields and attributes the document does not have are left out.
pub fn dump_fields(fields: &FieldSet, obj: &Document) -> Result<Map<String, Json>, DumpError> {
    let mut out = Map::new();
    for (name, field) in fields {
        if field.load_only {
            continue;
        }
        let Some(value) = obj.get(name) else {
            continue;
        };
        match field.serialize(value, obj) {
            Ok(Some(json)) => {
                out.insert(name.clone(), json);
            }
            Ok(None) => {}
            Err(message) => return Err(DumpError::new(name, message)),
        }
    }
    Ok(out)
}

/// Deserialize and validate `data` against `fields`.
///
/// Errors from every field are collected into one [`ValidationError`].
/// Dump-only fields and unknown keys are ignored.
pub fn load_fields(
    fields: &FieldSet,
    data: &Json,
    ctx: &LoadContext<'_>,
    options: LoadOptions,
) -> Result<BTreeMap<String, Value>, ValidationError> {
    let Json::Object(input) = data else {
        return Err(ValidationError::schema("Invalid input type."));
    };

    let mut loaded = BTreeMap::new();
    let mut errors = ValidationError::new();
    for (name, field) in fields {
        if field.dump_only {
            continue;
        }
        match input.get(name) {
            None => {
                if field.required && !options.partial {
                    errors.add(name.clone(), ErrorMessages::message(REQUIRED_MESSAGE));
                }
            }
            Some(json) => match field.deserialize(json, ctx) {
                Ok(Some(value)) => {
                    loaded.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(messages) => errors.add(name.clone(), messages),
            },
        }
    }

    if errors.is_empty() {
        Ok(loaded)
    } else {
        tracing::debug!(fields = errors.messages().len(), "Load failed validation");
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FieldArgs;
    use crate::field::FieldType;
    use docschema_core::{DocumentType, FieldDescriptor};
    use serde_json::json;

    fn fields() -> FieldSet {
        let mut fields = FieldSet::new();
        fields.insert(
            "name".to_string(),
            Field::with_args(FieldType::String, FieldArgs::new().required(true)),
        );
        fields.insert("age".to_string(), Field::new(FieldType::Integer));
        fields.insert(
            "secret".to_string(),
            Field::with_args(FieldType::String, FieldArgs::new().load_only(true)),
        );
        fields.insert(
            "created".to_string(),
            Field::with_args(FieldType::String, FieldArgs::new().dump_only(true)),
        );
        fields
    }

    #[test]
    fn test_dump_skips_load_only_and_missing() {
        let doc_type = DocumentType::embedded("SchemaDumpTest")
            .field("name", FieldDescriptor::string())
            .field("secret", FieldDescriptor::string())
            .build();
        let doc = Document::new(&doc_type)
            .with("name", "Jane")
            .with("secret", "hunter2");

        let out = dump_fields(&fields(), &doc).unwrap();
        assert_eq!(out.get("name"), Some(&json!("Jane")));
        assert!(!out.contains_key("secret"));
        assert!(!out.contains_key("age"));
    }

    #[test]
    fn test_load_collects_errors() {
        let err = load_fields(
            &fields(),
            &json!({"age": "old"}),
            &LoadContext::new(),
            LoadOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.field("name").unwrap().as_list(),
            [REQUIRED_MESSAGE.to_string()]
        );
        assert!(err.field("age").is_some());
    }

    #[test]
    fn test_load_ignores_dump_only_and_unknown() {
        let loaded = load_fields(
            &fields(),
            &json!({"name": "Jane", "created": "now", "extra": 1}),
            &LoadContext::new(),
            LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("name"), Some(&Value::from("Jane")));
    }

    #[test]
    fn test_partial_skips_required() {
        let loaded = load_fields(
            &fields(),
            &json!({"age": 3}),
            &LoadContext::new(),
            LoadOptions::partial(),
        )
        .unwrap();
        assert_eq!(loaded.get("age"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_non_object_input() {
        let err = load_fields(
            &fields(),
            &json!([1, 2]),
            &LoadContext::new(),
            LoadOptions::default(),
        )
        .unwrap_err();
        assert!(err.field("_schema").is_some());
    }
}
