use std::sync::Arc;

use docschema::prelude::*;
use serde_json::json;

fn course() -> Arc<DocumentType> {
    DocumentType::document("AssemblyCourse")
        .field("title", FieldDescriptor::string().max_length(80).required(true))
        .field("code", FieldDescriptor::string().regex("^[A-Z]{3}[0-9]+$"))
        .field("credits", FieldDescriptor::int().min_value(1.0).max_value(10.0))
        .field("syllabus", FieldDescriptor::string())
        .build()
}

#[test]
fn derived_fields_cover_the_model() {
    let schema = ComposedSchema::for_model(&course()).unwrap();
    let names: Vec<&str> = schema.fields().keys().map(String::as_str).collect();
    assert_eq!(names, ["code", "credits", "id", "syllabus", "title"]);
    assert!(schema.declared_fields().is_empty());
    assert_eq!(schema.model().unwrap().name(), "AssemblyCourse");
}

#[test]
fn inclusion_filter_keeps_only_listed_fields() {
    let schema = ComposedSchema::builder()
        .model(course())
        .fields(["title", "credits"])
        .build()
        .unwrap();
    let names: Vec<&str> = schema.fields().keys().map(String::as_str).collect();
    assert_eq!(names, ["credits", "title"]);
}

#[test]
fn inclusion_filter_also_restricts_declared_fields() {
    let schema = ComposedSchema::builder()
        .model(course())
        .fields(["title"])
        .declare("summary", Field::new(FieldType::String))
        .build()
        .unwrap();
    assert!(schema.field("summary").is_none());
    assert!(schema.field("title").is_some());
}

#[test]
fn exclusion_drops_fields() {
    let schema = ComposedSchema::builder()
        .model(course())
        .exclude(["syllabus", "id"])
        .build()
        .unwrap();
    assert!(schema.field("syllabus").is_none());
    assert!(schema.field("id").is_none());
    assert!(schema.field("title").is_some());
}

#[test]
fn declared_field_replaces_derived_one() {
    let schema = ComposedSchema::builder()
        .model(course())
        .declare(
            "credits",
            Field::with_args(FieldType::Float, FieldArgs::new().required(true)),
        )
        .build()
        .unwrap();
    let credits = schema.field("credits").unwrap();
    assert_eq!(credits.type_name(), "Float");
    assert!(credits.required);
    assert!(credits.validators.is_empty());
}

#[test]
fn declared_fields_without_model() {
    let schema = ComposedSchema::builder()
        .declare("name", Field::new(FieldType::String))
        .declare("count", Field::new(FieldType::Integer))
        .build()
        .unwrap();
    assert!(schema.model().is_none());
    assert_eq!(schema.fields().len(), 2);

    let loaded = ModelSchema::new(schema)
        .load(&json!({"name": "x", "count": "4"}))
        .unwrap();
    assert!(matches!(loaded, Loaded::Data(_)));
    assert_eq!(loaded.get("count"), Some(&Value::Int(4)));
}

#[test]
fn field_kwargs_patch_derived_fields() {
    let schema = ComposedSchema::builder()
        .model(course())
        .field_kwargs(
            "title",
            FieldArgs::new()
                .required(false)
                .description("Shown in listings"),
        )
        .field_kwargs("code", FieldArgs::new().load_only(true))
        .build()
        .unwrap();
    let title = schema.field("title").unwrap();
    assert!(!title.required);
    assert_eq!(title.description.as_deref(), Some("Shown in listings"));
    // Validators not named by the patch survive.
    assert_eq!(title.validators.len(), 1);
    assert!(schema.field("code").unwrap().load_only);
}

#[test]
fn field_kwargs_do_not_touch_parent_declarations() {
    let parent = ComposedSchema::builder()
        .declare("nickname", Field::new(FieldType::String))
        .build()
        .unwrap();
    let child = ComposedSchema::builder()
        .model(course())
        .extends(Arc::clone(&parent))
        .field_kwargs("nickname", FieldArgs::new().required(true).dump_only(true))
        .build()
        .unwrap();

    let patched = child.field("nickname").unwrap();
    assert!(patched.required);
    assert!(patched.dump_only);

    let original = parent.field("nickname").unwrap();
    assert!(!original.required);
    assert!(!original.dump_only);
    assert!(!parent.declared_fields()["nickname"].required);
}

#[test]
fn later_parents_and_own_declarations_win() {
    let first = ComposedSchema::builder()
        .declare("label", Field::new(FieldType::String))
        .declare("score", Field::new(FieldType::Integer))
        .build()
        .unwrap();
    let second = ComposedSchema::builder()
        .declare("label", Field::new(FieldType::Email))
        .build()
        .unwrap();
    let child = ComposedSchema::builder()
        .extends(first)
        .extends(second)
        .declare("score", Field::new(FieldType::Float))
        .build()
        .unwrap();
    assert_eq!(child.field("label").unwrap().type_name(), "Email");
    assert_eq!(child.field("score").unwrap().type_name(), "Float");
    assert_eq!(child.declared_fields().len(), 2);
}

#[test]
fn dump_only_pk_applies_to_generated_identifier() {
    let schema = ComposedSchema::builder()
        .model(course())
        .dump_only_pk(true)
        .build()
        .unwrap();
    assert!(schema.field("id").unwrap().dump_only);

    let model = ModelSchema::new(Arc::clone(&schema));
    let oid = ObjectId::new();
    let loaded = model
        .load(&json!({"id": oid.to_hex(), "title": "Algebra"}))
        .unwrap();
    assert_eq!(loaded.get("id"), Some(&Value::Null));

    let doc = Document::new(&course())
        .with("id", oid)
        .with("title", "Algebra");
    let out = model.dump(&doc).unwrap();
    assert_eq!(out["id"], json!(oid.to_hex()));
}

#[test]
fn dump_only_pk_ignores_explicit_primary_keys() {
    let isbn_book = DocumentType::document("AssemblyIsbnBook")
        .field("isbn", FieldDescriptor::string().primary_key(true))
        .field("title", FieldDescriptor::string())
        .build();
    let schema = ComposedSchema::builder()
        .model(isbn_book)
        .dump_only_pk(true)
        .build()
        .unwrap();
    let isbn = schema.field("isbn").unwrap();
    assert!(!isbn.dump_only);
    assert!(isbn.required);
}

#[test]
fn build_obj_false_returns_plain_data() {
    let schema = ComposedSchema::builder()
        .model(course())
        .build_obj(false)
        .build()
        .unwrap();
    let loaded = ModelSchema::new(schema)
        .load(&json!({"title": "Geometry", "credits": 3}))
        .unwrap();
    match loaded {
        Loaded::Data(data) => {
            assert_eq!(data.len(), 2);
            assert_eq!(data["credits"], Value::Int(3));
        }
        Loaded::Document(_) => panic!("expected plain data"),
    }
}

#[test]
fn unknown_named_model_is_rejected() {
    let err = ComposedSchema::builder()
        .model("AssemblyNeverRegistered")
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidModel { .. }));
    assert!(err.to_string().contains("AssemblyNeverRegistered"));
}

#[test]
fn registered_model_resolves_by_name() {
    DocumentType::document("AssemblyByName")
        .field("slug", FieldDescriptor::string())
        .register();
    let schema = ComposedSchema::for_model("AssemblyByName").unwrap();
    assert!(schema.field("slug").is_some());
}

#[test]
fn private_converter_is_used_for_derivation() {
    static TAG: FieldKind = FieldKind::extends("AssemblyTagField", &kinds::STRING);

    let registry = Arc::new(BuilderRegistry::with_defaults());
    registry.register_field(&TAG, FieldType::Email, Vec::new());
    let tagged = DocumentType::embedded("AssemblyTagged")
        .field("tag", FieldDescriptor::new(&TAG))
        .build();

    let private = ComposedSchema::builder()
        .model(Arc::clone(&tagged))
        .converter(ModelConverter::with_registry(registry))
        .build()
        .unwrap();
    assert_eq!(private.field("tag").unwrap().type_name(), "Email");

    let shared = ComposedSchema::for_model(&tagged).unwrap();
    assert_eq!(shared.field("tag").unwrap().type_name(), "String");
}
