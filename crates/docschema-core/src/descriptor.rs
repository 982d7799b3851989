//! Field descriptors: the persistence-side declaration of one document field.

use std::fmt;
use std::sync::Arc;

use crate::kind::{FieldKind, kinds};
use crate::reference::DocumentRef;
use crate::value::Value;

/// Default value of a field: a constant or a factory invoked per document.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default for a new document.
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Allowed values of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Choices {
    /// Bare values.
    Values(Vec<Value>),
    /// `(value, label)` pairs.
    Labeled(Vec<(Value, String)>),
}

impl Choices {
    pub fn is_empty(&self) -> bool {
        match self {
            Choices::Values(values) => values.is_empty(),
            Choices::Labeled(pairs) => pairs.is_empty(),
        }
    }
}

/// Metadata about one document field.
///
/// Every constraint is optional; absence means "not declared". Descriptors are
/// owned by their [`DocumentType`](crate::DocumentType) and are read-only once
/// the type is built.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Attribute name, assigned when the field is added to a document type.
    pub name: String,
    /// Field kind.
    pub kind: &'static FieldKind,
    /// Whether the field must be present.
    pub required: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Whether this field is the document identifier.
    pub primary_key: bool,
    /// Unique index flag (informational).
    pub unique: bool,
    /// Whether `null` is an accepted value.
    pub null: bool,
    /// Maximum length for string-like kinds.
    pub max_length: Option<usize>,
    /// Minimum length for string-like kinds.
    pub min_length: Option<usize>,
    /// Maximum numeric value.
    pub max_value: Option<f64>,
    /// Minimum numeric value.
    pub min_value: Option<f64>,
    /// Pattern the value must match.
    pub regex: Option<String>,
    /// Allowed values.
    pub choices: Option<Choices>,
    /// Human readable description.
    pub help_text: Option<String>,
    /// Decimal places for decimal kinds.
    pub precision: Option<u32>,
    /// Element descriptor for list and map kinds.
    pub element: Option<Box<FieldDescriptor>>,
    /// Target of reference and embedded-document kinds.
    pub target: Option<DocumentRef>,
    /// Allowed target type names of a generic reference (empty = any).
    pub allowed_types: Vec<String>,
}

impl FieldDescriptor {
    /// Create an unconstrained descriptor of the given kind.
    pub fn new(kind: &'static FieldKind) -> Self {
        Self {
            name: String::new(),
            kind,
            required: false,
            default: None,
            primary_key: false,
            unique: false,
            null: false,
            max_length: None,
            min_length: None,
            max_value: None,
            min_value: None,
            regex: None,
            choices: None,
            help_text: None,
            precision: None,
            element: None,
            target: None,
            allowed_types: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(&kinds::STRING)
    }

    pub fn email() -> Self {
        Self::new(&kinds::EMAIL)
    }

    pub fn url() -> Self {
        Self::new(&kinds::URL)
    }

    pub fn int() -> Self {
        Self::new(&kinds::INT)
    }

    pub fn long() -> Self {
        Self::new(&kinds::LONG)
    }

    pub fn float() -> Self {
        Self::new(&kinds::FLOAT)
    }

    pub fn decimal() -> Self {
        Self::new(&kinds::DECIMAL)
    }

    pub fn boolean() -> Self {
        Self::new(&kinds::BOOLEAN)
    }

    pub fn datetime() -> Self {
        Self::new(&kinds::DATETIME)
    }

    pub fn binary() -> Self {
        Self::new(&kinds::BINARY)
    }

    pub fn object_id() -> Self {
        Self::new(&kinds::OBJECT_ID)
    }

    pub fn uuid() -> Self {
        Self::new(&kinds::UUID)
    }

    pub fn sequence() -> Self {
        Self::new(&kinds::SEQUENCE)
    }

    pub fn point() -> Self {
        Self::new(&kinds::POINT)
    }

    pub fn dict() -> Self {
        Self::new(&kinds::DICT)
    }

    pub fn dynamic() -> Self {
        Self::new(&kinds::DYNAMIC)
    }

    pub fn file() -> Self {
        Self::new(&kinds::FILE)
    }

    /// List of `element`.
    pub fn list(element: FieldDescriptor) -> Self {
        Self::new(&kinds::LIST).element(element)
    }

    /// Sorted list of `element`.
    pub fn sorted_list(element: FieldDescriptor) -> Self {
        Self::new(&kinds::SORTED_LIST).element(element)
    }

    /// String-keyed map of `element`.
    pub fn map(element: FieldDescriptor) -> Self {
        Self::new(&kinds::MAP).element(element)
    }

    /// Reference to a document of type `target`.
    pub fn reference(target: impl Into<DocumentRef>) -> Self {
        Self::new(&kinds::REFERENCE).target(target)
    }

    /// Reference to a document of any registered type.
    pub fn generic_reference() -> Self {
        Self::new(&kinds::GENERIC_REFERENCE)
    }

    /// Embedded document of type `target`.
    pub fn embedded(target: impl Into<DocumentRef>) -> Self {
        Self::new(&kinds::EMBEDDED_DOCUMENT).target(target)
    }

    /// Embedded document of any type.
    pub fn generic_embedded() -> Self {
        Self::new(&kinds::GENERIC_EMBEDDED_DOCUMENT)
    }

    /// Set the attribute name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    /// Set a constant default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Set a default produced by `factory` for every new document.
    pub fn default_with(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    pub fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Accept `null` values.
    pub fn null(mut self, value: bool) -> Self {
        self.null = value;
        self
    }

    pub fn max_length(mut self, value: usize) -> Self {
        self.max_length = Some(value);
        self
    }

    pub fn min_length(mut self, value: usize) -> Self {
        self.min_length = Some(value);
        self
    }

    pub fn max_value(mut self, value: f64) -> Self {
        self.max_value = Some(value);
        self
    }

    pub fn min_value(mut self, value: f64) -> Self {
        self.min_value = Some(value);
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Restrict to bare values.
    pub fn choices<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.choices = Some(Choices::Values(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Restrict to `(value, label)` pairs.
    pub fn labeled_choices<V: Into<Value>, L: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (V, L)>,
    ) -> Self {
        self.choices = Some(Choices::Labeled(
            pairs
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        ));
        self
    }

    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn precision(mut self, places: u32) -> Self {
        self.precision = Some(places);
        self
    }

    pub fn element(mut self, element: FieldDescriptor) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    pub fn target(mut self, target: impl Into<DocumentRef>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Restrict a generic reference to the given type names.
    pub fn allowed_types<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.allowed_types = names.into_iter().map(Into::into).collect();
        self
    }

    /// True if a new document gets a value for this field without input:
    /// a declared default, or the empty list/map of collection kinds.
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.is_collection()
    }

    fn is_collection(&self) -> bool {
        self.kind.is_a(&kinds::LIST) || self.kind.is_a(&kinds::DICT)
    }

    /// Value a freshly constructed document holds for this field.
    ///
    /// The declared default, else an empty list/map for collection kinds,
    /// else `Null`.
    pub fn initial_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.produce();
        }
        if self.kind.is_a(&kinds::LIST) {
            Value::List(Vec::new())
        } else if self.kind.is_a(&kinds::DICT) {
            Value::Map(Default::default())
        } else {
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptor_is_unconstrained() {
        let desc = FieldDescriptor::string();
        assert!(!desc.required);
        assert!(!desc.null);
        assert!(desc.max_length.is_none());
        assert!(desc.choices.is_none());
        assert!(!desc.has_default());
    }

    #[test]
    fn test_builder_chain() {
        let desc = FieldDescriptor::string()
            .named("full_name")
            .max_length(255)
            .unique(true)
            .default("noname");
        assert_eq!(desc.name, "full_name");
        assert_eq!(desc.max_length, Some(255));
        assert!(desc.unique);
        assert_eq!(desc.initial_value(), Value::String("noname".into()));
    }

    #[test]
    fn test_default_factory_runs_each_time() {
        use std::sync::atomic::{AtomicI64, Ordering};
        static CALLS: AtomicI64 = AtomicI64::new(0);

        let desc = FieldDescriptor::int()
            .default_with(|| Value::Int(CALLS.fetch_add(1, Ordering::SeqCst)));
        let first = desc.initial_value();
        let second = desc.initial_value();
        assert_ne!(first, second);
    }

    #[test]
    fn test_collection_initial_values() {
        let list = FieldDescriptor::list(FieldDescriptor::string());
        assert_eq!(list.initial_value(), Value::List(vec![]));
        let dict = FieldDescriptor::dict();
        assert_eq!(dict.initial_value(), Value::Map(Default::default()));
        assert_eq!(FieldDescriptor::float().initial_value(), Value::Null);
    }

    #[test]
    fn test_collections_count_as_defaulted() {
        assert!(FieldDescriptor::list(FieldDescriptor::int()).has_default());
        assert!(FieldDescriptor::sorted_list(FieldDescriptor::int()).has_default());
        assert!(FieldDescriptor::dict().has_default());
        assert!(FieldDescriptor::map(FieldDescriptor::string()).has_default());
        assert!(!FieldDescriptor::dynamic().has_default());
    }

    #[test]
    fn test_labeled_choices() {
        let desc = FieldDescriptor::int().labeled_choices([(0, "zero"), (1, "one")]);
        match desc.choices {
            Some(Choices::Labeled(pairs)) => {
                assert_eq!(pairs[1], (Value::Int(1), "one".to_string()));
            }
            other => panic!("unexpected choices: {:?}", other),
        }
    }
}
