//! Field kinds and their supertype chain.
//!
//! A [`FieldKind`] names the persistence-side type of a field (`StringField`,
//! `ListField`, ...). Kinds form a single-inheritance tree through an explicit
//! parent pointer, which is what converter lookups walk: a kind without its own
//! mapping falls back to the closest ancestor that has one.
//!
//! Custom kinds are declared as statics extending an existing kind:
//!
//! ```
//! use docschema_core::kind::{FieldKind, kinds};
//!
//! static PERCENT: FieldKind = FieldKind::extends("PercentField", &kinds::INT);
//!
//! let chain: Vec<&str> = PERCENT.ancestors().map(FieldKind::name).collect();
//! assert_eq!(chain, ["PercentField", "IntField", "BaseField"]);
//! ```

use std::fmt;

/// Identity of a persistence field kind.
///
/// Kinds are compared by name, so two kinds must never share a name.
#[derive(Debug)]
pub struct FieldKind {
    name: &'static str,
    parent: Option<&'static FieldKind>,
}

impl FieldKind {
    /// Declare a kind with no parent.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Declare a kind deriving from `parent`.
    pub const fn extends(name: &'static str, parent: &'static FieldKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Kind name, e.g. `"StringField"`.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Direct parent kind, if any.
    pub const fn parent(&self) -> Option<&'static FieldKind> {
        self.parent
    }

    /// Iterate this kind and its ancestors, most derived first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// True if this kind is `other` or derives from it.
    pub fn is_a(&self, other: &FieldKind) -> bool {
        self.ancestors().any(|kind| kind == other)
    }
}

impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FieldKind {}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator over a kind's supertype chain.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    next: Option<&'a FieldKind>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a FieldKind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// Built-in field kinds.
pub mod kinds {
    use super::FieldKind;

    pub static BASE: FieldKind = FieldKind::root("BaseField");

    pub static STRING: FieldKind = FieldKind::extends("StringField", &BASE);
    pub static EMAIL: FieldKind = FieldKind::extends("EmailField", &STRING);
    pub static URL: FieldKind = FieldKind::extends("URLField", &STRING);
    /// Stored as a string, like the persistence layer does.
    pub static COMPLEX_DATETIME: FieldKind = FieldKind::extends("ComplexDateTimeField", &STRING);

    pub static INT: FieldKind = FieldKind::extends("IntField", &BASE);
    pub static LONG: FieldKind = FieldKind::extends("LongField", &BASE);
    pub static FLOAT: FieldKind = FieldKind::extends("FloatField", &BASE);
    pub static DECIMAL: FieldKind = FieldKind::extends("DecimalField", &BASE);
    pub static BOOLEAN: FieldKind = FieldKind::extends("BooleanField", &BASE);
    pub static DATETIME: FieldKind = FieldKind::extends("DateTimeField", &BASE);
    pub static BINARY: FieldKind = FieldKind::extends("BinaryField", &BASE);
    pub static OBJECT_ID: FieldKind = FieldKind::extends("ObjectIdField", &BASE);
    pub static UUID: FieldKind = FieldKind::extends("UUIDField", &BASE);
    pub static SEQUENCE: FieldKind = FieldKind::extends("SequenceField", &BASE);

    pub static GEO_JSON_BASE: FieldKind = FieldKind::extends("GeoJsonBaseField", &BASE);
    pub static POINT: FieldKind = FieldKind::extends("PointField", &GEO_JSON_BASE);

    pub static COMPLEX_BASE: FieldKind = FieldKind::extends("ComplexBaseField", &BASE);
    pub static LIST: FieldKind = FieldKind::extends("ListField", &COMPLEX_BASE);
    pub static SORTED_LIST: FieldKind = FieldKind::extends("SortedListField", &LIST);
    pub static DICT: FieldKind = FieldKind::extends("DictField", &COMPLEX_BASE);
    pub static MAP: FieldKind = FieldKind::extends("MapField", &DICT);
    pub static DYNAMIC: FieldKind = FieldKind::extends("DynamicField", &BASE);

    pub static REFERENCE: FieldKind = FieldKind::extends("ReferenceField", &BASE);
    pub static GENERIC_REFERENCE: FieldKind = FieldKind::extends("GenericReferenceField", &BASE);
    pub static EMBEDDED_DOCUMENT: FieldKind =
        FieldKind::extends("EmbeddedDocumentField", &BASE);
    pub static GENERIC_EMBEDDED_DOCUMENT: FieldKind =
        FieldKind::extends("GenericEmbeddedDocumentField", &BASE);

    pub static FILE: FieldKind = FieldKind::extends("FileField", &BASE);
    pub static IMAGE: FieldKind = FieldKind::extends("ImageField", &FILE);
}
