//! Field construction arguments.

use crate::validate::Validator;

/// Options used to construct or patch a [`Field`](crate::Field).
///
/// Every scalar is optional: `None` means "leave as is". Argument sets are
/// produced by parameter extractors, merged, then consumed by field
/// construction.
#[derive(Debug, Clone, Default)]
pub struct FieldArgs {
    pub validators: Vec<Validator>,
    pub required: Option<bool>,
    pub allow_none: Option<bool>,
    pub description: Option<String>,
    /// Decimal places of decimal fields.
    pub places: Option<u32>,
    pub dump_only: Option<bool>,
    pub load_only: Option<bool>,
}

impl FieldArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = Some(value);
        self
    }

    pub fn allow_none(mut self, value: bool) -> Self {
        self.allow_none = Some(value);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn places(mut self, places: u32) -> Self {
        self.places = Some(places);
        self
    }

    pub fn dump_only(mut self, value: bool) -> Self {
        self.dump_only = Some(value);
        self
    }

    pub fn load_only(mut self, value: bool) -> Self {
        self.load_only = Some(value);
        self
    }

    /// True if nothing is set.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
            && self.required.is_none()
            && self.allow_none.is_none()
            && self.description.is_none()
            && self.places.is_none()
            && self.dump_only.is_none()
            && self.load_only.is_none()
    }

    /// Merge the output of another extractor: validators accumulate, set
    /// scalars overwrite.
    pub fn extend(&mut self, mut other: FieldArgs) {
        self.validators.append(&mut other.validators);
        self.merge_scalars(other);
    }

    /// Apply caller overrides: set scalars overwrite, a non-empty validator
    /// list replaces the current one.
    pub fn override_with(&mut self, mut other: FieldArgs) {
        if !other.validators.is_empty() {
            self.validators = std::mem::take(&mut other.validators);
        }
        self.merge_scalars(other);
    }

    fn merge_scalars(&mut self, other: FieldArgs) {
        if other.required.is_some() {
            self.required = other.required;
        }
        if other.allow_none.is_some() {
            self.allow_none = other.allow_none;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.places.is_some() {
            self.places = other.places;
        }
        if other.dump_only.is_some() {
            self.dump_only = other.dump_only;
        }
        if other.load_only.is_some() {
            self.load_only = other.load_only;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_accumulates_validators() {
        let mut args = FieldArgs::new()
            .validator(Validator::length(None, Some(3)))
            .required(true);
        args.extend(
            FieldArgs::new()
                .validator(Validator::regexp("^a"))
                .allow_none(true),
        );
        assert_eq!(args.validators.len(), 2);
        assert_eq!(args.required, Some(true));
        assert_eq!(args.allow_none, Some(true));
    }

    #[test]
    fn test_extend_moves_validators_and_scalars_together() {
        let mut args = FieldArgs::new().validator(Validator::Email);
        args.extend(
            FieldArgs::new()
                .validator(Validator::length(Some(1), None))
                .places(2)
                .dump_only(true),
        );
        assert!(matches!(
            args.validators.as_slice(),
            [Validator::Email, Validator::Length { .. }]
        ));
        assert_eq!(args.places, Some(2));
        assert_eq!(args.dump_only, Some(true));
    }

    #[test]
    fn test_extend_later_scalar_wins() {
        let mut args = FieldArgs::new().description("first");
        args.extend(FieldArgs::new().description("second"));
        assert_eq!(args.description.as_deref(), Some("second"));
    }

    #[test]
    fn test_override_replaces_validators() {
        let mut args = FieldArgs::new()
            .validator(Validator::length(None, Some(3)))
            .validator(Validator::regexp("^a"));
        args.override_with(FieldArgs::new().validator(Validator::range(Some(0.0), None)));
        assert_eq!(args.validators.len(), 1);
        assert!(matches!(args.validators[0], Validator::Range { .. }));
    }

    #[test]
    fn test_override_without_validators_keeps_them() {
        let mut args = FieldArgs::new().validator(Validator::Email).required(true);
        args.override_with(FieldArgs::new().required(false));
        assert_eq!(args.validators.len(), 1);
        assert_eq!(args.required, Some(false));
        assert!(!args.is_empty());
        assert!(FieldArgs::new().is_empty());
    }
}
