//! Parameter extractors.
//!
//! Each [`Param`] reads one aspect of a [`FieldDescriptor`] and contributes
//! to the field's construction arguments. An absent attribute contributes
//! nothing.

use std::fmt;

use docschema_core::{Choices, FieldDescriptor};
use docschema_fields::{FieldArgs, Validator};

/// Extractor function of a [`Param::Custom`].
pub type ExtractFn = fn(&FieldDescriptor) -> FieldArgs;

/// One parameter extractor.
#[derive(Clone, Copy)]
pub enum Param {
    /// `required` when the descriptor is required (or the primary key) and
    /// has no default.
    Required,
    /// Length validator from `min_length` / `max_length`.
    Length,
    /// Range validator from `min_value` / `max_value`.
    NumericRange,
    /// Pattern validator from a non-empty `regex`.
    Regex,
    /// Membership validator from `choices`; labeled choices are unzipped.
    Choice,
    /// `allow_none` when the descriptor accepts null.
    AllowNone,
    /// `description` from `help_text`.
    Description,
    /// Decimal `places` from `precision`.
    Precision,
    /// A third-party extractor.
    Custom(ExtractFn),
}

/// Extractors every default builder runs first, in this order.
pub const BASE_PARAMS: [Param; 4] = [
    Param::Description,
    Param::AllowNone,
    Param::Choice,
    Param::Required,
];

impl Param {
    /// Arguments contributed for `descriptor`.
    pub fn extract(&self, descriptor: &FieldDescriptor) -> FieldArgs {
        let args = FieldArgs::new();
        match self {
            Param::Required => {
                let required = descriptor.required || descriptor.primary_key;
                if required && !descriptor.has_default() {
                    args.required(true)
                } else {
                    args
                }
            }
            Param::Length => match (descriptor.min_length, descriptor.max_length) {
                (None, None) => args,
                (min, max) => args.validator(Validator::length(min, max)),
            },
            Param::NumericRange => match (descriptor.min_value, descriptor.max_value) {
                (None, None) => args,
                (min, max) => args.validator(Validator::range(min, max)),
            },
            Param::Regex => match descriptor.regex.as_deref() {
                Some(pattern) if !pattern.is_empty() => args.validator(Validator::regexp(pattern)),
                _ => args,
            },
            Param::Choice => match &descriptor.choices {
                Some(choices) if !choices.is_empty() => {
                    let (values, labels) = match choices {
                        Choices::Values(values) => (values.clone(), Vec::new()),
                        Choices::Labeled(pairs) => pairs.iter().cloned().unzip(),
                    };
                    args.validator(Validator::one_of(values, labels))
                }
                _ => args,
            },
            Param::AllowNone => {
                if descriptor.null {
                    args.allow_none(true)
                } else {
                    args
                }
            }
            Param::Description => match &descriptor.help_text {
                Some(text) => args.description(text.clone()),
                None => args,
            },
            Param::Precision => match descriptor.precision {
                Some(places) => args.places(places),
                None => args,
            },
            Param::Custom(extract) => extract(descriptor),
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Required => f.write_str("Required"),
            Param::Length => f.write_str("Length"),
            Param::NumericRange => f.write_str("NumericRange"),
            Param::Regex => f.write_str("Regex"),
            Param::Choice => f.write_str("Choice"),
            Param::AllowNone => f.write_str("AllowNone"),
            Param::Description => f.write_str("Description"),
            Param::Precision => f.write_str("Precision"),
            Param::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Run `params` in order and merge their output.
pub fn extract_all(params: &[Param], descriptor: &FieldDescriptor) -> FieldArgs {
    params.iter().fold(FieldArgs::new(), |mut args, param| {
        args.extend(param.extract(descriptor));
        args
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docschema_core::Value;

    #[test]
    fn test_absent_attributes_contribute_nothing() {
        let desc = FieldDescriptor::string();
        for param in BASE_PARAMS
            .iter()
            .chain(&[Param::Length, Param::NumericRange, Param::Regex, Param::Precision])
        {
            assert!(param.extract(&desc).is_empty(), "{:?}", param);
        }
    }

    #[test]
    fn test_required_exempts_defaults() {
        let required = FieldDescriptor::string().required(true);
        assert_eq!(Param::Required.extract(&required).required, Some(true));

        let with_default = FieldDescriptor::string().required(true).default("x");
        assert!(Param::Required.extract(&with_default).required.is_none());

        let pk = FieldDescriptor::int().primary_key(true);
        assert_eq!(Param::Required.extract(&pk).required, Some(true));
    }

    #[test]
    fn test_length_uses_present_bounds() {
        let args = Param::Length.extract(&FieldDescriptor::string().max_length(255));
        match args.validators.as_slice() {
            [Validator::Length { min: None, max: Some(255) }] => {}
            other => panic!("unexpected validators: {:?}", other),
        }
    }

    #[test]
    fn test_numeric_range() {
        let args =
            Param::NumericRange.extract(&FieldDescriptor::int().min_value(10.0).max_value(99.0));
        match args.validators.as_slice() {
            [Validator::Range { min: Some(min), max: Some(max) }] => {
                assert_eq!((*min, *max), (10.0, 99.0));
            }
            other => panic!("unexpected validators: {:?}", other),
        }
    }

    #[test]
    fn test_empty_regex_is_ignored() {
        assert!(Param::Regex.extract(&FieldDescriptor::string().regex("")).is_empty());
        assert_eq!(
            Param::Regex
                .extract(&FieldDescriptor::string().regex("^[a-z]+$"))
                .validators
                .len(),
            1
        );
    }

    #[test]
    fn test_labeled_choices_unzip() {
        let desc = FieldDescriptor::string().labeled_choices([("m", "Male"), ("f", "Female")]);
        let args = Param::Choice.extract(&desc);
        match args.validators.as_slice() {
            [Validator::OneOf { choices, labels }] => {
                assert_eq!(choices, &vec![Value::from("m"), Value::from("f")]);
                assert_eq!(labels, &vec!["Male".to_string(), "Female".to_string()]);
            }
            other => panic!("unexpected validators: {:?}", other),
        }
    }

    #[test]
    fn test_scalar_params() {
        let desc = FieldDescriptor::decimal()
            .null(true)
            .help_text("Price in EUR")
            .precision(2);
        let args = extract_all(&[Param::AllowNone, Param::Description, Param::Precision], &desc);
        assert_eq!(args.allow_none, Some(true));
        assert_eq!(args.description.as_deref(), Some("Price in EUR"));
        assert_eq!(args.places, Some(2));
    }

    #[test]
    fn test_extract_all_accumulates_in_order() {
        let desc = FieldDescriptor::string()
            .max_length(3)
            .regex("^a")
            .choices(["abc"]);
        let mut params = BASE_PARAMS.to_vec();
        params.extend([Param::Length, Param::Regex]);
        let args = extract_all(&params, &desc);
        assert!(matches!(args.validators[0], Validator::OneOf { .. }));
        assert!(matches!(args.validators[1], Validator::Length { .. }));
        assert!(matches!(args.validators[2], Validator::Regexp { .. }));
    }

    #[test]
    fn test_custom_param() {
        fn dump_only_unique(desc: &FieldDescriptor) -> FieldArgs {
            if desc.unique {
                FieldArgs::new().dump_only(true)
            } else {
                FieldArgs::new()
            }
        }
        let param = Param::Custom(dump_only_unique);
        assert_eq!(
            param.extract(&FieldDescriptor::string().unique(true)).dump_only,
            Some(true)
        );
        assert!(param.extract(&FieldDescriptor::string()).is_empty());
    }
}
