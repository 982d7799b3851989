//! Value validators attached to serialization fields.
//!
//! Validators run after a value has been deserialized. Each failing validator
//! contributes one message; a field collects all of them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use docschema_core::Value;
use regex::Regex;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const URL_PATTERN: &str = r"^(?:https?|ftps?)://[^\s/$.?#][^\s]*$";

/// Compiled patterns keyed by source text, filled on first use.
struct RegexCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(regex) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return Ok(regex.clone());
        }

        let regex = Regex::new(pattern)?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(RegexCache::new)
}

/// True if `pattern` matches at the start of `value`.
///
/// An invalid pattern never matches; the compile error is logged.
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    match regex_cache().get_or_compile(pattern) {
        Ok(regex) => regex.find(value).is_some_and(|m| m.start() == 0),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "Invalid regex pattern in validator, treating as non-match"
            );
            false
        }
    }
}

/// Check function of a [`Validator::Custom`].
pub type CheckFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// A constraint on a deserialized value.
#[derive(Clone)]
pub enum Validator {
    /// Character count of strings, element count of lists and maps.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Pattern anchored at the start of the string.
    Regexp { pattern: String },
    /// Membership in `choices`; `labels` are informational.
    OneOf {
        choices: Vec<Value>,
        labels: Vec<String>,
    },
    Email,
    Url,
    Custom { name: String, check: CheckFn },
}

impl Validator {
    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Validator::Length { min, max }
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Validator::Range { min, max }
    }

    pub fn regexp(pattern: impl Into<String>) -> Self {
        Validator::Regexp {
            pattern: pattern.into(),
        }
    }

    pub fn one_of(choices: Vec<Value>, labels: Vec<String>) -> Self {
        Validator::OneOf { choices, labels }
    }

    /// Validator backed by a closure returning the failure message.
    pub fn custom(
        name: impl Into<String>,
        check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Validator::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Check `value`, returning the failure message.
    ///
    /// Values of a type the validator does not apply to pass.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::Length { min, max } => {
                let len = match value {
                    Value::String(s) => s.chars().count(),
                    Value::List(items) => items.len(),
                    Value::Map(map) => map.len(),
                    _ => return Ok(()),
                };
                check_length(len, *min, *max)
            }
            Validator::Range { min, max } => match value.as_f64() {
                Some(number) => check_range(number, *min, *max),
                None => Ok(()),
            },
            Validator::Regexp { pattern } => match value {
                Value::String(s) if !matches_pattern(s, pattern) => {
                    Err("String does not match expected pattern.".to_string())
                }
                _ => Ok(()),
            },
            Validator::OneOf { choices, .. } => {
                if choices.iter().any(|choice| choice_matches(choice, value)) {
                    Ok(())
                } else {
                    Err("Not a valid choice.".to_string())
                }
            }
            Validator::Email => match value {
                Value::String(s) if !matches_pattern(s, EMAIL_PATTERN) => {
                    Err("Not a valid email address.".to_string())
                }
                _ => Ok(()),
            },
            Validator::Url => match value {
                Value::String(s) if !matches_pattern(s, URL_PATTERN) => {
                    Err("Not a valid URL.".to_string())
                }
                _ => Ok(()),
            },
            Validator::Custom { check, .. } => check(value),
        }
    }
}

fn check_length(len: usize, min: Option<usize>, max: Option<usize>) -> Result<(), String> {
    let too_short = min.is_some_and(|min| len < min);
    let too_long = max.is_some_and(|max| len > max);
    match (min, max) {
        _ if !too_short && !too_long => Ok(()),
        (Some(min), Some(max)) => Err(format!("Length must be between {} and {}.", min, max)),
        (Some(min), _) => Err(format!("Shorter than minimum length {}.", min)),
        (_, max) => Err(format!("Longer than maximum length {}.", max.unwrap_or(len))),
    }
}

fn check_range(number: f64, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    let below = min.is_some_and(|min| number < min);
    let above = max.is_some_and(|max| number > max);
    match (min, max) {
        _ if !below && !above => Ok(()),
        (Some(min), Some(max)) => Err(format!("Must be between {} and {}.", min, max)),
        (Some(min), _) => Err(format!("Must be at least {}.", min)),
        (_, max) => Err(format!("Must be at most {}.", max.unwrap_or(number))),
    }
}

/// Choice equality; numbers compare by value across `Int`/`Float`/`Decimal`.
fn choice_matches(choice: &Value, value: &Value) -> bool {
    if choice == value {
        return true;
    }
    let numeric = |v: &Value| matches!(v, Value::Int(_) | Value::Float(_) | Value::Decimal(_));
    if numeric(choice) && numeric(value) {
        return choice.as_f64().is_some() && choice.as_f64() == value.as_f64();
    }
    false
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Length { min, max } => f
                .debug_struct("Length")
                .field("min", min)
                .field("max", max)
                .finish(),
            Validator::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Validator::Regexp { pattern } => {
                f.debug_struct("Regexp").field("pattern", pattern).finish()
            }
            Validator::OneOf { choices, labels } => f
                .debug_struct("OneOf")
                .field("choices", choices)
                .field("labels", labels)
                .finish(),
            Validator::Email => f.write_str("Email"),
            Validator::Url => f.write_str("Url"),
            Validator::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_messages() {
        let max = Validator::length(None, Some(3));
        assert_eq!(
            max.validate(&Value::from("abcd")),
            Err("Longer than maximum length 3.".to_string())
        );
        assert!(max.validate(&Value::from("abc")).is_ok());

        let min = Validator::length(Some(2), None);
        assert_eq!(
            min.validate(&Value::from("a")),
            Err("Shorter than minimum length 2.".to_string())
        );

        let both = Validator::length(Some(1), Some(2));
        assert_eq!(
            both.validate(&Value::List(vec![])),
            Err("Length must be between 1 and 2.".to_string())
        );
    }

    #[test]
    fn test_length_counts_chars() {
        let max = Validator::length(None, Some(2));
        assert!(max.validate(&Value::from("éé")).is_ok());
        assert!(max.validate(&Value::Int(12345)).is_ok());
    }

    #[test]
    fn test_range_messages() {
        let range = Validator::range(Some(0.0), Some(10.0));
        assert!(range.validate(&Value::Int(0)).is_ok());
        assert!(range.validate(&Value::Int(10)).is_ok());
        assert_eq!(
            range.validate(&Value::Int(11)),
            Err("Must be between 0 and 10.".to_string())
        );
        assert_eq!(
            Validator::range(Some(0.0), None).validate(&Value::Int(-1)),
            Err("Must be at least 0.".to_string())
        );
        assert_eq!(
            Validator::range(None, Some(2.5)).validate(&Value::Float(3.0)),
            Err("Must be at most 2.5.".to_string())
        );
        assert!(range.validate(&Value::from("not a number")).is_ok());
    }

    #[test]
    fn test_regexp_anchors_at_start() {
        let v = Validator::regexp("[a-z]+");
        assert!(v.validate(&Value::from("abc123")).is_ok());
        assert_eq!(
            v.validate(&Value::from("123abc")),
            Err("String does not match expected pattern.".to_string())
        );
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        assert!(!matches_pattern("anything", "(unclosed"));
        assert!(Validator::regexp("(unclosed")
            .validate(&Value::from("x"))
            .is_err());
    }

    #[test]
    fn test_one_of_compares_numbers_by_value() {
        let v = Validator::one_of(vec![Value::Int(1), Value::Int(2)], vec![]);
        assert!(v.validate(&Value::Int(2)).is_ok());
        assert!(v.validate(&Value::Float(1.0)).is_ok());
        assert_eq!(
            v.validate(&Value::Int(3)),
            Err("Not a valid choice.".to_string())
        );
        assert!(v.validate(&Value::from("1")).is_err());
    }

    #[test]
    fn test_email_and_url() {
        assert!(Validator::Email.validate(&Value::from("test@example.com")).is_ok());
        assert!(Validator::Email.validate(&Value::from("invalid")).is_err());
        assert!(Validator::Url.validate(&Value::from("https://example.com/x")).is_ok());
        assert!(Validator::Url.validate(&Value::from("example.com")).is_err());
    }

    #[test]
    fn test_custom_validator() {
        let even = Validator::custom("even", |v| match v.as_i64() {
            Some(i) if i % 2 == 0 => Ok(()),
            _ => Err("Must be even.".to_string()),
        });
        assert!(even.validate(&Value::Int(4)).is_ok());
        assert_eq!(even.validate(&Value::Int(3)), Err("Must be even.".to_string()));
        assert_eq!(format!("{:?}", even), "Custom { name: \"even\" }");
    }
}
