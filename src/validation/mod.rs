//! Request parameter validation.
//!
//! Parameter maps are plain JSON objects. Helpers here check presence,
//! length and numeric bounds, and [`validate_and_sanitize`] applies a
//! [`RuleSet`] to produce a sanitized copy of a map.

use crate::errors::ValidationError;
use crate::security::{sanitize_email, sanitize_identifier, sanitize_string};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// Request parameters
pub type Params = Map<String, Value>;

/// Longest numeric string accepted by [`validate_numeric`]
pub const MAX_NUMERIC_STRING_LEN: usize = 20;

/// Largest page size accepted by the API
pub const MAX_PAGE_LIMIT: f64 = 200.0;

/// Page sizes above this are allowed but logged
pub const LARGE_PAGE_LIMIT: f64 = 100.0;

/// Highest page number accepted
pub const MAX_PAGE: f64 = 10_000.0;

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?\s*$")
        .expect("numeric pattern is a valid regex")
});

/// Check that every field in `fields` is present, non-null and non-empty.
///
/// All missing fields are reported together.
pub fn validate_required(params: &Params, fields: &[&str]) -> Result<(), ValidationError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| is_missing(params.get(**field)))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields { fields: missing })
    }
}

pub(crate) fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Whether `params` carries `field` with a non-null value
pub(crate) fn is_present(params: &Params, field: &str) -> bool {
    !matches!(params.get(field), None | Some(Value::Null))
}

/// Sanitize a string and check its length in characters.
///
/// Returns the sanitized value, which callers must use in place of the input.
pub fn validate_string(
    value: &str,
    field: &str,
    max_length: Option<usize>,
    min_length: usize,
) -> Result<String, ValidationError> {
    let sanitized = sanitize_string(value, field)?;
    let len = sanitized.chars().count();

    if len < min_length {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: min_length,
        });
    }

    if let Some(max) = max_length {
        if len > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
            });
        }
    }

    Ok(sanitized)
}

/// [`validate_string`] for a JSON value, which must be a string.
pub fn string_value(
    value: &Value,
    field: &str,
    max_length: Option<usize>,
    min_length: usize,
) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => validate_string(s, field, max_length, min_length),
        _ => Err(ValidationError::InvalidType {
            field: field.to_string(),
            expected: "string",
        }),
    }
}

/// Validate a number or numeric string and return it as `f64`.
pub fn validate_numeric(
    value: &Value,
    field: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<f64, ValidationError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NUMERIC.is_match(s) => {
            if s.len() > MAX_NUMERIC_STRING_LEN {
                return Err(ValidationError::NumericTooLarge {
                    field: field.to_string(),
                });
            }
            s.trim().parse::<f64>().ok()
        }
        _ => None,
    }
    .ok_or_else(|| ValidationError::NotNumeric {
        field: field.to_string(),
    })?;

    if !number.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if let Some(min) = min {
        if number < min {
            return Err(ValidationError::BelowMinimum {
                field: field.to_string(),
                min,
            });
        }
    }

    if let Some(max) = max {
        if number > max {
            return Err(ValidationError::AboveMaximum {
                field: field.to_string(),
                max,
            });
        }
    }

    Ok(number)
}

/// Check `limit` and `page` when present.
pub fn validate_pagination(params: &Params) -> Result<(), ValidationError> {
    if let Some(limit) = params.get("limit").filter(|v| !v.is_null()) {
        let limit = validate_numeric(limit, "limit", Some(1.0), Some(MAX_PAGE_LIMIT))?;
        if limit > LARGE_PAGE_LIMIT {
            warn!(limit, "Large pagination limit requested");
        }
    }

    if let Some(page) = params.get("page").filter(|v| !v.is_null()) {
        validate_numeric(page, "page", Some(1.0), Some(MAX_PAGE))?;
    }

    Ok(())
}

/// Type of a [`ValidationRule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    /// Free-form text
    String,
    /// Email address
    Email,
    /// Bare identifier
    Identifier,
    /// Number or numeric string
    Numeric,
}

/// Validation rule for one field
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    /// Rule type
    pub rule_type: RuleType,
    /// Maximum length for strings
    pub max_length: Option<usize>,
    /// Minimum for numerics
    pub min: Option<f64>,
    /// Maximum for numerics
    pub max: Option<f64>,
    /// Whether the field must be present
    pub required: bool,
}

impl ValidationRule {
    fn of(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            max_length: None,
            min: None,
            max: None,
            required: false,
        }
    }

    /// String rule
    pub fn string() -> Self {
        Self::of(RuleType::String)
    }

    /// Email rule
    pub fn email() -> Self {
        Self::of(RuleType::Email)
    }

    /// Identifier rule
    pub fn identifier() -> Self {
        Self::of(RuleType::Identifier)
    }

    /// Numeric rule
    pub fn numeric() -> Self {
        Self::of(RuleType::Numeric)
    }

    /// Set the maximum string length
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set the inclusive numeric minimum
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the inclusive numeric maximum
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn apply(&self, value: &Value, field: &str) -> Result<Value, ValidationError> {
        let sanitized = match self.rule_type {
            RuleType::Numeric => {
                validate_numeric(value, field, self.min, self.max)?;
                return Ok(value.clone());
            }
            RuleType::String => string_value(value, field, self.max_length, 1)?,
            RuleType::Email | RuleType::Identifier => {
                let text = value.as_str().ok_or_else(|| ValidationError::InvalidType {
                    field: field.to_string(),
                    expected: "string",
                })?;
                if self.rule_type == RuleType::Email {
                    sanitize_email(text, field)?
                } else {
                    sanitize_identifier(text, field)?
                }
            }
        };

        Ok(Value::String(sanitized))
    }
}

/// Ordered set of field rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<(String, ValidationRule)>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `field`
    pub fn field(mut self, field: impl Into<String>, rule: ValidationRule) -> Self {
        self.rules.push((field.into(), rule));
        self
    }

    /// Iterate over the rules in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationRule)> {
        self.rules.iter().map(|(field, rule)| (field.as_str(), rule))
    }
}

/// Apply `rules` to `data` and return a sanitized copy.
///
/// Fields without a rule are copied unchanged. `data` itself is never
/// modified.
pub fn validate_and_sanitize(data: &Params, rules: &RuleSet) -> Result<Params, ValidationError> {
    let mut out = data.clone();

    for (field, rule) in rules.iter() {
        match data.get(field).filter(|v| !v.is_null()) {
            Some(value) => {
                let sanitized = rule.apply(value, field)?;
                out.insert(field.to_string(), sanitized);
            }
            None if rule.required => {
                return Err(ValidationError::MissingFields {
                    fields: vec![field.to_string()],
                });
            }
            None => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_required_reports_every_missing_field() {
        let p = params(json!({"customer": "", "amount": null, "notes": "x"}));
        let err = validate_required(&p, &["customer", "amount", "notes", "location"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                fields: vec!["customer".into(), "amount".into(), "location".into()]
            }
        );
    }

    #[test]
    fn test_required_accepts_zero_and_false() {
        let p = params(json!({"points": 0, "flag": false}));
        assert!(validate_required(&p, &["points", "flag"]).is_ok());
    }

    #[test]
    fn test_string_length_uses_sanitized_characters() {
        assert_eq!(validate_string("  héllo  ", "name", Some(5), 1).unwrap(), "héllo");

        let err = validate_string("   ", "name", None, 1).unwrap_err();
        assert_eq!(err.to_string(), "name must be at least 1 characters long");

        let err = validate_string("abcdef", "name", Some(5), 1).unwrap_err();
        assert_eq!(err.to_string(), "name cannot exceed 5 characters");
    }

    #[test]
    fn test_string_value_rejects_non_strings() {
        let err = string_value(&json!(123), "member", None, 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidType {
                field: "member".into(),
                expected: "string"
            }
        );
    }

    #[test_case(json!(5), 5.0 ; "integer")]
    #[test_case(json!(2.5), 2.5 ; "float")]
    #[test_case(json!("42"), 42.0 ; "numeric string")]
    #[test_case(json!(" -1.5e2 "), -150.0 ; "exponent string")]
    fn test_numeric_accepts(value: Value, expected: f64) {
        assert_eq!(validate_numeric(&value, "n", None, None).unwrap(), expected);
    }

    #[test_case(json!("abc") ; "letters")]
    #[test_case(json!("inf") ; "infinity word")]
    #[test_case(json!(true) ; "boolean")]
    #[test_case(json!(null) ; "null")]
    #[test_case(json!([1]) ; "array")]
    fn test_numeric_rejects(value: Value) {
        let err = validate_numeric(&value, "amount", None, None).unwrap_err();
        assert_eq!(err.to_string(), "amount must be a numeric value");
    }

    #[test]
    fn test_numeric_guards() {
        let err = validate_numeric(&json!("123456789012345678901"), "n", None, None).unwrap_err();
        assert!(matches!(err, ValidationError::NumericTooLarge { .. }));

        let err = validate_numeric(&json!("1e999"), "n", None, None).unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite { .. }));

        let err = validate_numeric(&json!(0), "amount", Some(0.01), None).unwrap_err();
        assert_eq!(err.to_string(), "amount must be at least 0.01");

        let err = validate_numeric(&json!(11), "n", None, Some(10.0)).unwrap_err();
        assert_eq!(err.to_string(), "n cannot exceed 10");
    }

    #[test_case(json!({"limit": 200}), true ; "max limit")]
    #[test_case(json!({"limit": 150, "page": 10000}), true ; "large limit warns only")]
    #[test_case(json!({"limit": 201}), false ; "limit too high")]
    #[test_case(json!({"limit": 0}), false ; "limit zero")]
    #[test_case(json!({"page": 0}), false ; "page zero")]
    #[test_case(json!({"page": 10001}), false ; "page too high")]
    #[test_case(json!({"limit": "abc"}), false ; "non numeric limit")]
    #[test_case(json!({}), true ; "no pagination")]
    fn test_pagination(value: Value, ok: bool) {
        assert_eq!(validate_pagination(&params(value)).is_ok(), ok);
    }

    #[test]
    fn test_validate_and_sanitize_returns_copy() {
        let data = params(json!({
            "first_name": "  Jane ",
            "email": " jane@example.com",
            "points": "10",
            "untouched": " keep "
        }));
        let rules = RuleSet::new()
            .field("first_name", ValidationRule::string().max_length(50).required())
            .field("email", ValidationRule::email().required())
            .field("points", ValidationRule::numeric().min(1.0))
            .field("phone", ValidationRule::string().max_length(20));

        let out = validate_and_sanitize(&data, &rules).unwrap();

        assert_eq!(
            Value::Object(out),
            json!({
                "first_name": "Jane",
                "email": "jane@example.com",
                "points": "10",
                "untouched": " keep "
            })
        );
        assert_eq!(data["first_name"], json!("  Jane "));
    }

    #[test]
    fn test_validate_and_sanitize_required_field() {
        let rules = RuleSet::new().field("member", ValidationRule::string().required());

        let err = validate_and_sanitize(&Params::new(), &rules).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameters: member");

        let err = validate_and_sanitize(&params(json!({"member": 123})), &rules).unwrap_err();
        assert_eq!(err.field(), Some("member"));
    }

    #[test]
    fn test_identifier_rule() {
        let rules = RuleSet::new().field("location", ValidationRule::identifier());
        let err = validate_and_sanitize(&params(json!({"location": "a b"})), &rules).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { .. }));
    }
}
