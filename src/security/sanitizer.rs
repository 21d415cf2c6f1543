//! String sanitization and suspicious-pattern detection.
//!
//! Every string that leaves the caller's hands passes through
//! [`sanitize_string`] before it is placed in a query, a body or a path.

use crate::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Inputs at or above this many characters are rejected outright.
pub const MAX_INPUT_CHARS: usize = 1000;

static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // SQL keyword followed by whitespace
        r"(?i)\b(union|select|insert|delete|update|drop)\s",
        // quote or statement terminator followed by an inline comment
        r#"['";][^-]*--"#,
        // script injection
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)on\w+\s*=",
        // path traversal
        r"\.\.[/\\]",
        // shell metacharacters
        r"[;&|`$]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("suspicious pattern is a valid regex"))
    .collect()
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern is a valid regex"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Sanitize a free-form string.
///
/// Control characters (NUL included) are dropped and surrounding whitespace
/// trimmed. The result is then checked against the denylist before being
/// normalized to NFC.
///
/// # Errors
///
/// [`ValidationError::SuspiciousInput`] when a denylisted pattern matches.
pub fn sanitize_string(input: &str, field: &str) -> Result<String, ValidationError> {
    let stripped: String = input.chars().filter(|c| !c.is_control()).collect();
    let trimmed = stripped.trim();

    if contains_suspicious_patterns(trimmed) {
        return Err(ValidationError::SuspiciousInput {
            field: field.to_string(),
        });
    }

    Ok(trimmed.nfc().collect())
}

/// Sanitize a value that must be a bare identifier (`[A-Za-z0-9_-]+`).
pub fn sanitize_identifier(input: &str, field: &str) -> Result<String, ValidationError> {
    let sanitized = sanitize_string(input, field)?;

    if !IDENTIFIER.is_match(&sanitized) {
        return Err(ValidationError::InvalidIdentifier {
            field: field.to_string(),
        });
    }

    Ok(sanitized)
}

/// Sanitize an email address and check its shape.
pub fn sanitize_email(input: &str, field: &str) -> Result<String, ValidationError> {
    let sanitized = sanitize_string(input, field)?;

    if !EMAIL.is_match(&sanitized) {
        return Err(ValidationError::InvalidEmail {
            field: field.to_string(),
        });
    }

    Ok(sanitized)
}

/// Whether `input` matches any denylisted pattern.
pub fn contains_suspicious_patterns(input: &str) -> bool {
    if input.chars().count() >= MAX_INPUT_CHARS {
        return true;
    }

    SUSPICIOUS_PATTERNS.iter().any(|re| re.is_match(input))
}
