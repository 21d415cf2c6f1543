//! Input sanitization and date validation.

pub mod dates;
pub mod sanitizer;

pub use dates::{
    validate_api_date_range, validate_date, validate_date_range, validate_date_with_format,
    validate_datetime,
};
pub use sanitizer::{
    contains_suspicious_patterns, sanitize_email, sanitize_identifier, sanitize_string,
};
