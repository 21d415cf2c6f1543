//! Error types for the Dinlr client.
//!
//! Every failure surfaces as a [`DinlrError`] whose variant tells the caller
//! which layer rejected the call: local configuration, local input
//! validation, the network, the API itself, the OAuth flow, or webhook
//! verification.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for Dinlr operations
pub type DinlrResult<T> = Result<T, DinlrError>;

/// Root error type for the Dinlr client
#[derive(Error, Debug)]
pub enum DinlrError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Error reported by the API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// OAuth error
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Webhook verification error
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Response decoding error
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),
}

/// Coarse classification of a [`DinlrError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required configuration is missing or invalid
    Config,
    /// Caller-supplied input failed a local rule
    Validation,
    /// Network, timeout or connection failure
    Transport,
    /// The API answered with an error status
    Api,
    /// OAuth-specific failure
    Auth,
    /// Inbound webhook failed verification
    Webhook,
    /// A successful response could not be decoded
    Response,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::Api => "api",
            ErrorKind::Auth => "auth",
            ErrorKind::Webhook => "webhook",
            ErrorKind::Response => "response",
        };
        f.write_str(name)
    }
}

impl DinlrError {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Transport,
            Self::Api(_) => ErrorKind::Api,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Webhook(_) => ErrorKind::Webhook,
            Self::Response(_) => ErrorKind::Response,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "DINLR_CONFIG",
            Self::Validation(_) => "DINLR_VALIDATION",
            Self::Network(_) => "DINLR_NETWORK",
            Self::Api(_) => "DINLR_API",
            Self::Auth(_) => "DINLR_AUTH",
            Self::Webhook(_) => "DINLR_WEBHOOK",
            Self::Response(_) => "DINLR_RESPONSE",
        }
    }

    /// Check if retrying the call could succeed.
    ///
    /// Advisory only: the client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(NetworkError::Timeout { .. })
            | Self::Network(NetworkError::ConnectionFailed { .. }) => true,
            Self::Api(err) => err.is_rate_limited() || err.status >= 500,
            _ => false,
        }
    }

    /// Get HTTP status code if applicable
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::Auth(AuthError::TokenExchangeFailed { status, .. })
            | Self::Auth(AuthError::TokenRefreshFailed { status, .. }) => *status,
            _ => None,
        }
    }

    /// Borrow the validation error, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Borrow the API error, if this is one
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Neither an API key nor OAuth credentials were supplied
    #[error("An API key or OAuth client credentials are required")]
    MissingCredentials,

    /// Both an API key and OAuth credentials were supplied
    #[error("Configure either an API key or OAuth client credentials, not both")]
    ConflictingCredentials,

    /// Missing API key
    #[error("API key is not set")]
    MissingApiKey,

    /// Missing OAuth client ID
    #[error("Client ID is not set")]
    MissingClientId,

    /// Missing OAuth client secret
    #[error("Client secret is not set")]
    MissingClientSecret,

    /// Missing OAuth redirect URI
    #[error("Redirect URI is not set")]
    MissingRedirectUri,

    /// Missing restaurant ID
    #[error("Restaurant ID is not set")]
    MissingRestaurantId,

    /// Missing refresh token
    #[error("Refresh token is not set")]
    MissingRefreshToken,

    /// An OAuth operation was invoked on an API-key client
    #[error("OAuth credentials are not configured for this client")]
    OAuthNotConfigured,

    /// Invalid URL
    #[error("Invalid URL: {message}")]
    InvalidUrl {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Bound violated by an out-of-range date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Earlier than 1900-01-01
    BeforeMinimum,
    /// Later than 100 years from now
    AfterMaximum,
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::BeforeMinimum => f.write_str("cannot be before 1900-01-01"),
            DateBound::AfterMaximum => f.write_str("cannot be more than 100 years in the future"),
        }
    }
}

/// Input validation errors.
///
/// Always raised before any network I/O.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Input matched a denylisted pattern
    #[error("Invalid characters detected in {field}")]
    SuspiciousInput {
        /// Offending field
        field: String,
    },

    /// Identifier contains characters outside `[A-Za-z0-9_-]`
    #[error("{field} can only contain letters, numbers, hyphens, and underscores")]
    InvalidIdentifier {
        /// Offending field
        field: String,
    },

    /// Email address is malformed
    #[error("Invalid {field} format")]
    InvalidEmail {
        /// Offending field
        field: String,
    },

    /// Date did not round-trip through the expected format
    #[error("{field} must be in {expected} format")]
    BadDateFormat {
        /// Offending field
        field: String,
        /// Human readable format
        expected: String,
    },

    /// Date outside the accepted window
    #[error("{field} {bound}")]
    DateOutOfRange {
        /// Offending field
        field: String,
        /// Violated bound
        bound: DateBound,
    },

    /// Range start is not before its end
    #[error("{prefix} start date must be before end date")]
    RangeOrder {
        /// Range label
        prefix: String,
    },

    /// Range spans too many days
    #[error("{prefix} range cannot exceed {max_days} days")]
    RangeTooLong {
        /// Range label
        prefix: String,
        /// Allowed span
        max_days: i64,
    },

    /// One or more required fields are absent or empty
    #[error("Missing required parameters: {}", .fields.join(", "))]
    MissingFields {
        /// Every missing field
        fields: Vec<String>,
    },

    /// String shorter than allowed
    #[error("{field} must be at least {min} characters long")]
    TooShort {
        /// Offending field
        field: String,
        /// Minimum length
        min: usize,
    },

    /// String longer than allowed
    #[error("{field} cannot exceed {max} characters")]
    TooLong {
        /// Offending field
        field: String,
        /// Maximum length
        max: usize,
    },

    /// Value is not numeric
    #[error("{field} must be a numeric value")]
    NotNumeric {
        /// Offending field
        field: String,
    },

    /// Numeric string is too long to be trusted
    #[error("{field} numeric value too large")]
    NumericTooLarge {
        /// Offending field
        field: String,
    },

    /// Value is NaN or infinite
    #[error("{field} must be a finite number")]
    NotFinite {
        /// Offending field
        field: String,
    },

    /// Value below the inclusive minimum
    #[error("{field} must be at least {min}")]
    BelowMinimum {
        /// Offending field
        field: String,
        /// Minimum
        min: f64,
    },

    /// Value above the inclusive maximum
    #[error("{field} cannot exceed {max}")]
    AboveMaximum {
        /// Offending field
        field: String,
        /// Maximum
        max: f64,
    },

    /// Value has the wrong JSON type
    #[error("{field} must be a {expected} value")]
    InvalidType {
        /// Offending field
        field: String,
        /// Expected type
        expected: &'static str,
    },

    /// Value violates a resource-specific rule
    #[error("{message}")]
    InvalidValue {
        /// Offending field
        field: String,
        /// Error message
        message: String,
    },
}

impl ValidationError {
    /// Every field this error refers to
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingFields { fields } => fields.iter().map(String::as_str).collect(),
            Self::RangeOrder { prefix } | Self::RangeTooLong { prefix, .. } => vec![prefix.as_str()],
            Self::SuspiciousInput { field }
            | Self::InvalidIdentifier { field }
            | Self::InvalidEmail { field }
            | Self::BadDateFormat { field, .. }
            | Self::DateOutOfRange { field, .. }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::NotNumeric { field }
            | Self::NumericTooLarge { field }
            | Self::NotFinite { field }
            | Self::BelowMinimum { field, .. }
            | Self::AboveMaximum { field, .. }
            | Self::InvalidType { field, .. }
            | Self::InvalidValue { field, .. } => vec![field.as_str()],
        }
    }

    /// The first field this error refers to
    pub fn field(&self) -> Option<&str> {
        self.fields().into_iter().next()
    }

    pub(crate) fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Request timeout
    #[error("Request timed out after {timeout:?}")]
    Timeout {
        /// Configured timeout
        timeout: Duration,
    },

    /// Connection failed
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Any other transport failure
    #[error("Request failed: {message}")]
    Request {
        /// Error message
        message: String,
    },
}

impl NetworkError {
    /// Classify a reqwest error, attaching the configured timeout
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout { timeout }
        } else if err.is_connect() {
            NetworkError::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            NetworkError::Request {
                message: err.to_string(),
            }
        }
    }
}

/// Request context attached to an [`ApiError`]
#[derive(Debug, Clone, PartialEq)]
pub struct ApiErrorContext {
    /// Endpoint path
    pub endpoint: String,
    /// HTTP method
    pub method: String,
    /// Decoded response body
    pub response: Value,
}

/// Error status reported by the API
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Error message
    pub message: String,
    /// Request context for diagnostics
    pub context: Option<ApiErrorContext>,
}

impl ApiError {
    /// Create an API error without request context
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            context: None,
        }
    }

    /// Create a 404 error for an entity missing from a list response
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// Attach request context
    pub fn with_context(mut self, context: ApiErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether the API reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Whether the API rejected the call for rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// OAuth errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Provider reported a denial in the callback
    #[error("Authorization was denied: {error}")]
    Denied {
        /// Provider error code
        error: String,
    },

    /// Callback lacks code, restaurant_id or state
    #[error("Invalid callback: missing required parameters")]
    MissingParams,

    /// Callback state differs from the one sent
    #[error("Invalid state parameter")]
    StateMismatch,

    /// Code exchange failed
    #[error("{message}")]
    TokenExchangeFailed {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Provider message
        message: String,
    },

    /// Token refresh failed
    #[error("{message}")]
    TokenRefreshFailed {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Provider message
        message: String,
    },
}

/// Webhook verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// Signature header is not `t=...,v1=...`
    #[error("Invalid signature header format")]
    BadHeaderFormat,

    /// Timestamp outside the tolerance window
    #[error("Webhook timestamp is outside the tolerance zone")]
    Expired {
        /// Timestamp carried by the header
        timestamp: i64,
    },

    /// Signature mismatch
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Payload is not valid JSON
    #[error("Invalid JSON payload: {message}")]
    MalformedJson {
        /// Parser message
        message: String,
    },
}

/// Response decoding errors
#[derive(Error, Debug)]
pub enum ResponseError {
    /// JSON deserialization error
    #[error("Deserialization error: {message}")]
    Deserialization {
        /// Error message
        message: String,
    },
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        ResponseError::Deserialization {
            message: err.to_string(),
        }
    }
}
