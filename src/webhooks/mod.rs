//! Webhook signature verification.
//!
//! Dinlr signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac>`, where the HMAC-SHA256 covers
//! `"<t>.<raw body>"` keyed by the app's signing secret.

use crate::auth::token::now_secs;
use crate::errors::WebhookError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Default allowed clock skew between the signer and the verifier, in seconds
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Verifies signed webhook deliveries.
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance: u64,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    /// Creates a new webhook verifier with the given signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            tolerance: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Set the allowed timestamp skew in seconds.
    pub fn with_tolerance(mut self, tolerance: u64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check `header` against `payload` using the current time.
    ///
    /// Returns `Ok(false)` for a well-formed header whose signature does not
    /// match. Malformed headers and stale timestamps are errors.
    pub fn validate_signature(&self, payload: &str, header: &str) -> Result<bool, WebhookError> {
        self.validate_signature_at(payload, header, now_secs())
    }

    /// [`validate_signature`](Self::validate_signature) against a given clock
    pub fn validate_signature_at(
        &self,
        payload: &str,
        header: &str,
        now: i64,
    ) -> Result<bool, WebhookError> {
        let elements = parse_header(header);

        let (timestamp, signature) = match (elements.get("t"), elements.get("v1")) {
            (Some(t), Some(v1)) => (
                t.parse::<i64>().map_err(|_| WebhookError::BadHeaderFormat)?,
                *v1,
            ),
            _ => return Err(WebhookError::BadHeaderFormat),
        };

        if now.abs_diff(timestamp) > self.tolerance {
            return Err(WebhookError::Expired { timestamp });
        }

        let expected = self.compute(timestamp, payload)?;
        Ok(constant_time_eq::constant_time_eq(
            expected.as_bytes(),
            signature.as_bytes(),
        ))
    }

    /// Verify a delivery and parse its body.
    pub fn construct_event(&self, payload: &str, header: &str) -> Result<WebhookEvent, WebhookError> {
        if !self.validate_signature(payload, header)? {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_str(payload).map_err(|e| WebhookError::MalformedJson {
            message: e.to_string(),
        })
    }

    /// Build the signature header for `payload` at `timestamp`.
    pub fn sign(&self, payload: &str, timestamp: i64) -> Result<String, WebhookError> {
        Ok(format!("t={},v1={}", timestamp, self.compute(timestamp, payload)?))
    }

    fn compute(&self, timestamp: i64, payload: &str) -> Result<String, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn parse_header(header: &str) -> HashMap<&str, &str> {
    header
        .split(',')
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

/// Webhook delivery body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID
    pub id: Option<String>,
    /// Object kind, e.g. `order`
    pub object: Option<String>,
    /// Topic, e.g. `order.created`
    pub topic: Option<String>,
    /// Restaurant ID
    pub restaurant: Option<String>,
    /// Location ID
    pub location: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Affected record
    #[serde(default)]
    pub data: Value,
}

impl WebhookEvent {
    /// Whether the event concerns an order
    pub fn is_order_event(&self) -> bool {
        self.object.as_deref() == Some("order")
    }

    /// Whether the event concerns a customer
    pub fn is_customer_event(&self) -> bool {
        self.object.as_deref() == Some("customer")
    }

    /// Whether the topic is a creation
    pub fn is_create_event(&self) -> bool {
        self.topic_contains(".created")
    }

    /// Whether the topic is an update
    pub fn is_update_event(&self) -> bool {
        self.topic_contains(".updated")
    }

    /// Whether the topic is a deletion
    pub fn is_delete_event(&self) -> bool {
        self.topic_contains(".deleted")
    }

    fn topic_contains(&self, needle: &str) -> bool {
        self.topic.as_deref().is_some_and(|t| t.contains(needle))
    }
}
