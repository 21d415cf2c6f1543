//! Logging utilities with sensitive data redaction.

use serde_json::Value;
use std::fmt;

/// Replacement written in place of sensitive values
pub const REDACTION_MARKER: &str = "REDACTED";

/// JSON keys whose values never reach a log line
pub const SENSITIVE_KEYS: &[&str] = &[
    "access_token",
    "refresh_token",
    "password",
    "secret",
    "client_secret",
    "key",
    "api_key",
];

const SENSITIVE_QUERY_PARAMS: &[&str] = &["token", "key", "secret", "password", "api_key", "code"];

/// Wrapper for sensitive data that redacts on display
#[derive(Clone)]
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", REDACTION_MARKER)
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", REDACTION_MARKER)
    }
}

/// Return a copy of `value` with every sensitive key replaced, at any depth.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let redacted = if is_sensitive_key(key) {
                        Value::String(REDACTION_MARKER.to_string())
                    } else {
                        redact_json(value)
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        other => other.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|s| key.eq_ignore_ascii_case(s))
}

/// Redact a URL, hiding any credentials in query parameters
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) => {
            let redacted: Vec<String> = query
                .split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((key, _))
                        if SENSITIVE_QUERY_PARAMS
                            .iter()
                            .any(|s| key.eq_ignore_ascii_case(s)) =>
                    {
                        format!("{}=[{}]", key, REDACTION_MARKER)
                    }
                    _ => pair.to_string(),
                })
                .collect();
            format!("{}?{}", base, redacted.join("&"))
        }
        None => url.to_string(),
    }
}

/// Replace control characters with spaces so a value cannot forge log lines
pub fn sanitize_for_log(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_redact_json_at_any_depth() {
        let body = json!({
            "data": {
                "access_token": "abc",
                "customer": {"name": "Jane", "password": "pw"},
                "items": [{"key": "k1", "qty": 2}]
            },
            "secret": "s"
        });

        assert_eq!(
            redact_json(&body),
            json!({
                "data": {
                    "access_token": "REDACTED",
                    "customer": {"name": "Jane", "password": "REDACTED"},
                    "items": [{"key": "REDACTED", "qty": 2}]
                },
                "secret": "REDACTED"
            })
        );
    }

    #[test]
    fn test_redact_json_leaves_partial_matches() {
        let body = json!({"keyboard": "yes", "monkey": 1});
        assert_eq!(redact_json(&body), body);
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://api.dinlr.com/v1/r1/onlineorder/orders?limit=5&api_key=abc"),
            "https://api.dinlr.com/v1/r1/onlineorder/orders?limit=5&api_key=[REDACTED]"
        );
        assert_eq!(redact_url("https://x/y"), "https://x/y");
    }

    #[test]
    fn test_sanitize_for_log() {
        assert_eq!(sanitize_for_log("GET\r\n/orders\tx"), "GET  /orders x");
    }

    #[test]
    fn test_redacted_display() {
        let secret = Redacted::new("abc");
        assert_eq!(format!("{} {:?}", secret, secret), "[REDACTED] [REDACTED]");
    }
}
