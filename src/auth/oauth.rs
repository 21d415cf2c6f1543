//! OAuth authorization-code flow against the Dinlr backoffice.

use crate::config::{join_url, OAuthCredentials};
use crate::errors::{AuthError, ConfigurationError, DinlrResult};
use crate::security::sanitize_identifier;
use crate::transport::{HttpRequest, HttpTransport};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::form_urlencoded;
use url::Url;

/// Token endpoint response
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,
    /// Token type
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,
    /// Any other fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// Query parameters delivered to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// Restaurant that granted access
    pub restaurant_id: Option<String>,
    /// State echoed back
    pub state: Option<String>,
    /// Error code, when access was denied
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse callback parameters from a redirect URL
    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    /// Parse callback parameters from a raw query string
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(query.trim_start_matches('?').as_bytes()))
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => params.code = value,
                "restaurant_id" => params.restaurant_id = value,
                "state" => params.state = value,
                "error" => params.error = value,
                _ => {}
            }
        }
        params
    }
}

impl From<&HashMap<String, String>> for CallbackParams {
    fn from(map: &HashMap<String, String>) -> Self {
        Self {
            code: map.get("code").cloned(),
            restaurant_id: map.get("restaurant_id").cloned(),
            state: map.get("state").cloned(),
            error: map.get("error").cloned(),
        }
    }
}

/// Validated callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    /// Authorization code to exchange
    pub code: String,
    /// Restaurant that granted access
    pub restaurant_id: String,
}

/// Check a callback against the state that was sent.
///
/// A denial is reported before anything else, then missing parameters,
/// then a state mismatch.
pub fn validate_callback(
    params: &CallbackParams,
    expected_state: &str,
) -> Result<AuthorizationCallback, AuthError> {
    if let Some(error) = &params.error {
        return Err(AuthError::Denied {
            error: error.clone(),
        });
    }

    let (code, restaurant_id, state) = match (&params.code, &params.restaurant_id, &params.state) {
        (Some(code), Some(restaurant_id), Some(state)) => (code, restaurant_id, state),
        _ => return Err(AuthError::MissingParams),
    };

    if state != expected_state {
        return Err(AuthError::StateMismatch);
    }

    Ok(AuthorizationCallback {
        code: code.clone(),
        restaurant_id: restaurant_id.clone(),
    })
}

#[derive(Debug, Clone, Copy)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    fn as_str(self) -> &'static str {
        match self {
            Grant::AuthorizationCode => "authorization_code",
            Grant::RefreshToken => "refresh_token",
        }
    }

    fn failure(self, status: Option<u16>, message: String) -> AuthError {
        match self {
            Grant::AuthorizationCode => AuthError::TokenExchangeFailed { status, message },
            Grant::RefreshToken => AuthError::TokenRefreshFailed { status, message },
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Grant::AuthorizationCode => "Failed to obtain access token",
            Grant::RefreshToken => "Failed to refresh access token",
        }
    }
}

/// OAuth flow handler
#[derive(Clone)]
pub struct OAuthFlow {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    api_url: Url,
    auth_base_url: Url,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_url", &self.api_url.as_str())
            .field("auth_base_url", &self.auth_base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl OAuthFlow {
    /// Create a flow from configured credentials
    pub fn new(
        credentials: &OAuthCredentials,
        api_url: Url,
        auth_base_url: Url,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: SecretString::new(credentials.client_secret().to_string()),
            redirect_uri: credentials.redirect_uri.clone(),
            api_url,
            auth_base_url,
            transport,
        }
    }

    /// URL of the consent page for `state`
    pub fn authorization_url(&self, state: &str) -> DinlrResult<String> {
        let mut url = Url::parse(&join_url(&self.auth_base_url, "oauth/authorize")).map_err(|e| {
            ConfigurationError::InvalidUrl {
                message: e.to_string(),
            }
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", state);

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, restaurant_id: &str) -> DinlrResult<TokenResponse> {
        self.token_request(Grant::AuthorizationCode, ("code", code), restaurant_id)
            .await
    }

    /// Obtain a new access token with a refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str, restaurant_id: &str) -> DinlrResult<TokenResponse> {
        self.token_request(
            Grant::RefreshToken,
            ("refresh_token", refresh_token),
            restaurant_id,
        )
        .await
    }

    async fn token_request(
        &self,
        grant: Grant,
        credential: (&str, &str),
        restaurant_id: &str,
    ) -> DinlrResult<TokenResponse> {
        let restaurant_id = sanitize_identifier(restaurant_id, "restaurant_id")?;
        let endpoint = format!("{}/oauth/token", restaurant_id);
        let url = Url::parse(&join_url(&self.api_url, &endpoint)).map_err(|e| {
            ConfigurationError::InvalidUrl {
                message: e.to_string(),
            }
        })?;

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair(credential.0, credential.1)
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", self.client_secret.expose_secret())
            .append_pair("grant_type", grant.as_str())
            .finish();

        let mut request = HttpRequest::new(Method::POST, url);
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        request.body = Some(body.into());

        debug!(grant = grant.as_str(), "Requesting OAuth token");

        let response = self.transport.send(request).await?;
        let data: Value = serde_json::from_slice(&response.body).unwrap_or(Value::Null);

        let failure = |data: &Value| {
            let message = data
                .get("error_description")
                .or_else(|| data.get("message"))
                .and_then(Value::as_str)
                .unwrap_or(grant.default_message())
                .to_string();
            grant.failure(Some(response.status), message)
        };

        if response.status >= 400 || data.get("access_token").and_then(Value::as_str).is_none() {
            return Err(failure(&data).into());
        }

        serde_json::from_value(data.clone()).map_err(|_| failure(&data).into())
    }
}
