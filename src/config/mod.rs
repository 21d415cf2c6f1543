//! Configuration management for the Dinlr client.
//!
//! Supports configuration via:
//! - Explicit values through [`DinlrConfigBuilder`]
//! - Environment variables through [`DinlrConfig::from_env`]
//!
//! A configuration authenticates either with an API key or with OAuth client
//! credentials, never both. The choice is fixed when the config is built.

use crate::errors::{ConfigurationError, DinlrResult};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Secure wrapper for a Dinlr API key
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::new(key.into()))
    }

    /// Expose the key for use in requests
    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// OAuth client credentials and any tokens already issued
#[derive(Clone)]
pub struct OAuthCredentials {
    /// Client ID issued by Dinlr
    pub client_id: String,
    pub(crate) client_secret: SecretString,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    pub(crate) access_token: Option<SecretString>,
    pub(crate) refresh_token: Option<SecretString>,
    /// Access token expiry as epoch seconds
    pub expires_at: Option<i64>,
}

impl OAuthCredentials {
    /// Expose the client secret for token requests
    pub(crate) fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("access_token", &self.access_token.is_some())
            .field("refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// How the client authenticates
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Static API key
    ApiKey(ApiKey),
    /// OAuth authorization-code flow
    OAuth(OAuthCredentials),
}

impl AuthMode {
    /// Whether this is an OAuth configuration
    pub fn is_oauth(&self) -> bool {
        matches!(self, AuthMode::OAuth(_))
    }
}

/// Configuration for the Dinlr client
#[derive(Debug, Clone)]
pub struct DinlrConfig {
    /// Authentication mode
    pub auth: AuthMode,
    /// Base URL for API requests
    pub api_url: Url,
    /// Base URL for the authorization page
    pub auth_base_url: Url,
    /// Default restaurant
    pub restaurant_id: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Log requests and responses
    pub debug: bool,
    /// Refresh access tokens this long before they expire
    pub token_refresh_buffer: Duration,
}

impl DinlrConfig {
    /// Create a new configuration builder
    pub fn builder() -> DinlrConfigBuilder {
        DinlrConfigBuilder::new()
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `DINLR_API_KEY` or `DINLR_CLIENT_ID`/`DINLR_CLIENT_SECRET`/
    /// `DINLR_REDIRECT_URI`, plus the optional `DINLR_API_URL`,
    /// `DINLR_AUTH_BASE_URL`, `DINLR_RESTAURANT_ID`, `DINLR_TIMEOUT`,
    /// `DINLR_DEBUG`, `DINLR_ACCESS_TOKEN` and `DINLR_REFRESH_TOKEN`.
    pub fn from_env() -> DinlrResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DinlrResult<Self> {
        let mut builder = DinlrConfigBuilder::new();

        if let Some(key) = lookup("DINLR_API_KEY") {
            builder = builder.api_key(key);
        }

        if let Some(id) = lookup("DINLR_CLIENT_ID") {
            builder = builder.client_id(id);
        }
        if let Some(secret) = lookup("DINLR_CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(uri) = lookup("DINLR_REDIRECT_URI") {
            builder = builder.redirect_uri(uri);
        }

        if let Some(url) = lookup("DINLR_API_URL") {
            builder = builder.api_url(&url)?;
        }
        if let Some(url) = lookup("DINLR_AUTH_BASE_URL") {
            builder = builder.auth_base_url(&url)?;
        }

        if let Some(id) = lookup("DINLR_RESTAURANT_ID") {
            builder = builder.restaurant_id(id);
        }

        if let Some(timeout) = lookup("DINLR_TIMEOUT") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                ConfigurationError::InvalidConfiguration {
                    message: format!("DINLR_TIMEOUT must be a number of seconds, got {:?}", timeout),
                }
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(debug) = lookup("DINLR_DEBUG") {
            builder = builder.debug(matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }

        if let Some(token) = lookup("DINLR_ACCESS_TOKEN") {
            builder = builder.access_token(token);
        }
        if let Some(token) = lookup("DINLR_REFRESH_TOKEN") {
            builder = builder.refresh_token(token);
        }

        builder.build()
    }

    /// OAuth credentials, if configured
    pub fn oauth(&self) -> Option<&OAuthCredentials> {
        match &self.auth {
            AuthMode::OAuth(creds) => Some(creds),
            AuthMode::ApiKey(_) => None,
        }
    }

    /// Build the full URL for an endpoint
    pub fn build_url(&self, endpoint: &str) -> String {
        join_url(&self.api_url, endpoint)
    }
}

pub(crate) fn join_url(base: &Url, endpoint: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    let path = endpoint.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Builder for [`DinlrConfig`]
#[derive(Debug)]
pub struct DinlrConfigBuilder {
    api_key: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    api_url: Url,
    auth_base_url: Url,
    restaurant_id: Option<String>,
    timeout: Duration,
    debug: bool,
    token_refresh_buffer: Duration,
}

impl Default for DinlrConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DinlrConfigBuilder {
    /// Create a new builder with default URLs and timeouts
    pub fn new() -> Self {
        Self {
            api_key: None,
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            access_token: None,
            refresh_token: None,
            expires_at: None,
            api_url: default_url(crate::DEFAULT_API_URL),
            auth_base_url: default_url(crate::DEFAULT_AUTH_BASE_URL),
            restaurant_id: None,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            debug: false,
            token_refresh_buffer: Duration::from_secs(crate::DEFAULT_TOKEN_REFRESH_BUFFER_SECS),
        }
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the OAuth client ID
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Set the OAuth client secret
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set the OAuth redirect URI
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set an access token obtained earlier
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set a refresh token obtained earlier
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Set the access token expiry as epoch seconds
    pub fn expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the API base URL
    pub fn api_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.api_url = parse_url(url)?;
        Ok(self)
    }

    /// Set the authorization base URL
    pub fn auth_base_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.auth_base_url = parse_url(url)?;
        Ok(self)
    }

    /// Set the default restaurant
    pub fn restaurant_id(mut self, id: impl Into<String>) -> Self {
        self.restaurant_id = Some(id.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable request and response logging
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set how early access tokens are refreshed
    pub fn token_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.token_refresh_buffer = buffer;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DinlrResult<DinlrConfig> {
        let has_oauth =
            self.client_id.is_some() || self.client_secret.is_some() || self.redirect_uri.is_some();

        let auth = match (self.api_key, has_oauth) {
            (Some(_), true) => return Err(ConfigurationError::ConflictingCredentials.into()),
            (Some(key), false) => {
                if key.trim().is_empty() {
                    return Err(ConfigurationError::MissingApiKey.into());
                }
                AuthMode::ApiKey(ApiKey::new(key))
            }
            (None, true) => AuthMode::OAuth(OAuthCredentials {
                client_id: self.client_id.ok_or(ConfigurationError::MissingClientId)?,
                client_secret: SecretString::new(
                    self.client_secret.ok_or(ConfigurationError::MissingClientSecret)?,
                ),
                redirect_uri: self.redirect_uri.ok_or(ConfigurationError::MissingRedirectUri)?,
                access_token: self.access_token.map(SecretString::new),
                refresh_token: self.refresh_token.map(SecretString::new),
                expires_at: self.expires_at,
            }),
            (None, false) => return Err(ConfigurationError::MissingCredentials.into()),
        };

        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(DinlrConfig {
            auth,
            api_url: self.api_url,
            auth_base_url: self.auth_base_url,
            restaurant_id: self.restaurant_id.filter(|id| !id.is_empty()),
            timeout: self.timeout,
            debug: self.debug,
            token_refresh_buffer: self.token_refresh_buffer,
        })
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigurationError> {
    Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl {
        message: format!("{}: {}", url, e),
    })
}

fn default_url(url: &str) -> Url {
    Url::parse(url).expect("default URL is valid")
}
