//! Token storage and refresh.

use super::oauth::{OAuthFlow, TokenResponse};
use crate::errors::{AuthError, ConfigurationError, DinlrError, DinlrResult};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Current epoch seconds
pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// OAuth tokens held by a client
#[derive(Clone, Default)]
pub struct TokenState {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    expires_at: Option<i64>,
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &self.has_access_token())
            .field("refresh_token", &self.has_refresh_token())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TokenState {
    /// Create a token state
    pub fn new(
        access_token: Option<String>,
        refresh_token: Option<String>,
        expires_at: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.map(SecretString::new),
            refresh_token: refresh_token.map(SecretString::new),
            expires_at,
        }
    }

    /// Whether an access token is held
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether a refresh token is held
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Access token, if any
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Refresh token, if any
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Access token expiry as epoch seconds
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Whether the access token expires within `buffer` of `now`.
    ///
    /// A token without a known expiry never counts as expired.
    pub fn is_expired_at(&self, now: i64, buffer: Duration) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => now + buffer.as_secs() as i64 >= expires_at,
            _ => false,
        }
    }

    /// [`is_expired_at`](Self::is_expired_at) against the current time
    pub fn is_expired(&self, buffer: Duration) -> bool {
        self.is_expired_at(now_secs(), buffer)
    }

    /// Whether a pre-dispatch refresh is due
    pub fn needs_refresh(&self, now: i64, buffer: Duration) -> bool {
        self.has_refresh_token() && self.is_expired_at(now, buffer)
    }

    /// Replace the access token, keeping the refresh token
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(SecretString::new(token.into()));
    }

    /// Apply a token endpoint response received at `now`
    pub fn apply(&mut self, response: &TokenResponse, now: i64) {
        self.access_token = Some(SecretString::new(response.access_token.clone()));
        if let Some(refresh_token) = &response.refresh_token {
            self.refresh_token = Some(SecretString::new(refresh_token.clone()));
        }
        if let Some(expires_in) = response.expires_in {
            self.expires_at = Some(now + expires_in);
        }
    }
}

/// Serializes access to a [`TokenState`] and its refresh.
///
/// The lock is held across the refresh request, so concurrent callers that
/// find the token expiring wait for a single refresh and reuse its result.
#[derive(Debug)]
pub struct TokenManager {
    state: Mutex<TokenState>,
    buffer: Duration,
}

impl TokenManager {
    /// Create a manager seeded with `initial`
    pub fn new(initial: TokenState, buffer: Duration) -> Self {
        Self {
            state: Mutex::new(initial),
            buffer,
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    /// Replace the access token
    pub async fn set_access_token(&self, token: impl Into<String>) {
        self.state.lock().await.set_access_token(token);
    }

    /// Store a token endpoint response
    pub async fn store(&self, response: &TokenResponse) {
        self.state.lock().await.apply(response, now_secs());
    }

    /// Return the access token to send, refreshing it first when due.
    ///
    /// Without a refresh token an expiring access token is returned as is.
    /// A failed refresh leaves the state untouched.
    pub async fn ensure_fresh(
        &self,
        flow: &OAuthFlow,
        restaurant_id: Option<&str>,
    ) -> DinlrResult<Option<String>> {
        let mut state = self.state.lock().await;

        if state.needs_refresh(now_secs(), self.buffer) {
            let restaurant_id = restaurant_id.ok_or(ConfigurationError::MissingRestaurantId)?;
            let refresh_token = state.refresh_token().unwrap_or_default().to_string();

            debug!("Access token expiring, refreshing before dispatch");
            let response = flow
                .refresh(&refresh_token, restaurant_id)
                .await
                .map_err(refresh_failure)?;
            state.apply(&response, now_secs());
        } else if state.is_expired_at(now_secs(), self.buffer) {
            warn!("Access token is expiring and no refresh token is available");
        }

        Ok(state.access_token().map(str::to_string))
    }

    /// Refresh unconditionally
    pub async fn refresh(
        &self,
        flow: &OAuthFlow,
        restaurant_id: Option<&str>,
    ) -> DinlrResult<TokenResponse> {
        let mut state = self.state.lock().await;

        let refresh_token = state
            .refresh_token()
            .ok_or(ConfigurationError::MissingRefreshToken)?
            .to_string();
        let restaurant_id = restaurant_id.ok_or(ConfigurationError::MissingRestaurantId)?;

        let response = flow
            .refresh(&refresh_token, restaurant_id)
            .await
            .map_err(refresh_failure)?;
        state.apply(&response, now_secs());
        Ok(response)
    }
}

/// Report a refresh that never got a token response as an auth error.
///
/// Input and configuration errors pass through unchanged.
fn refresh_failure(err: DinlrError) -> DinlrError {
    match err {
        DinlrError::Network(_) | DinlrError::Response(_) => AuthError::TokenRefreshFailed {
            status: None,
            message: format!("Failed to refresh access token: {}", err),
        }
        .into(),
        other => other,
    }
}
