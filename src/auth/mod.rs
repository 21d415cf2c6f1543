//! OAuth authentication for the Dinlr client.
//!
//! [`OAuthFlow`] talks to the token endpoint and [`TokenManager`] keeps the
//! resulting tokens, refreshing them before they expire.

pub mod oauth;
pub mod token;

pub use oauth::{
    validate_callback, AuthorizationCallback, CallbackParams, OAuthFlow, TokenResponse,
};
pub use token::{TokenManager, TokenState};
