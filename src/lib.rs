//! Dinlr API Client
//!
//! Client for the Dinlr restaurant POS API with:
//! - Typed services for catalog, customers, loyalty, store credit, orders,
//!   carts, reservations and inventory
//! - API key or OAuth authentication with single-flight token refresh
//! - Input sanitization and validation before any request is sent
//! - Webhook signature verification
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dinlr_client::{DinlrClient, DinlrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DinlrConfig::builder()
//!         .api_key("your-api-key")
//!         .restaurant_id("your-restaurant-id")
//!         .build()?;
//!     let client = DinlrClient::new(config)?;
//!
//!     for location in client.locations().list(None).await? {
//!         println!("{}", location.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `rustls` (default) - TLS through rustls
//! - `native-tls` - TLS through the platform library

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;
pub mod types;

// Services
pub mod services;

// Input handling
pub mod security;
pub mod validation;

// Webhooks
pub mod webhooks;

// Observability
pub mod observability;

// Testing utilities
pub mod fixtures;
pub mod mocks;

// Re-exports for convenience
pub use client::DinlrClient;
pub use config::{AuthMode, DinlrConfig, DinlrConfigBuilder};
pub use errors::{DinlrError, DinlrResult, ErrorKind};
pub use validation::Params;
pub use webhooks::{WebhookEvent, WebhookVerifier};

/// Default base URL for the Dinlr API
pub const DEFAULT_API_URL: &str = "https://api.dinlr.com/v1";

/// Default base URL for the OAuth authorize page
pub const DEFAULT_AUTH_BASE_URL: &str = "https://backoffice.dinlr.com";

/// Default timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Seconds before expiry at which an OAuth token is refreshed
pub const DEFAULT_TOKEN_REFRESH_BUFFER_SECS: u64 = 300;

/// `User-Agent` sent with every request
pub const USER_AGENT: &str = concat!("dinlr-client/", env!("CARGO_PKG_VERSION"));

/// Create a Dinlr client with the given configuration
pub fn create_client(config: DinlrConfig) -> DinlrResult<DinlrClient> {
    DinlrClient::new(config)
}

/// Create a Dinlr client from environment variables
///
/// Reads:
/// - `DINLR_API_KEY` - API key
/// - `DINLR_CLIENT_ID`, `DINLR_CLIENT_SECRET`, `DINLR_REDIRECT_URI` - OAuth app
/// - `DINLR_ACCESS_TOKEN`, `DINLR_REFRESH_TOKEN` - stored OAuth tokens
/// - `DINLR_RESTAURANT_ID` - default restaurant
/// - `DINLR_API_URL`, `DINLR_AUTH_BASE_URL` - endpoint overrides
/// - `DINLR_TIMEOUT` - timeout in seconds
/// - `DINLR_DEBUG` - request logging
pub fn create_client_from_env() -> DinlrResult<DinlrClient> {
    let config = DinlrConfig::from_env()?;
    create_client(config)
}
