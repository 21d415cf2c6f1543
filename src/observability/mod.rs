//! Observability helpers for the Dinlr client.
//!
//! The library emits `tracing` events only and never installs a subscriber.

pub mod logging;

pub use logging::*;
