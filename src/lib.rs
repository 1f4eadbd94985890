//! School FAQ chat service
//!
//! Answers role-scoped questions from a keyword-matched FAQ table over a
//! small JSON API, and serves the browser chat widget that talks to it.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server (`POST /chat`, stats, static widget)
//! - **FAQ book**: ordered `(role, keywords, answer)` table with hot reload
//! - **Resilience**: global token-bucket rate limit, request timeout, body limit
//!
//! # Modules
//!
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`faq`]: FAQ loading, matching and reload
//! - [`server`]: router, middleware and HTTP handlers
//! - [`security`]: request admission controls
//! - [`telemetry`]: structured logging setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod faq;
pub mod security;
pub mod server;
pub mod telemetry;

use crate::config::AppConfig;
use crate::security::rate_limit::RequestRateLimiter;

use faq::FaqStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Current FAQ table.
    pub faq: FaqStore,
    /// Global Rate Limiter
    pub rate_limiter: Arc<RequestRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, faq: FaqStore) -> Self {
        let rate_limiter = Arc::new(RequestRateLimiter::new(
            config.resilience.requests_per_second,
            config.resilience.burst_size,
        ));
        Self {
            faq,
            rate_limiter,
            config,
        }
    }
}
