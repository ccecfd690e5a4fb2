//! Axum HTTP API server for RFP management.
//!
//! This crate provides:
//! - Firebase ID token verification and profile-backed actor resolution
//! - RFP and response lifecycle services over the `Store` seam
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use auth::{AuthActor, AuthUser, JwksCache, StaticTokenVerifier, TokenVerifier};
pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ProfileService, ResponseService, RfpService};
pub use state::AppState;
