//! Middleware for the Casting Service.
//!
//! # Components
//!
//! - `auth` - Authorization gate for protected routes
//! - `http_metrics` - HTTP request metrics middleware

pub mod auth;
pub mod http_metrics;

pub use auth::{require_permission, AuthState, PermissionGuard};
pub use http_metrics::http_metrics_middleware;
