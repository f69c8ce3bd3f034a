//! Casting Service Library
//!
//! HTTP API over two record types, actors and movies, protected by bearer
//! JWTs issued by an external identity provider. Every protected route
//! requires one exact permission string from the token's `permissions`
//! claim.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Bearer extraction, key set cache, JWT verification, permissions
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authorization gate and HTTP metrics
//! - `models` - Records, responses and body validation
//! - `observability` - Prometheus metrics
//! - `repositories` - Store trait with PostgreSQL and in-memory backends
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
