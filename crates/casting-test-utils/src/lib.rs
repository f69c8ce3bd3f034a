//! # Casting Test Utilities
//!
//! Shared test utilities for the Casting Service.
//!
//! This crate provides:
//! - Deterministic RSA fixtures (fixed keys for reproducible tokens)
//! - Test claim builders (`TestTokenBuilder`)
//! - Server test harness (`TestCastingServer` with a mocked JWKS endpoint)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use casting_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestCastingServer::spawn().await?;
//!     let token = server.token_with_permissions(&["get:actors"]);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/actors", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
