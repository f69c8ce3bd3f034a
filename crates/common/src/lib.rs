//! Common utilities shared across Casting Service crates.

#![warn(clippy::pedantic)]

/// Module for JWT header utilities (size limit, key ID extraction)
pub mod jwt;
