//! Observability module for the Casting Service.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
