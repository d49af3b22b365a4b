//! Shared test infrastructure.

pub mod build;
