//! Configuration utilities
//!
//! - [`toml_config`] - `research.toml` loading and validation

/// TOML configuration for the pipeline, providers and collaborators.
pub mod toml_config;
