//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the language models behind
//! the planning, search and synthesis collaborators. Provider-specific code
//! sits behind the [`LLMClient`] trait.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection
//! - [`ProviderRegistry`] - Resolves `[models.*]` names from `research.toml`
//! - [`retry::RetryingClient`] - Bounded retry for transient failures
//! - [`structured`] - JSON extraction for structured responses
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server (default)
//! - `openai` - OpenAI API and compatible endpoints

/// Core LLM client trait and provider selection.
pub mod client;
/// Registry for managing multiple LLM provider instances.
pub mod provider_registry;
/// Retry wrapper for transient provider failures.
pub mod retry;
/// JSON extraction from model responses.
pub mod structured;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, ModelParams, Provider};
pub use provider_registry::ProviderRegistry;
