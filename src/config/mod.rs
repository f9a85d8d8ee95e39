//! Configuration module for the title annotation pipeline.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! API key loading, and TOML persistence via `AppConfig::load_from` /
//! `AppConfig::save_to`.

pub mod credentials;
pub mod settings;

pub use credentials::{load_api_key, CredentialError, API_KEY_ENV};
pub use settings::{AppConfig, FailureMode, LlmConfig, PipelineConfig, SourceConfig};
