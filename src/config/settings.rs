//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FailureMode
// ---------------------------------------------------------------------------

/// How the pipeline reacts when a model call fails for a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FailureMode {
    /// Stop the run and propagate the gateway error (fail loud).
    Abort,
    /// Record stub entries for the failed batch and move on to the next one.
    /// Intended for unattended long runs where losing one batch is cheaper
    /// than losing the whole night.
    StubAndContinue,
}

impl Default for FailureMode {
    fn default() -> Self {
        Self::Abort
    }
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Column mapping for the input title catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Header name of the stable record-identifier column.
    pub id_column: String,
    /// Header name of the Tibetan title text column.  The text is passed to
    /// the model unchanged, so either Wylie transliteration or native script
    /// works — whatever the catalog contains.
    pub title_column: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            id_column: "book_id".into(),
            title_column: "tibetan_title".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Settings that shape one annotation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of titles sent to the model in one request.
    pub batch_size: usize,
    /// Maximum number of catalog rows processed in one run.
    pub record_limit: usize,
    /// Write intermediate result files every this many processed records.
    pub checkpoint_interval: usize,
    /// Minimum pause between model calls, to respect external rate limits.
    pub inter_batch_delay_secs: u64,
    /// Whole-batch failure policy for gateway errors.
    pub failure_mode: FailureMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            record_limit: 10,
            checkpoint_interval: 100,
            inter_batch_delay_secs: 1,
            failure_mode: FailureMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject values that would make the run loop misbehave.
    ///
    /// `batch_size` and `checkpoint_interval` must both be at least 1;
    /// everything else has no invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.checkpoint_interval == 0 {
            bail!("checkpoint_interval must be at least 1");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the remote model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the messages endpoint (no trailing slash).
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Upper bound on reply length in tokens.
    pub max_tokens: u32,
    /// Sampling temperature.  0.0 keeps the linguistic analysis deterministic
    /// enough to diff between runs.
    pub temperature: f32,
    /// Maximum seconds to wait for a model response before timing out.
    pub timeout_secs: u64,
    /// Path to the file holding the API key.  The `ANTHROPIC_API_KEY`
    /// environment variable is used as a fallback when the file is absent.
    pub api_key_file: String,
    /// Optional replacement for the built-in instruction template.  Must
    /// contain the `{count}` and `{titles}` placeholders.
    pub prompt_template: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            model: "claude-3-5-sonnet-20241022".into(),
            max_tokens: 4096,
            temperature: 0.0,
            timeout_secs: 60,
            api_key_file: "api-key.txt".into(),
            prompt_template: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as a TOML file next to the catalog.
///
/// # Persistence
///
/// ```rust,no_run
/// use tibetan_titles::config::AppConfig;
///
/// // Load (returns Default when the file is missing)
/// let config = AppConfig::load_from("tibetan-titles.toml".as_ref()).unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input catalog column mapping.
    pub source: SourceConfig,
    /// Batch / checkpoint / pacing settings.
    pub pipeline: PipelineConfig,
    /// Remote model settings.
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            pipeline: PipelineConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet so
    /// callers never need to special-case a missing file.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
