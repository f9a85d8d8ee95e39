//! API key loading.
//!
//! The key is supplied out-of-band: a plain text file named in
//! [`LlmConfig::api_key_file`](super::LlmConfig), with the `ANTHROPIC_API_KEY`
//! environment variable as a fallback when that file is absent.  The key is
//! never logged and never written to any output file.

use std::path::Path;

use thiserror::Error;

/// Environment variable consulted when the key file does not exist.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// CredentialError
// ---------------------------------------------------------------------------

/// Errors that can occur while loading the API key.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Neither the key file nor the environment variable is available.
    #[error("API key file {path} not found and ANTHROPIC_API_KEY is not set")]
    NotFound { path: String },

    /// The key file exists but could not be read.
    #[error("cannot read API key file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The key file exists but contains nothing but whitespace.
    #[error("API key file {path} is empty")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// load_api_key
// ---------------------------------------------------------------------------

/// Load the API key from `path`, falling back to [`API_KEY_ENV`].
///
/// Surrounding whitespace (including the trailing newline most editors add)
/// is trimmed.  An existing-but-empty file is an error rather than a silent
/// fallback, so a truncated key file is caught before the first request.
pub fn load_api_key(path: &Path) -> Result<String, CredentialError> {
    if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let key = raw.trim();
        if key.is_empty() {
            return Err(CredentialError::Empty {
                path: path.display().to_string(),
            });
        }
        return Ok(key.to_string());
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(CredentialError::NotFound {
            path: path.display().to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
