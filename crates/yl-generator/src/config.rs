//! Generator configuration and environment loading.

use std::collections::HashMap;
use std::path::Path;

use yl_core::RetryPolicy;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("request file error: {0}")]
    RequestFile(String),
}

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratorConfig {
    /// Attempt budgets and backoff.
    pub policy: RetryPolicy,
}

impl GeneratorConfig {
    /// More transport attempts for flaky networks.
    #[must_use]
    pub fn patient() -> Self {
        Self {
            policy: RetryPolicy::patient(),
        }
    }
}

/// Load a dotenv file into the process environment.
///
/// Variables that are already set are not overridden. Returns `false` if the
/// file does not exist.
pub fn load_dotenv(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path)?;
    Ok(true)
}

/// Read a dotenv file into a map without touching the environment.
pub fn dotenv_values(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        values.insert(key, value);
    }
    Ok(values)
}
