//! Properties-file configuration.
//!
//! Plain `key=value` lines; `#` and `!` start comments; unknown keys are
//! kept without complaint. The loaded value is passed explicitly down the
//! call graph — there is no process-global configuration, so a later load
//! with a different path cannot be silently ignored.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.properties";

/// Recognized configuration keys
pub mod keys {
    pub const LLM_ENDPOINT: &str = "llm.endpoint";
    pub const LLM_API_KEY: &str = "llm.api-key";
    pub const LLM_SYSTEM_ROLE: &str = "llm.system-role";
    pub const LLM_USER_ROLE: &str = "llm.user-role";
    pub const LLM_SYSTEM_MESSAGE: &str = "llm.system-message";
    pub const LLM_TIMEOUT_SECS: &str = "llm.timeout-secs";
    pub const LLM_PROGRESS_SECS: &str = "llm.progress-secs";
    pub const PROMPT_START: &str = "prompt.start";
    pub const PROMPT_END: &str = "prompt.end";
    pub const SLICER_PATH: &str = "slicer.path";
    pub const CHECKER_COMMAND: &str = "checker.command";
    pub const CHECKER_JAR: &str = "checker.jar";
    pub const CHECKER_CLASSPATH: &str = "checker.classpath";
    pub const CHECKER_PROCESSOR: &str = "checker.processor";
    pub const FIXTURE_RESPONSE_FILE: &str = "fixture.response-file";
    pub const DRIVER_MAX_ITERATIONS: &str = "driver.max-iterations";
    pub const BATCH_ABORT_ON_FAILURE: &str = "batch.abort-on-failure";
}

/// Read-only configuration loaded from a properties file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load a properties file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    /// Load an explicit file, or the default file if present, or an empty
    /// configuration when neither exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Fetch a key that the current operation cannot do without.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .with_context(|| format!("missing required configuration key `{key}`"))
    }

    /// Parse an optional numeric key.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("configuration key `{key}` is not a number: {raw}"))
            })
            .transpose()
    }

    /// Parse an optional boolean key (`true`/`false`).
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<bool>()
                    .with_context(|| format!("configuration key `{key}` is not a boolean: {raw}"))
            })
            .transpose()
    }
}

// ============================================================================
// Tests
// ============================================================================
