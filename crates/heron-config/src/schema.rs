//! Configuration section types.

use serde::{Deserialize, Serialize};

/// OpenAPI document endpoints.
///
/// When enabled, the document is served at `{base}/open-api.json`,
/// `{base}/open-api.yml`, `{base}/swagger.json` and `{base}/swagger.yml`.
///
/// # Example
///
/// ```
/// use heron_config::OpenApiConfig;
///
/// let config = OpenApiConfig::default();
/// assert!(config.enabled);
/// assert!(!config.use_authentication);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OpenApiConfig {
    /// Serve the document endpoints.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Run the authentication chain before serving the document.
    #[serde(default)]
    pub use_authentication: bool,

    /// Document title. Defaults to `API`.
    #[serde(default)]
    pub title: Option<String>,

    /// Document description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_authentication: false,
            title: None,
            description: None,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level filter (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

pub(crate) const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
