//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::schema::LOG_LEVELS;
use crate::{ConfigError, LoggingConfig, OpenApiConfig};

/// Complete Heron application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.base, "/");
/// assert_eq!(config.default_content_type, "application/json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Prefix for the OpenAPI document endpoints. Controller routes are
    /// bound at their declared paths and do not take this prefix.
    #[serde(default = "default_base")]
    pub base: String,

    /// API version reported in the OpenAPI document.
    #[serde(default = "default_version")]
    pub version: String,

    /// Content type used when neither an endpoint nor its controller
    /// declares one.
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// OpenAPI document endpoints.
    #[serde(default)]
    pub open_api: OpenApiConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for HeronConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            version: default_version(),
            default_content_type: default_content_type(),
            open_api: OpenApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HeronConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `base` does not start with `/`
    /// - `version` is blank
    /// - `default_content_type` is not a `type/subtype` media type
    /// - `logging.level` is not a known level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "base",
                format!("must start with '/': {}", self.base),
            ));
        }

        if self.version.trim().is_empty() {
            return Err(ConfigError::invalid_value("version", "must not be blank"));
        }

        let media_type = self.default_content_type.split(';').next().unwrap_or_default();
        let valid_media_type = media_type
            .split_once('/')
            .is_some_and(|(kind, subtype)| !kind.trim().is_empty() && !subtype.trim().is_empty());
        if !valid_media_type {
            return Err(ConfigError::invalid_value(
                "default_content_type",
                format!("not a media type: {}", self.default_content_type),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug logging in human-readable form.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::HeronConfig;
    ///
    /// let config = HeronConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.json_format = false;
        config
    }

    /// Create a production configuration preset.
    ///
    /// Info logging as JSON lines. Document endpoints require authentication.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::HeronConfig;
    ///
    /// let config = HeronConfig::production();
    /// assert!(config.logging.json_format);
    /// assert!(config.open_api.use_authentication);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.json_format = true;
        config.open_api.use_authentication = true;
        config
    }
}

fn default_base() -> String {
    "/".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_content_type() -> String {
    "application/json".to_string()
}
