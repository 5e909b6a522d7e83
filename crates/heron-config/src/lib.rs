//! Typed configuration for Heron applications.
//!
//! - TOML and JSON configuration files
//! - `.env` files through `dotenvy`
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("heron.toml")?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! println!("documents served under {}", config.base);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! base = "/api"
//! version = "1.2"
//! default_content_type = "application/json"
//!
//! [open_api]
//! enabled = true
//! use_authentication = false
//! title = "Orders API"
//!
//! [logging]
//! level = "info"
//! json_format = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `HERON__BASE=/api`
//! - `HERON__OPEN_API__USE_AUTHENTICATION=true`
//! - `HERON__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/heron-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HeronConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingConfig, OpenApiConfig};
