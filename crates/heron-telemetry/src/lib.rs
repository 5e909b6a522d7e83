//! Structured logging for Heron applications.
//!
//! Library crates log through `tracing`; applications install a subscriber
//! once at startup with [`init_logging`]:
//!
//! | Level | Used for |
//! |-------|----------|
//! | `debug` | registration, route binding, client errors |
//! | `info` | application startup |
//! | `warn` | unresolvable interceptor bindings |
//! | `error` | server errors |
//!
//! Each dispatch runs inside a span carrying the endpoint identity and the
//! request id.

#![doc(html_root_url = "https://docs.rs/heron-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
