//! Configuration loading from TOML files.

mod limiter;
mod logging;
mod pool;
mod settings;
mod source;
mod transport;

pub use limiter::{RateLimitAlgorithm, RateLimiterConfig};
pub use logging::LoggingConfig;
pub use pool::PoolConfig;
pub use settings::Config;
pub use source::{SourceConfig, NAME_PLACEHOLDER};
pub use transport::TransportConfig;

use crate::error::ConfigError;

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
