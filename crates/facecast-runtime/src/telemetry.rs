//! Logging setup

use tracing_subscriber::EnvFilter;

use facecast_core::{FacecastError, FacecastResult};

use crate::{LogFormat, NodeConfig};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Fails if a subscriber is already
/// installed or the filter does not parse.
pub fn init_logging(format: LogFormat, default_filter: &str) -> FacecastResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| FacecastError::Config(format!("log filter '{}': {}", default_filter, e)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| FacecastError::Config(format!("logging already initialised: {}", e)))
}

/// `init_logging` with the node's configured format and filter
pub fn init_from_config(config: &NodeConfig) -> FacecastResult<()> {
    init_logging(config.log_format, &config.log_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // The first call may race other tests; only the second is certain
        let _ = init_logging(LogFormat::Pretty, "warn");
        assert!(init_logging(LogFormat::Json, "warn").is_err());
    }
}
