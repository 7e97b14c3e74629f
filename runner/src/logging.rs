use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::DeployError;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Logs go to stderr; stdout is reserved for the deployment report.
pub fn init_logging(level: &str) -> Result<(), DeployError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| DeployError::Config(format!("invalid log level `{level}`: {e}")))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| DeployError::Config(format!("failed to initialize logging: {e}")))
}
