use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    config::{LogFormat, LogLevel},
    errors::Result,
};

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr, stdout is reserved
/// for command output
pub(crate) fn init(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level.as_directive())?,
    };

    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .try_init()?;

    Ok(())
}
