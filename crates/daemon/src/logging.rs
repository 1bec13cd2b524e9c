//! Logging setup (tracing-subscriber)

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber
///
/// `RUST_LOG` overrides the default `portprobe=info` filter. Keep the returned
/// guard alive for the whole process, or buffered lines are lost on exit.
pub fn init(format: LogFormat) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("portprobe=info"))?;

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init()?,
    }

    Ok(guard)
}
