pub mod request_logger;

pub use request_logger::UpstreamLogger;

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber: stdout always, plus `config.file` when set.
/// The returned guard flushes the file writer and must outlive the server.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "saweria_gateway={level},tower_http={level}",
            level = config.level
        )
        .into()
    });

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("LOG_FILE has no file name: {}", path.display()))?;
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
