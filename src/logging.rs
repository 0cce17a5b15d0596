use anyhow::{Context, Result};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn build_filter(verbosity: &Verbosity<InfoLevel>, rust_log: Option<&str>) -> Result<EnvFilter> {
    let rust_log = rust_log.unwrap_or_default();
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .parse_lossy(rust_log);
    if rust_log.contains("nusb") {
        Ok(filter)
    } else {
        Ok(filter.add_directive("nusb=warn".parse()?))
    }
}

/// Install the stderr subscriber, plus a plain-text file layer when `log_file` is set.
///
/// `-v` shows every transfer in hex. `nusb` itself stays at warn unless `RUST_LOG` names it.
/// Hold the returned guard until exit so the file writer flushes.
pub fn setup_logging(log_file: Option<PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(verbosity, std::env::var("RUST_LOG").ok().as_deref())?;

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = match log_file {
        Some(ref path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    if let Some(path) = log_file {
        tracing::info!("Logging to file: {:?}", path);
    }
    Ok(guard)
}
