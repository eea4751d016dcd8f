use std::path::PathBuf;

use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_ENV: &str = "APPLIFY_LOG";
const DEFAULT_FILTER: &str = "applify=debug";

/// Keeps the background log writer alive; logs are flushed when dropped.
pub struct Guard(#[allow(dead_code)] WorkerGuard);

pub fn log_dir(configured: Option<PathBuf>) -> PathBuf {
    configured.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("applify")
            .join("logs")
    })
}

pub fn init_tracing(dir: PathBuf, verbose: bool) -> anyhow::Result<Guard> {
    std::fs::create_dir_all(&dir)?;
    let append = tracing_appender::rolling::daily(&dir, "applify-prompt.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(append);

    let filter =
        || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file = fmt::layer()
        .with_timer(fmt::time::uptime())
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(filter());
    let stderr = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter())
    });

    tracing_subscriber::registry().with(file).with(stderr).try_init()?;

    debug!(path = %dir.display(), "Logging initialized");
    Ok(Guard(guard))
}
