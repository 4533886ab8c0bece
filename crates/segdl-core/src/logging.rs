//! Logging init: stderr plus a log file under the XDG state dir, or stderr
//! alone when the file cannot be opened.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segdl")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir.join("segdl.log"))
}

/// Initialize logging to stderr and `~/.local/state/segdl/segdl.log`.
///
/// `verbose` lowers the default level to `debug`; `RUST_LOG` always wins.
/// Falls back to stderr only if the log file cannot be opened.
pub fn init_logging(verbose: bool) {
    let file = log_file_path().and_then(|path| {
        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((path, file))
    });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match file {
        Ok((path, file)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter(verbose))
                .with(stderr_layer)
                .with(file_layer)
                .init();
            tracing::debug!("segdl logging to {}", path.display());
        }
        Err(err) => {
            tracing_subscriber::registry()
                .with(env_filter(verbose))
                .with(stderr_layer)
                .init();
            tracing::debug!("log file unavailable ({err:#}), logging to stderr only");
        }
    }
}
