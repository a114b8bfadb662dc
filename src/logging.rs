//! File logging for hosts embedding the engine
//!
//! An IDE owns stdout/stderr, so logs go to a file through a non-blocking
//! writer. Keep the returned guard alive for as long as logs should flush.

use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Install a global fmt subscriber writing to `dir/file_name`.
///
/// If a global subscriber is already installed it is left in place; the
/// guard is still returned so the caller's handling stays the same.
pub fn init_file_logging(dir: &Path, file_name: &str) -> Result<WorkerGuard> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(
            app = crate::constants::APP_NAME,
            version = crate::constants::APP_VERSION,
            "Logging initialized"
        );
    }

    Ok(guard)
}
