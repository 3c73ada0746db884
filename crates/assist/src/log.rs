//! File logging, enabled with `--verbose`.
//!
//! Session events, dispatch failures and narrator process errors are logged by `assist_core`;
//! the REPL logs skipped events. Nothing is written to the terminal.
use anyhow::Context;
use assist_core::get_data_dir;
use std::io::LineWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::OffsetTime;

const LOG_FILE: &str = "assist.log";
const MAX_LOG_BYTES: u64 = 100 * 1024;
const LOG_FILTER: &str = "assist=debug,assist_core=debug,rustyline=info";

/// Logs to `<data_dir>/assist.log` at debug level for the client crates.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = rotate_log(&data_dir, MAX_LOG_BYTES).context("Failed to rotate log file")?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(LOG_FILTER)
        .with_writer(Mutex::new(LineWriter::new(log_file)))
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}

/// Keeps one previous log as `assist.log.old` once the current one outgrows `max_bytes`.
///
/// Returns the path to log to.
fn rotate_log(dir: &Path, max_bytes: u64) -> std::io::Result<PathBuf> {
    let log_path = dir.join(LOG_FILE);
    let size = match std::fs::metadata(&log_path) {
        Ok(metadata) => metadata.len(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(log_path),
        Err(err) => return Err(err),
    };

    if size > max_bytes {
        let backup_path = dir.join(format!("{LOG_FILE}.old"));
        if backup_path.exists() {
            std::fs::remove_file(&backup_path)?;
        }
        std::fs::rename(&log_path, backup_path)?;
    }
    Ok(log_path)
}
