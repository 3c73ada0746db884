//! Where the client keeps its files.
//!
//! `assist.yml` lives in the config dir and `assist.log` in the data dir. Both honour the XDG
//! variables when set, which tests rely on.
use once_cell::sync::Lazy;
use std::path::PathBuf;

const APP_DIR: &str = "assist";

static DEFAULT_DATA_DIR: Lazy<PathBuf> =
    Lazy::new(|| platform_dir(dirs::data_local_dir(), "~/.local/share"));

static DEFAULT_CONFIG_DIR: Lazy<PathBuf> =
    Lazy::new(|| platform_dir(dirs::config_dir(), "~/.config"));

fn platform_dir(base: Option<PathBuf>, fallback: &str) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(fallback)).join(APP_DIR)
}

fn app_dir(xdg_var: &str, default: &Lazy<PathBuf>) -> PathBuf {
    match std::env::var_os(xdg_var) {
        Some(base) if !base.is_empty() => PathBuf::from(base).join(APP_DIR),
        _ => PathBuf::clone(default),
    }
}

/// Directory holding `assist.yml`. Not created here; config loading does that.
pub fn get_config_dir() -> PathBuf {
    app_dir("XDG_CONFIG_HOME", &DEFAULT_CONFIG_DIR)
}

/// Directory for the log file, created on demand.
pub fn get_data_dir() -> std::io::Result<PathBuf> {
    let path = app_dir("XDG_DATA_HOME", &DEFAULT_DATA_DIR);
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// Config written on first run: local endpoint, 18ms reveal, narration off.
pub fn get_default_config() -> String {
    include_str!("../data/config.yml").to_string()
}
