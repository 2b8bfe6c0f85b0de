//! Platform-specific default locations.

use brinson::{BrinsonConfig, BrinsonError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the default configuration directory.
///
/// Uses platform-specific config directories:
/// - Linux: `~/.config/brinson/`
/// - macOS: `~/Library/Application Support/brinson/`
/// - Windows: `%APPDATA%\brinson\`
pub(crate) fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brinson")
}

/// Get the default configuration file path.
pub(crate) fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load the configuration.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and built-in defaults otherwise.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<BrinsonConfig, BrinsonError> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return BrinsonConfig::from_file(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "loading default config");
        BrinsonConfig::from_file(&path)
    } else {
        Ok(BrinsonConfig::default())
    }
}
