//! Configuration file location
//!
//! - Linux/macOS: XDG Base Directory specification (~/.config)
//! - Windows: Known Folder API (AppData\Roaming)

use std::path::PathBuf;

pub const CONFIG_ENV: &str = "RELEASE_SYNC_CONFIG";

/// Get the configuration directory path
///
/// Falls back to:
/// - Unix (Linux/macOS): XDG_CONFIG_HOME/release-sync or ~/.config/release-sync
/// - Windows: %APPDATA%\release-sync\config
pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        use directories::ProjectDirs;
        ProjectDirs::from("", "", "release-sync")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".").join(".config").join("release-sync"))
    }
    #[cfg(not(windows))]
    {
        use directories::BaseDirs;
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                BaseDirs::new()
                    .map(|dirs| dirs.home_dir().join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config"))
            })
            .join("release-sync")
    }
}

/// Config file to read when none is given explicitly
///
/// `RELEASE_SYNC_CONFIG` wins over the platform config directory.
pub fn default_config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_dir().join("config.yaml"))
}
