//! Well-known apkpush locations on the host.

use dirs::home_dir;
use std::path::PathBuf;

/// Returns the apkpush home directory, or None if the user's home cannot be resolved.
///
/// `APKPUSH_HOME` overrides the default `~/.apkpush`.
pub fn try_apkpush_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("APKPUSH_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".apkpush"))
}

/// Config file path: ~/.apkpush/config.toml
pub fn config_path() -> Option<PathBuf> {
    try_apkpush_home().map(|h| h.join("config.toml"))
}

/// Default backup directory: ~/.apkpush/backups
///
/// Falls back to the system temp dir when no home can be resolved.
pub fn default_backup_dir() -> PathBuf {
    try_apkpush_home().map_or_else(
        || std::env::temp_dir().join("apkpush-backups"),
        |h| h.join("backups"),
    )
}
