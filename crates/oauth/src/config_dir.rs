use std::path::PathBuf;

/// `~/.config/genolink/`, or `./.genolink` when no home directory is known.
pub fn genolink_config_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".config").join("genolink"))
        .unwrap_or_else(|| PathBuf::from(".genolink"))
}
