//! User settings file. Optional; CLI flags always win.

use std::path::PathBuf;

use crate::domain::models::Settings;

/// Load `~/.config/bindrig/config.toml`. A missing file (or an unset HOME)
/// yields the defaults; a malformed file is an error.
pub fn load_settings() -> anyhow::Result<Settings> {
    let Ok(home) = std::env::var("HOME") else {
        return Ok(Settings::default());
    };
    let path = PathBuf::from(home).join(".config/bindrig/config.toml");
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}
