//! Settings loader for .ncmon/config.toml

use super::types::Settings;
use ncmon_core::prelude::*;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.toml";
pub const NCMON_DIR: &str = ".ncmon";

/// Default config location under `base_dir`.
pub fn config_path(base_dir: &Path) -> PathBuf {
    base_dir.join(NCMON_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `<base_dir>/.ncmon/config.toml`.
///
/// A missing or unreadable file yields defaults.
pub fn load_settings(base_dir: &Path) -> Settings {
    let path = config_path(base_dir);
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Settings::default();
    }
    load_settings_or_default(&path)
}

/// Load settings from an explicit path given on the command line.
///
/// Unlike the implicit location, a path the user named must exist and parse.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config_invalid(format!("Failed to read {:?}: {}", path, e)))?;
    let settings: Settings = toml::from_str(&content)
        .map_err(|e| Error::config_invalid(format!("Failed to parse {:?}: {}", path, e)))?;
    validate(&settings)?;
    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

fn load_settings_or_default(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<Settings>(&content) {
            Ok(settings) => match validate(&settings) {
                Ok(()) => {
                    debug!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Settings::default()
                }
            },
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Settings::default()
        }
    }
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.serial.baud_rate == 0 {
        return Err(Error::config_invalid("serial.baud_rate must be positive"));
    }
    if settings.window.size == 0 {
        return Err(Error::config_invalid("window.size must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(temp.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(NCMON_DIR);
        std::fs::create_dir_all(&dir).unwrap();

        let config = r#"
[window]
size = 250

[render]
interval_ms = 50

[sync]
histogram_bins = 10
"#;
        std::fs::write(dir.join(CONFIG_FILENAME), config).unwrap();

        let settings = load_settings(temp.path());
        assert_eq!(settings.window.size, 250);
        assert_eq!(settings.render.interval_ms, 50);
        assert_eq!(settings.sync.histogram_bins, 10);
        assert_eq!(settings.serial.baud_rate, 921_600);
    }

    #[test]
    fn test_load_settings_invalid_toml_falls_back() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(NCMON_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILENAME), "not valid toml {{{{").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_load_settings_zero_window_falls_back() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(NCMON_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILENAME), "[window]\nsize = 0\n").unwrap();

        assert_eq!(load_settings(temp.path()).window.size, 1000);
    }

    #[test]
    fn test_load_settings_from_explicit_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lab.toml");
        std::fs::write(&path, "[serial]\nbaud_rate = 115200\n").unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.serial.baud_rate, 115_200);
    }

    #[test]
    fn test_load_settings_from_missing_path_is_error() {
        let temp = tempdir().unwrap();
        let err = load_settings_from(&temp.path().join("nope.toml")).unwrap_err();
        assert!(err.is_fatal());
    }
}
