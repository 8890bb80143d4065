//! Settings file loader and serialization.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::Settings;

/// Get the global settings path: ~/.config/aosp-forge/settings.json
pub fn get_global_settings_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    let config_dir = home.join(".config/aosp-forge");
    Ok(config_dir.join("settings.json"))
}

/// Ensure the global settings directory exists
pub fn ensure_settings_dir_exists() -> Result<(), ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    let config_dir = home.join(".config/aosp-forge");
    fs::create_dir_all(&config_dir).map_err(ConfigError::IoError)?;
    Ok(())
}

/// Load settings from a JSON file.
pub fn load_settings_from_file(path: &Path) -> Result<Settings, ConfigError> {
    validate_settings_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!("Settings file not found at: {}", path.display()))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let settings: Settings = serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;
    Ok(settings)
}

/// Save settings to a JSON file with pretty formatting.
pub fn save_settings_to_file(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
        }
    }

    let json_content = serde_json::to_string_pretty(settings).map_err(ConfigError::InvalidJson)?;
    fs::write(path, json_content).map_err(ConfigError::IoError)?;
    Ok(())
}

/// Validate settings path (.json extension required).
pub fn validate_settings_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Settings path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "json" => {}
        Some(ext) => {
            return Err(ConfigError::ValidationFailed(format!(
                "Settings file must have .json extension, got .{}",
                ext.to_string_lossy()
            )))
        }
        None => {
            return Err(ConfigError::ValidationFailed(
                "Settings file must have .json extension".to_string(),
            ))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut original = Settings::default();
        original.backend_url = "http://build-host:9000".to_string();
        original.poll_interval_secs = 5;

        save_settings_to_file(&original, &path).expect("Failed to save settings");
        assert!(path.exists());

        let loaded = load_settings_from_file(&path).expect("Failed to load settings");
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"backend_url":"http://other:8001"}"#).unwrap();

        let loaded = load_settings_from_file(&path).unwrap();
        assert_eq!(loaded.backend_url, "http://other:8001");
        assert_eq!(loaded.poll_interval_secs, Settings::default().poll_interval_secs);
    }

    #[test]
    fn test_validate_settings_path_invalid_extension() {
        assert!(validate_settings_path(Path::new("settings.toml")).is_err());
        assert!(validate_settings_path(Path::new("settings")).is_err());
        assert!(validate_settings_path(Path::new("settings.json")).is_ok());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_settings_from_file(Path::new("/nonexistent/path/settings.json"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.json");

        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"{ invalid json }").unwrap();

        let result = load_settings_from_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidJson(_))));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dirs/settings.json");

        save_settings_to_file(&Settings::default(), &path).expect("Failed to save settings");
        assert!(path.exists());
    }
}
