//! Configuration file loading for the CLI
//!
//! This module finds and loads the TOML configuration file from the
//! explicit path, the local project directory or the platform configuration
//! directory, and applies command-line overrides on top of it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use kstructural::{
    KStructuralError,
    config::{AppConfig, ExportConfig, ParseConfig},
    export::OutputFormat,
};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for KStructuralError {
    fn from(err: ConfigError) -> Self {
        KStructuralError::Config(err.to_string())
    }
}

/// Settings given on the command line that take precedence over the
/// configuration file.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub format: Option<&'a str>,
    pub base_directory: Option<&'a str>,
    pub keep_imports: bool,
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (kstructural/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be read or parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, KStructuralError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("kstructural/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "io7m", "kstructural") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Apply command-line settings to a loaded configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] for an unknown output format.
pub fn apply_overrides(
    config: AppConfig,
    overrides: &Overrides<'_>,
) -> Result<AppConfig, KStructuralError> {
    let export = config.export();
    let format = match overrides.format {
        Some(format) => format
            .parse::<OutputFormat>()
            .map_err(ConfigError::Validation)?,
        None => export.format(),
    };
    let base_directory = overrides
        .base_directory
        .map(PathBuf::from)
        .or_else(|| config.parse().base_directory().map(Path::to_path_buf));

    debug!(format:% = format, keep_imports = overrides.keep_imports; "Applied command-line settings");
    Ok(AppConfig::new(
        ExportConfig::new(
            format,
            export.indent(),
            export.width(),
            export.keep_imports() || overrides.keep_imports,
        ),
        ParseConfig::new(base_directory),
    ))
}

/// Load configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, KStructuralError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path).map_err(|err| KStructuralError::io(path, err))?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_explicit_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, KStructuralError::Config(message) if message.contains("Missing")));
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[export]\nformat = \"imperative\"\nindent = 4\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.export().format(), OutputFormat::Imperative);
        assert_eq!(config.export().indent(), 4);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[export\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            format: Some("xml"),
            base_directory: Some("/docs"),
            keep_imports: true,
        };
        let config = apply_overrides(AppConfig::default(), &overrides).unwrap();
        assert_eq!(config.export().format(), OutputFormat::Xml);
        assert!(config.export().keep_imports());
        assert_eq!(config.parse().base_directory(), Some(Path::new("/docs")));
    }

    #[test]
    fn test_unknown_format_override() {
        let overrides = Overrides {
            format: Some("latex"),
            ..Overrides::default()
        };
        let err = apply_overrides(AppConfig::default(), &overrides).unwrap_err();
        assert!(err.to_string().contains("Unknown output format"));
    }
}
