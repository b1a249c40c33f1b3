//! Configuration types for kstructural.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every field has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining export and parse settings.
//! - [`ExportConfig`] - Output format, layout and import handling.
//! - [`ParseConfig`] - Where imports and includes may be read from.
//!
//! # Example
//!
//! ```
//! # use kstructural::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.export().width(), 80);
//! assert!(config.parse().base_directory().is_none());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::export::{Layout, OutputFormat};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Export configuration section.
    #[serde(default)]
    export: ExportConfig,

    /// Parse configuration section.
    #[serde(default)]
    parse: ParseConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(export: ExportConfig, parse: ParseConfig) -> Self {
        Self { export, parse }
    }

    /// Returns the export configuration.
    pub fn export(&self) -> &ExportConfig {
        &self.export
    }

    /// Returns the parse configuration.
    pub fn parse(&self) -> &ParseConfig {
        &self.parse
    }
}

/// Settings for the exporters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when none is given on the command line.
    format: OutputFormat,

    /// Spaces per nesting level.
    indent: usize,

    /// Preferred maximum line width.
    width: usize,

    /// Write imported blocks and included texts as separate files.
    keep_imports: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            format: OutputFormat::default(),
            indent: layout.indent(),
            width: layout.width(),
            keep_imports: false,
        }
    }
}

impl ExportConfig {
    pub fn new(format: OutputFormat, indent: usize, width: usize, keep_imports: bool) -> Self {
        Self {
            format,
            indent,
            width,
            keep_imports,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn keep_imports(&self) -> bool {
        self.keep_imports
    }

    /// The [`Layout`] described by `indent` and `width`.
    pub fn layout(&self) -> Layout {
        Layout::new(self.indent, self.width)
    }
}

/// Settings for parsing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ParseConfig {
    /// Directory that imports and includes must stay inside. Defaults to the
    /// directory of the input file.
    #[serde(default)]
    base_directory: Option<PathBuf>,
}

impl ParseConfig {
    pub fn new(base_directory: Option<PathBuf>) -> Self {
        Self { base_directory }
    }

    pub fn base_directory(&self) -> Option<&Path> {
        self.base_directory.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.export().format(), OutputFormat::Canonical);
        assert_eq!(config.export().layout(), Layout::default());
        assert!(!config.export().keep_imports());
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [export]
            format = "xml"
            width = 100

            [parse]
            base_directory = "/srv/docs"
            "#,
        )
        .unwrap();
        assert_eq!(config.export().format(), OutputFormat::Xml);
        assert_eq!(config.export().width(), 100);
        assert_eq!(config.export().indent(), 2);
        assert_eq!(
            config.parse().base_directory(),
            Some(Path::new("/srv/docs"))
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[export]\nformat = \"latex\"\n");
        assert!(result.is_err());
    }
}
