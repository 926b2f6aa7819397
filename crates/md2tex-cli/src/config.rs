//! Configuration file support for md2tex CLI
//!
//! Loads settings from `_md2tex.toml` configuration file.

use anyhow::{Context, Result};
use md2tex_core::writer::{DEFAULT_PACKAGES, FigureOptions, Preamble, WriterOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_md2tex.toml";

/// Schema URL for the configuration file
pub const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/md2tex/md2tex/main/crates/md2tex-cli/schema/md2tex.schema.json";

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Output document configuration
    #[serde(skip_serializing_if = "OutputConfig::is_empty")]
    pub output: OutputConfig,
    /// Figure environment configuration for images
    #[serde(skip_serializing_if = "FigureConfig::is_empty")]
    pub figure: FigureConfig,
}

/// Output document configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Wrap the output in a complete LaTeX document (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standalone: Option<bool>,
    /// Document class for standalone output (default: "article")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_class: Option<String>,
    /// Packages loaded by standalone output
    /// (default: ["hyperref", "graphicx", "listings", "amssymb"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    /// Fail on nodes that have no LaTeX rendering instead of dropping them (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl OutputConfig {
    fn is_empty(&self) -> bool {
        self.standalone.is_none()
            && self.document_class.is_none()
            && self.packages.is_none()
            && self.strict.is_none()
    }
}

/// Figure environment configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct FigureConfig {
    #[doc = r"Width passed to \includegraphics (default: 0.8\textwidth)"]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Float placement specifier such as "h" or "htbp" (default: "h")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
}

impl FigureConfig {
    fn is_empty(&self) -> bool {
        self.width.is_none() && self.placement.is_none()
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from a directory (looks for `_md2tex.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Build writer options, with command line switches taking precedence
    ///
    /// The switches can only turn a setting on; an unset switch defers to
    /// the file.
    pub fn writer_options(&self, standalone: bool, strict: bool) -> WriterOptions {
        let standalone = standalone || self.output.standalone.unwrap_or(false);
        let defaults = FigureOptions::default();

        WriterOptions {
            standalone: standalone.then(|| Preamble {
                document_class: self
                    .output
                    .document_class
                    .clone()
                    .unwrap_or_else(|| "article".to_string()),
                packages: self
                    .output
                    .packages
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect()),
            }),
            figure: FigureOptions {
                width: self.figure.width.clone().unwrap_or(defaults.width),
                placement: self.figure.placement.clone().unwrap_or(defaults.placement),
            },
            strict: strict || self.output.strict.unwrap_or(false),
        }
    }

    /// Generate JSON schema for the configuration
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Generate JSON schema as a string
    pub fn json_schema_string() -> Result<String> {
        let schema = Self::json_schema();
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON schema")
    }

    /// Serialize configuration to TOML string with schema directive
    pub fn to_toml_with_schema(&self) -> Result<String> {
        let toml_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        Ok(format!("#:schema {}\n\n{}", SCHEMA_URL, toml_content))
    }

    /// Create a sample configuration with the defaults spelled out, for `md2tex init`
    pub fn sample() -> Self {
        let figure = FigureOptions::default();
        Config {
            output: OutputConfig {
                standalone: Some(false),
                document_class: Some("article".to_string()),
                packages: Some(DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect()),
                strict: Some(false),
            },
            figure: FigureConfig {
                width: Some(figure.width),
                placement: Some(figure.placement),
            },
        }
    }
}
