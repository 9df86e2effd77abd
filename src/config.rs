//! Configuration management for the generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (codegen.toml)
//! - Environment variables (SWAGGER_CODEGEN__*)
//!
//! ## Example config file (codegen.toml):
//! ```toml
//! [source]
//! document = "./api-docs.json"
//!
//! [output]
//! dir = "./dist"
//! format = "pretty"
//! view = true
//!
//! [codegen]
//! methods = ["get", "post"]
//! model_namespace = "models"
//!
//! [codegen.naming]
//! tag_index = 1
//! api_cut = [0]
//! base_url = "/mall-api"
//!
//! [codegen.filter]
//! paths = ["/user"]
//! exclude_paths = ["/internal"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codegen::CodegenConfig;
use crate::error::Result;

/// Environment prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "SWAGGER_CODEGEN";

/// Main configuration for the generator binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Where the document comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// Where results go
    #[serde(default)]
    pub output: OutputConfig,

    /// Resolution settings
    #[serde(default)]
    pub codegen: CodegenConfig,
}

/// Source document settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local Swagger 2.0 JSON file
    #[serde(default)]
    pub document: Option<PathBuf>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the IR (and view) files are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Output format (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,

    /// Also write the template view data
    #[serde(default)]
    pub view: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        })
    }
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::Pretty,
            view: false,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["codegen.toml", ".codegen.toml", "config/codegen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "swagger", "codegen") {
            let xdg_config = config_dir.config_dir().join("codegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (SWAGGER_CODEGEN__*)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("codegen.methods")
                .with_list_parse_key("codegen.naming.api_cut")
                .with_list_parse_key("codegen.filter.paths")
                .with_list_parse_key("codegen.filter.exclude_paths"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the output directory (resolves relative paths)
    pub fn output_dir(&self) -> PathBuf {
        if self.output.dir.is_absolute() {
            self.output.dir.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(&self.output.dir)
        }
    }
}
