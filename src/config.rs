//! Configuration management for schema inference
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-infer.toml)
//! - Environment variables (SCHEMA_INFER__*)
//!
//! ## Example config file (schema-infer.toml):
//! ```toml
//! [inference]
//! add_null_defaults = true
//! validate_avro = false
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferConfig {
    /// Schema construction settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Schema construction settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Give optional fields with a nullable union and no declared default a null default
    #[serde(default)]
    pub add_null_defaults: bool,

    /// Re-parse every generated schema with apache-avro before returning it
    #[serde(default)]
    pub validate_avro: bool,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl InferConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-infer.toml",
            ".schema-infer.toml",
            "config/schema-infer.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schema-infer") {
            let xdg_config = config_dir.config_dir().join("schema-infer.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_INFER__INFERENCE__ADD_NULL_DEFAULTS=true
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_INFER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
