//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sfc_transpiler::{PluginCommand, PluginRegistry};
use std::fs;
use thiserror::Error;

/// Config file names looked up in the workspace root, in order.
pub const CONFIG_FILES: [&str; 2] = ["sfc-loader.json", ".sfc-loader.json"];

/// An error reading an explicit config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The config path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a valid config.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The config path.
        path: Utf8PathBuf,
        /// The JSON error.
        source: serde_json::Error,
    },
}

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Component file extension, without the dot.
    pub extension: String,

    /// Whether source maps are requested.
    pub maps: bool,

    /// Command plugins by language.
    pub plugins: IndexMap<String, PluginCommand>,

    /// Plugin configuration by language, passed through as `extra`.
    pub options: IndexMap<String, Value>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: "vue".to_string(),
            maps: true,
            plugins: IndexMap::new(),
            options: IndexMap::new(),
        }
    }
}

impl LoaderConfig {
    /// Loads the configuration from the workspace root.
    ///
    /// A missing file gives the defaults, as does an unreadable one after a
    /// warning.
    pub fn load(workspace: &Utf8Path) -> Self {
        for name in CONFIG_FILES {
            let path = workspace.join(name);
            if !path.exists() {
                continue;
            }
            return match Self::from_file(&path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("{err}; using default configuration");
                    Self::default()
                }
            };
        }

        Self::default()
    }

    /// Reads a config file.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.extension = config.extension.trim_start_matches('.').to_string();
        tracing::debug!(%path, extension = %config.extension, "loaded configuration");
        Ok(config)
    }

    /// Returns the plugin configuration for `lang`, or an empty object.
    pub fn extra(&self, lang: &str) -> Value {
        self.options
            .get(lang)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Builds a plugin registry with the configured commands.
    ///
    /// Relative command paths with a directory part are taken relative to
    /// `base`; bare names are left for `PATH`.
    pub fn plugin_registry(&self, base: &Utf8Path) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for (lang, command) in &self.plugins {
            let mut command = command.clone();
            if command.command.is_relative() && command.command.components().count() > 1 {
                command.command = base.join(&command.command);
            }
            registry.register_command(lang, command);
        }
        registry
    }
}
