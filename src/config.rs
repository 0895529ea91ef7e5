//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/procat/procat.toml`
//! 3. Explicit config file: `--config <path>`
//! 4. Environment variables: `PROCAT_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::util::path::expand_path;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const ENV_PREFIX: &str = "PROCAT";

/// Tree display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeSettings {
    /// Depth opened by `procat tree --all`
    pub expand_depth: usize,
    /// Colored status labels
    pub color: bool,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            expand_depth: 1,
            color: true,
        }
    }
}

/// Unified configuration for procat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base url of the catalog API
    pub api_url: String,
    /// Bearer token, sent unchanged
    pub api_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Department listed when none is given on the command line
    pub department: Option<String>,
    pub tree: TreeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_secs: 30,
            department: None,
            tree: TreeSettings::default(),
        }
    }
}

/// Get the XDG config directory for procat.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "procat").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("procat.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given on the command line; must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(
            global_config_path().as_deref(),
            explicit,
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Load from the given layers. The global file is optional, the
    /// explicit file is required.
    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut builder = Self::defaults_builder()?;

        if let Some(global_path) = global {
            if global_path.exists() {
                builder = builder.add_source(
                    File::from(global_path)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        if let Some(path) = explicit {
            let path = expand_path(path);
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(env.prefix_separator("_").separator("__").try_parsing(true));

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.normalize();
        Ok(settings)
    }

    fn defaults_builder(
    ) -> Result<ConfigBuilder<config::builder::DefaultState>, ApplicationError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("api_url", defaults.api_url)
            .map_err(config_err)?
            .set_default("timeout_secs", defaults.timeout_secs)
            .map_err(config_err)?
            .set_default("tree.expand_depth", defaults.tree.expand_depth as u64)
            .map_err(config_err)?
            .set_default("tree.color", defaults.tree.color)
            .map_err(config_err)
    }

    /// Drop empty optionals and trailing slashes.
    fn normalize(&mut self) {
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        if self.api_url.is_empty() {
            self.api_url = DEFAULT_API_URL.to_string();
        }
        self.api_token = self.api_token.take().filter(|t| !t.trim().is_empty());
        self.department = self.department.take().filter(|d| !d.trim().is_empty());
    }

    /// Show the effective configuration as TOML, token masked.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if shown.api_token.is_some() {
            shown.api_token = Some("********".into());
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# procat configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/procat/procat.toml
#   Explicit: procat --config <file>
#   Env:      PROCAT_* environment variables (nested keys use "__",
#             e.g. PROCAT_TREE__EXPAND_DEPTH=2)

# Base url of the process catalog API
# api_url = "http://localhost:8080"

# Bearer token sent as "Authorization: Bearer <token>"
# api_token = "..."

# Request timeout in seconds
# timeout_secs = 30

# Department listed by `procat tree` when --department is omitted
# department = "..."

[tree]
# Depth opened by `procat tree --all`
# expand_depth = 1

# Colored status labels
# color = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
