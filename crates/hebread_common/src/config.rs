//! Hebrew Read configuration.
//!
//! Config file: `$HEBREAD_CONFIG`, or ~/.config/hebread/config.toml

use crate::router::DEFAULT_PANEL;
use crate::storage::DEFAULT_NAMESPACE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "HEBREAD_CONFIG";

/// Color display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        }
    }
}

/// Where progress lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key prefix inside the storage file
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_panel")]
    pub default_panel: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_panel: default_panel(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorMode,

    /// Print a toast when a badge unlocks
    #[serde(default = "default_true")]
    pub celebrate: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            celebrate: true,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HebreadConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("hebread")
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_panel() -> String {
    DEFAULT_PANEL.to_string()
}

fn default_true() -> bool {
    true
}

impl HebreadConfig {
    /// Default user config path: ~/.config/hebread/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(config_dir.join("hebread").join("config.toml"))
    }

    /// File `load` reads from and `config set` writes to
    pub fn active_path() -> Result<PathBuf> {
        match std::env::var(CONFIG_ENV) {
            Ok(explicit) if !explicit.is_empty() => Ok(PathBuf::from(explicit)),
            _ => Self::user_config_path(),
        }
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. `$HEBREAD_CONFIG`
    /// 2. User config (~/.config/hebread/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            if !explicit.is_empty() {
                return Self::load_from(Path::new(&explicit));
            }
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: HebreadConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.namespace.trim().is_empty() {
            anyhow::bail!("storage.namespace must not be empty");
        }
        if self.router.default_panel.trim().is_empty() {
            anyhow::bail!("router.default_panel must not be empty");
        }
        Ok(())
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn set_color_mode(&mut self, mode: &str) -> Result<()> {
        self.output.color = match mode.to_lowercase().as_str() {
            "auto" => ColorMode::Auto,
            "always" | "on" | "yes" => ColorMode::Always,
            "never" | "off" | "no" | "none" => ColorMode::Never,
            _ => anyhow::bail!("Invalid color mode: '{}'. Valid values: auto, always, never", mode),
        };
        Ok(())
    }

    /// Set one `section.key`; returns the canonical key and the value stored
    pub fn set(&mut self, key: &str, value: &str) -> Result<(&'static str, String)> {
        match key.to_lowercase().as_str() {
            "output.color" | "color" => {
                self.set_color_mode(value)?;
                Ok(("output.color", self.output.color.as_str().to_string()))
            }
            "output.celebrate" | "celebrate" => {
                self.output.celebrate = match value.to_lowercase().as_str() {
                    "true" | "on" | "yes" => true,
                    "false" | "off" | "no" => false,
                    _ => anyhow::bail!(
                        "Invalid value for output.celebrate: '{}' (on, off)",
                        value
                    ),
                };
                Ok(("output.celebrate", self.output.celebrate.to_string()))
            }
            _ => anyhow::bail!(
                "Unknown configuration key: '{}' (valid: output.color, output.celebrate)",
                key
            ),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
