use crate::request::{DateFallback, FilterKind, SearchPolicy, SizeSkip};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub display: DisplayConfig,
    pub compat: CompatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Filter codes used when `-f` is not given.
    pub default_filters: Vec<u8>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_filters: vec![1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub separator_width: usize,
    pub separator_char: char,
    pub show_timing: bool,
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            separator_width: 80,
            separator_char: '`',
            show_timing: true,
            color: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    pub date_start_fallback: bool,
    pub size_skip_directory: bool,
}

impl CompatConfig {
    pub fn policy(&self) -> SearchPolicy {
        SearchPolicy {
            size_skip: if self.size_skip_directory {
                SizeSkip::Directory
            } else {
                SizeSkip::File
            },
            date_fallback: if self.date_start_fallback {
                DateFallback::StartDay
            } else {
                DateFallback::RangeOnly
            },
        }
    }
}

impl Config {
    /// Loads `explicit` if given, otherwise the first config file found in the
    /// usual locations, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_path(),
        };
        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("detective/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".detective.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".detective.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    fn validate(&self) -> Result<()> {
        if let Some(code) = self
            .search
            .default_filters
            .iter()
            .find(|code| FilterKind::from_code(**code).is_none())
        {
            bail!("unknown filter code {code} in search.default_filters (expected 1 or 2)");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
