/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Configuration management with validation and defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::API_URL;
use crate::downloader::Mirror;
use crate::error::{WadboostError, WadboostResult};

/// Longest pause between batch items we accept, in seconds
const MAX_DELAY_SECS: u64 = 3600;

/// Main configuration structure for wadboost
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API endpoint prefix, ending in `action=`
    pub api_url: String,

    /// API request timeout in seconds
    pub request_timeout_secs: u64,

    /// Download configuration
    pub download: DownloadSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            request_timeout_secs: 30,
            download: DownloadSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `[download]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Destination folder
    pub dir: PathBuf,

    /// Mirror name, origin URL or FTP host
    pub mirror: String,

    /// Create the destination folder when missing
    pub make_subfolder: bool,

    /// Pause between batch items, in seconds
    pub delay_secs: u64,

    /// Show progress bars
    pub progress: bool,

    /// HTTP transfer timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            mirror: Mirror::default().name().to_string(),
            make_subfolder: true,
            delay_secs: 5,
            progress: true,
            timeout_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (empty = no file logging)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration with precedence:
    /// 1. built-in defaults
    /// 2. ~/.config/wadboost/config.toml
    /// 3. environment variables (WADBOOST_*)
    ///
    /// A config file that exists but cannot be read or parsed is an error.
    pub fn load() -> WadboostResult<Self> {
        let user_config = dirs::config_dir().map(|dir| dir.join("wadboost").join("config.toml"));
        Config::load_layers(user_config.as_deref(), |key| std::env::var(key).ok())
    }

    fn load_layers<F>(user_config: Option<&Path>, var: F) -> WadboostResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = user_config.filter(|p| p.exists()) {
            config = config.merge(Config::from_file(path)?);
        }

        Ok(config.apply_env_overrides(var))
    }

    /// Parse a single TOML file
    pub fn from_file(path: &Path) -> WadboostResult<Config> {
        let content = fs::read_to_string(path).map_err(|e| {
            WadboostError::filesystem(path.display().to_string(), "cannot read config", e)
        })?;
        toml::from_str(&content).map_err(|e| WadboostError::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Merge another config into this one (other takes precedence for non-default values)
    fn merge(mut self, other: Config) -> Self {
        let default = Config::default();

        if other.api_url != default.api_url {
            self.api_url = other.api_url;
        }
        if other.request_timeout_secs != default.request_timeout_secs {
            self.request_timeout_secs = other.request_timeout_secs;
        }

        self.download = self.download.merge(other.download);

        if other.logging.level != default.logging.level {
            self.logging.level = other.logging.level;
        }
        if other.logging.file.is_some() {
            self.logging.file = other.logging.file;
        }

        self
    }

    /// Apply environment variable overrides, looking names up with `var`
    fn apply_env_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("WADBOOST_API_URL") {
            self.api_url = val;
        }

        if let Some(val) = var("WADBOOST_DOWNLOAD_DIR") {
            self.download.dir = PathBuf::from(val);
        }

        if let Some(val) = var("WADBOOST_MIRROR") {
            self.download.mirror = val;
        }

        if let Some(val) = var("WADBOOST_DELAY_SECS") {
            if let Ok(n) = val.parse() {
                self.download.delay_secs = n;
            }
        }

        if let Some(val) = var("WADBOOST_LOG_LEVEL") {
            self.logging.level = val;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> WadboostResult<()> {
        let invalid = |message: String| WadboostError::Config { message };

        url::Url::parse(&self.api_url)
            .map_err(|e| invalid(format!("api_url '{}' is not a URL: {}", self.api_url, e)))?;

        self.download.mirror.parse::<Mirror>()?;

        if self.download.delay_secs == 0 {
            return Err(invalid("delay_secs must be at least 1".to_string()));
        }
        if self.download.delay_secs > MAX_DELAY_SECS {
            return Err(invalid(format!("delay_secs must be at most {}", MAX_DELAY_SECS)));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl DownloadSettings {
    fn merge(mut self, other: DownloadSettings) -> Self {
        let default = DownloadSettings::default();

        if other.dir != default.dir {
            self.dir = other.dir;
        }
        if other.mirror != default.mirror {
            self.mirror = other.mirror;
        }
        if other.make_subfolder != default.make_subfolder {
            self.make_subfolder = other.make_subfolder;
        }
        if other.delay_secs != default.delay_secs {
            self.delay_secs = other.delay_secs;
        }
        if other.progress != default.progress {
            self.progress = other.progress;
        }
        if other.timeout_secs != default.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }

        self
    }
}
