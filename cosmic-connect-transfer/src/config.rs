//! Widget Configuration
//!
//! Preview limits and the default download location, stored as TOML next to
//! the other Cosmic Connect configuration files.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Largest file the widget will decode for a thumbnail (25 MiB)
pub const DEFAULT_PREVIEW_MAX_BYTES: u64 = 25 * 1024 * 1024;

/// Thumbnail height in pixels
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 50;

const CONFIG_FILE_NAME: &str = "transfer.toml";

/// Transfer widget configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WidgetConfig {
    /// Thumbnail configuration
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Download location configuration
    #[serde(default)]
    pub downloads: DownloadConfig,
}

/// Thumbnail configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Files above this size are never decoded
    #[serde(default = "default_preview_max_bytes")]
    pub max_file_bytes: u64,

    /// Height the thumbnail is scaled to
    #[serde(default = "default_thumbnail_height")]
    pub thumbnail_height: u32,
}

/// Download location configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DownloadConfig {
    /// Directory suggested in the save dialog
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
}

fn default_preview_max_bytes() -> u64 {
    DEFAULT_PREVIEW_MAX_BYTES
}

fn default_thumbnail_height() -> u32 {
    DEFAULT_THUMBNAIL_HEIGHT
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_preview_max_bytes(),
            thumbnail_height: default_thumbnail_height(),
        }
    }
}

impl DownloadConfig {
    /// Directory suggested in the save dialog
    ///
    /// Falls back to the user download directory, then the working directory.
    pub fn suggested_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Suggested full path for a received file
    pub fn suggested_path(&self, filename: &str) -> PathBuf {
        self.suggested_dir().join(filename)
    }
}

impl WidgetConfig {
    /// Default location of the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("cosmic")
            .join("cosmic-connect")
            .join(CONFIG_FILE_NAME)
    }

    /// Load configuration from the default location
    ///
    /// Writes the defaults there when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            info!("Wrote default transfer configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: WidgetConfig = toml::from_str(&contents)?;
        debug!("Loaded transfer configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to an explicit file, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
