//! Application configuration

use app_fs::MediaFilter;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub library: LibraryConfig,
    pub viewer: ViewerConfig,
    pub deletion: DeletionConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Where media comes from and how much of it is reviewed at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Media root. `None` falls back to the platform picture directory.
    pub root: Option<PathBuf>,
    pub filter: MediaFilter,
    /// Items per shuffled batch
    pub batch_size: usize,
    pub show_hidden_files: bool,
    pub recursive: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: None,
            filter: MediaFilter::All,
            batch_size: 16,
            show_hidden_files: false,
            recursive: true,
        }
    }
}

impl LibraryConfig {
    /// Resolve the media root, falling back to the user's picture directory
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            directories::UserDirs::new()
                .and_then(|dirs| dirs.picture_dir().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }
}

/// Zoom viewer constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Lower bound for the double-tap fill zoom
    pub double_tap_min_zoom: f32,
    pub zoom_animation_ms: u64,
    /// Fling velocity is divided by this before decay starts
    pub fling_velocity_divisor: f32,
    /// Exponential velocity decay rate per second
    pub fling_friction: f32,
    /// Fling stops below this speed (px/s)
    pub fling_stop_velocity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 3.0,
            double_tap_min_zoom: 1.1,
            zoom_animation_ms: 300,
            fling_velocity_divisor: 1.5,
            fling_friction: 4.0,
            fling_stop_velocity: 20.0,
        }
    }
}

impl ViewerConfig {
    /// Whether the gesture math can run with these values
    pub fn is_valid(&self) -> bool {
        let finite = [
            self.min_scale,
            self.max_scale,
            self.double_tap_min_zoom,
            self.fling_velocity_divisor,
            self.fling_friction,
            self.fling_stop_velocity,
        ]
        .iter()
        .all(|v| v.is_finite());

        finite
            && self.min_scale > 0.0
            && self.max_scale >= self.min_scale
            && self.double_tap_min_zoom > 0.0
            && self.fling_velocity_divisor > 0.0
            && self.fling_friction >= 0.0
            && self.fling_stop_velocity > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionConfig {
    /// Move to the OS trash instead of deleting permanently
    pub use_trash: bool,
    /// Ask before carrying out a trash request
    pub confirm: bool,
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            use_trash: true,
            confirm: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub preview_cache_mb: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { preview_cache_mb: 100 }
    }
}

impl CacheConfig {
    pub fn preview_cache_bytes(&self) -> usize {
        self.preview_cache_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub retain_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            retain_days: 7,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `config_path`, defaults when it does not exist
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let mut config: Self = toml::from_str(&content)?;
            if !config.viewer.is_valid() {
                tracing::warn!(viewer = ?config.viewer, "Invalid viewer settings, using defaults");
                config.viewer = ViewerConfig::default();
            }
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "PhotoReviewer", "PhotoReviewer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}
