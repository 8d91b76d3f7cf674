//! Configuration for the screen share session.
//!
//! Loads configuration from TOML files and provides runtime defaults.

use crate::room::TrackPriority;
use crate::types::CaptureSourceKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub track: TrackConfig,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            media: MediaConfig::default(),
            track: TrackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Identifier of the capture provider the request is addressed to
    #[serde(default = "default_provider_id")]
    pub provider_id: String,

    /// How long to wait for a provider reply before treating it as absent
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Instruction text shown when the provider is not installed
    #[serde(default = "default_install_instructions")]
    pub install_instructions: String,

    /// Capture sources offered to the user
    #[serde(default = "default_sources")]
    pub sources: Vec<CaptureSourceKind>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            response_timeout_ms: default_response_timeout_ms(),
            install_instructions: default_install_instructions(),
            sources: default_sources(),
        }
    }
}

impl ProviderConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Frame rate cap for the captured video track
    #[serde(default = "default_max_frame_rate")]
    pub max_frame_rate: u32,

    /// Whether to request audio alongside the video track
    #[serde(default)]
    pub audio: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_frame_rate: default_max_frame_rate(),
            audio: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Name the published track is registered under
    #[serde(default = "default_track_name")]
    pub name: String,

    /// Publish priority; subscribers raise it when the track is rendered
    #[serde(default)]
    pub priority: TrackPriority,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            name: default_track_name(),
            priority: TrackPriority::default(),
        }
    }
}

// Default value functions for serde
fn default_provider_id() -> String {
    "oopfkbliplhbjdhbgkffnpfjelgkfeam".to_string()
}

fn default_response_timeout_ms() -> u64 {
    5000
}

fn default_install_instructions() -> String {
    "Please install the screen sharing extension:\n\
     1. Open your browser's extension store\n\
     2. Search for the screen sharing extension\n\
     3. Add it to the browser\n\
     4. Reload this page"
        .to_string()
}

fn default_sources() -> Vec<CaptureSourceKind> {
    vec![CaptureSourceKind::Window]
}

fn default_max_frame_rate() -> u32 {
    15
}

fn default_track_name() -> String {
    "screen".to_string()
}

impl ShareConfig {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("screenshare-session")
            .join("config.toml")
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShareConfig::default();
        assert_eq!(config.media.max_frame_rate, 15);
        assert!(!config.media.audio);
        assert_eq!(config.track.name, "screen");
        assert_eq!(config.track.priority, TrackPriority::Low);
        assert_eq!(config.provider.sources, vec![CaptureSourceKind::Window]);
        assert_eq!(config.provider.response_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[provider]
provider_id = "local-helper"
response_timeout_ms = 2500

[media]
max_frame_rate = 30

[track]
name = "desk"
priority = "high"
"#;

        let config: ShareConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.provider_id, "local-helper");
        assert_eq!(config.provider.response_timeout_ms, 2500);
        assert_eq!(config.media.max_frame_rate, 30);
        assert_eq!(config.track.name, "desk");
        assert_eq!(config.track.priority, TrackPriority::High);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ShareConfig = toml::from_str("[media]\naudio = true\n").unwrap();
        assert!(config.media.audio);
        assert_eq!(config.media.max_frame_rate, 15);
        assert_eq!(config.track.name, "screen");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ShareConfig::default();
        config.provider.provider_id = "round-trip".to_string();
        config.media.max_frame_rate = 24;
        config.save_to_path(path.clone()).unwrap();

        let loaded = ShareConfig::load_from_path(path);
        assert_eq!(loaded.provider.provider_id, "round-trip");
        assert_eq!(loaded.media.max_frame_rate, 24);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let loaded = ShareConfig::load_from_path(PathBuf::from("/nonexistent/config.toml"));
        assert_eq!(loaded.track.name, "screen");
    }
}
