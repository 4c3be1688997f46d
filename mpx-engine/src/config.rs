//! mpx-engine configuration
//!
//! Loaded from `engine.toml` (see `mpx_common::config` for lookup order).
//! Every field has a compiled default, so a partial file is valid.

use crate::error::Result;
use mpx_common::config::{load_toml_config, resolve_config_path, ConfigSource};
use mpx_common::ComponentKind;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MPX_CONFIG";

/// Config file name looked up in the platform config directories
pub const CONFIG_FILE_NAME: &str = "engine.toml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sleep between two cycles of a background worker loop (milliseconds)
    pub worker_cycle_ms: u64,

    /// Decoded block capacity of the video component buffer
    pub video_block_capacity: usize,

    /// Decoded block capacity of the audio component buffer
    pub audio_block_capacity: usize,

    /// Decoded block capacity of the subtitle component buffer
    pub subtitle_block_capacity: usize,

    /// Target amount of decoded media kept ahead of the render position (milliseconds)
    pub buffer_cache_length_ms: u64,

    /// Target amount of downloaded media kept ahead of the read position (milliseconds)
    pub download_cache_length_ms: u64,

    /// Run the native-resource leak check after Close.
    /// Unset means: enabled in debug builds only.
    pub leak_check: Option<bool>,

    /// Capacity of the event bus created by the engine builder
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_cycle_ms: 10,
            video_block_capacity: 24,
            audio_block_capacity: 120,
            subtitle_block_capacity: 48,
            buffer_cache_length_ms: 500,
            download_cache_length_ms: 5000,
            leak_check: None,
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Resolve and load the configuration (CLI > env > user > system > defaults)
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let source = resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        Self::load_from(&source)
    }

    /// Load from an already resolved source
    pub fn load_from(source: &ConfigSource) -> Result<Self> {
        let config: EngineConfig = load_toml_config(source)?;
        Ok(config)
    }

    pub fn worker_cycle(&self) -> Duration {
        Duration::from_millis(self.worker_cycle_ms.max(1))
    }

    pub fn buffer_cache_length(&self) -> Duration {
        Duration::from_millis(self.buffer_cache_length_ms)
    }

    pub fn download_cache_length(&self) -> Duration {
        Duration::from_millis(self.download_cache_length_ms)
    }

    /// Block capacity for a component buffer (never zero)
    pub fn block_capacity(&self, kind: ComponentKind) -> usize {
        let capacity = match kind {
            ComponentKind::Video => self.video_block_capacity,
            ComponentKind::Audio => self.audio_block_capacity,
            ComponentKind::Subtitle => self.subtitle_block_capacity,
        };
        capacity.max(1)
    }

    /// Whether the post-close leak check runs
    pub fn leak_check_enabled(&self) -> bool {
        self.leak_check.unwrap_or(cfg!(debug_assertions))
    }
}
