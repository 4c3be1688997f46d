//! Configuration file resolution and loading
//!
//! Config file lookup follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`<config_dir>/mpx/<file_name>`)
//! 4. System config directory (`/etc/mpx/<file_name>`, Linux only)
//!
//! When nothing is found the caller runs on compiled defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name used under the platform config directories
pub const CONFIG_DIR_NAME: &str = "mpx";

/// Where a resolved configuration file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfig(PathBuf),
    SystemConfig(PathBuf),
    /// No file found; compiled defaults apply
    Defaults,
}

impl ConfigSource {
    /// Path of the file, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserConfig(p)
            | ConfigSource::SystemConfig(p) => Some(p.as_path()),
            ConfigSource::Defaults => None,
        }
    }

    /// True when the path was named explicitly (CLI or environment)
    pub fn is_explicit(&self) -> bool {
        matches!(self, ConfigSource::CommandLine(_) | ConfigSource::Environment(_))
    }
}

/// Resolve the configuration file location
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    if let Some(path) = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(file_name)) {
        if path.exists() {
            return ConfigSource::UserConfig(path);
        }
    }

    // Priority 4: System config directory
    if cfg!(target_os = "linux") {
        let path = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(file_name);
        if path.exists() {
            return ConfigSource::SystemConfig(path);
        }
    }

    ConfigSource::Defaults
}

/// Load a TOML configuration from the resolved source
///
/// A missing file at an explicitly named path is an error. Discovered files
/// that fail to read fall back to defaults with a warning, so a broken user
/// config never prevents startup.
pub fn load_toml_config<T>(source: &ConfigSource) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = source.path() else {
        debug!("No configuration file found, using compiled defaults");
        return Ok(T::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let config = toml::from_str::<T>(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Err(e) if source.is_explicit() => Err(Error::Config(format!(
            "Cannot read config file {}: {}",
            path.display(),
            e
        ))),
        Err(e) => {
            warn!(
                "Cannot read config file {} ({}), using compiled defaults",
                path.display(),
                e
            );
            Ok(T::default())
        }
    }
}
