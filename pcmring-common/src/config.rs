//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is read once from a TOML file. Every section and
//! key is optional; anything missing falls back to a built-in default.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PCMRING_CONFIG`)
//! 3. OS-dependent default (`<config dir>/pcmring/config.toml`)
//!
//! A missing config file is not an error: a warning is logged and defaults
//! are used. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PCMRING_CONFIG";

/// Default ring buffer capacity per plane in bytes
pub const DEFAULT_RING_CAPACITY_BYTES: usize = 1024 * 1000;

/// Default output frame size in samples per channel
pub const DEFAULT_FRAME_SAMPLES: usize = 1024;

/// Default rate converter input chunk in samples per channel
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Resampling session configuration (optional)
    #[serde(default)]
    pub resampler: ResamplerConfig,

    /// Output audio format (optional)
    #[serde(default)]
    pub output: OutputConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Resampling session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResamplerConfig {
    /// Ring buffer capacity per plane in bytes
    #[serde(default = "default_ring_capacity_bytes")]
    pub ring_capacity_bytes: usize,

    /// Samples per channel in each output frame
    #[serde(default = "default_frame_samples")]
    pub frame_samples: usize,

    /// Samples per channel fed to the rate converter per call
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            ring_capacity_bytes: default_ring_capacity_bytes(),
            frame_samples: default_frame_samples(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Output audio format
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Output channel count
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Output sample format name (u8, s16, s32, flt, dbl, and planar `p` variants)
    #[serde(default = "default_sample_format")]
    pub sample_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            sample_format: default_sample_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ring_capacity_bytes() -> usize {
    DEFAULT_RING_CAPACITY_BYTES
}

fn default_frame_samples() -> usize {
    DEFAULT_FRAME_SAMPLES
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    2
}

fn default_sample_format() -> String {
    "s16".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// A missing file yields defaults with a warning. Unreadable or
    /// malformed files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading config file {}", path.display());
                Self::from_toml_str(&content).map_err(|e| match e {
                    Error::Toml(inner) => {
                        Error::Config(format!("{}: {}", path.display(), inner))
                    }
                    other => other,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Resolve the config file path and load it
    ///
    /// Uses built-in defaults when no path can be resolved at all.
    pub fn resolve_and_load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
            Some(path) => Self::load(&path),
            None => {
                warn!("Could not determine a config file location, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.resampler.ring_capacity_bytes < 2 {
            return Err(Error::Config(format!(
                "resampler.ring_capacity_bytes must be at least 2, got {}",
                self.resampler.ring_capacity_bytes
            )));
        }
        if self.resampler.frame_samples == 0 {
            return Err(Error::Config(
                "resampler.frame_samples must be greater than 0".to_string(),
            ));
        }
        if self.resampler.chunk_size == 0 {
            return Err(Error::Config(
                "resampler.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.output.sample_rate == 0 {
            return Err(Error::Config(
                "output.sample_rate must be greater than 0".to_string(),
            ));
        }
        if self.output.channels == 0 {
            return Err(Error::Config(
                "output.channels must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Config file resolution in priority order:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. OS-dependent default location
///
/// Returns `None` only when no platform config directory exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: OS-dependent default
    default_config_path()
}

/// Get the default configuration file path for the platform
///
/// - Linux: `~/.config/pcmring/config.toml`
/// - macOS: `~/Library/Application Support/pcmring/config.toml`
/// - Windows: `%APPDATA%\pcmring\config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pcmring").join("config.toml"))
}
