//! # pcmring Common Library
//!
//! Shared code for the pcmring workspace including:
//! - Error types
//! - TOML configuration loading and config file resolution
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::TomlConfig;
pub use error::{Error, Result};
