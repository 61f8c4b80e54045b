//! Configuration module
//!
//! Optional TOML file with endpoint, output and HTTP settings

pub mod config;

pub use config::{Config, ConfigError, RuntimeConfig};
