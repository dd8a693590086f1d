//! Infrastructure - configuration
//!
//! - `config` - TOML-backed tunables with serde defaults

pub mod config;

pub use config::Config;
