//! Configuration management module
//!
//! This module handles loading application configuration from environment
//! variables and an optional `.env` file.

pub mod settings;

pub use settings::{get_settings, Settings, ENV_FILE};
