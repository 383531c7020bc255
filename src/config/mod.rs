//! # Configuration Management
//!
//! Configuration for the squashplane plugins, loaded from defaults and
//! `SQUASHPLANE_*` environment variables and validated with `validator`.

mod settings;

pub use settings::{Config, LoggingConfig, PluginSettings, DEFAULT_SERVICE_MARKER};

use crate::errors::{Error, Result};
use std::path::Path;

/// Load a `.env` file into the process environment.
///
/// With no path the file is searched for from the current directory upwards.
/// Returns `Ok(false)` when there is no such file; any other failure, such
/// as a malformed line, is an error.
pub fn load_env_file(path: Option<&Path>) -> Result<bool> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };

    match loaded {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(Error::config(format!("Error loading .env file: {}", e))),
    }
}
