//! # Observability
//!
//! Structured logging for the squashplane plugins.

pub mod logging;

pub use logging::{init_logging, log_config_info};
