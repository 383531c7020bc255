//! # Configuration Settings
//!
//! Defines the configuration structure for the squashplane plugins.

use crate::domain::TrafficDirection;
use crate::errors::{Error, Result};
use crate::xds::filters::http::debug_attach::FilterNameStyle;
use crate::xds::helpers::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Hostname fragment identifying the debug-attach service
pub const DEFAULT_SERVICE_MARKER: &str = "squash";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    /// Debug-attach plugin configuration
    #[validate(nested)]
    pub plugin: PluginSettings,

    /// Logging configuration
    #[validate(nested)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self { plugin: PluginSettings::from_env()?, logging: LoggingConfig::from_env() };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.plugin.validate_custom()
    }
}

/// Settings for the debug-attach listener plugin
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PluginSettings {
    /// Substring a service hostname must contain to be selected
    #[validate(length(min = 1, message = "Service marker cannot be empty"))]
    pub service_marker: String,

    /// Name given to the injected HTTP filter
    pub filter_name: FilterNameStyle,

    /// Behaviour when the filter is already present in a chain
    pub duplicate_policy: DuplicatePolicy,

    /// Direction component of the referenced cluster name
    pub cluster_direction: TrafficDirection,

    /// Subset component of the referenced cluster name
    pub cluster_subset: String,

    /// Leave proxies of the debugging service itself untouched
    #[serde(default)]
    pub exclude_self: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            service_marker: DEFAULT_SERVICE_MARKER.to_string(),
            filter_name: FilterNameStyle::default(),
            duplicate_policy: DuplicatePolicy::default(),
            cluster_direction: TrafficDirection::Outbound,
            cluster_subset: String::new(),
            exclude_self: false,
        }
    }
}

impl PluginSettings {
    /// Create plugin settings from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let service_marker =
            std::env::var("SQUASHPLANE_SERVICE_MARKER").unwrap_or(defaults.service_marker);

        let filter_name = match std::env::var("SQUASHPLANE_FILTER_NAME") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.filter_name,
        };

        let duplicate_policy = match std::env::var("SQUASHPLANE_DUPLICATE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.duplicate_policy,
        };

        let cluster_direction = match std::env::var("SQUASHPLANE_CLUSTER_DIRECTION") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.cluster_direction,
        };

        let cluster_subset =
            std::env::var("SQUASHPLANE_CLUSTER_SUBSET").unwrap_or(defaults.cluster_subset);

        let exclude_self = std::env::var("SQUASHPLANE_EXCLUDE_SELF")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.exclude_self);

        Ok(Self {
            service_marker,
            filter_name,
            duplicate_policy,
            cluster_direction,
            cluster_subset,
            exclude_self,
        })
    }

    /// Checks the validator crate cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.service_marker.trim().is_empty() {
            return Err(Error::validation("Service marker cannot be blank"));
        }

        if self.cluster_subset.contains('|') {
            return Err(Error::validation("Cluster subset cannot contain '|'"));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an EnvFilter string)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let log_level =
            std::env::var("SQUASHPLANE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let json_logging = std::env::var("SQUASHPLANE_JSON_LOGS")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { log_level, json_logging }
    }
}
