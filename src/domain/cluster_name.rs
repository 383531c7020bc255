//! Cluster naming
//!
//! Every generated cluster is named `<direction>|<port>|<subset>|<hostname>`.
//! Anything that refers to a cluster by name (route actions, filter configs)
//! must build the reference through this module so the strings line up with
//! the clusters the control plane actually emits.

use crate::domain::Hostname;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '|';

/// Direction of traffic relative to the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrafficDirection {
    Inbound,
    #[default]
    Outbound,
}

impl TrafficDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficDirection::Inbound => "inbound",
            TrafficDirection::Outbound => "outbound",
        }
    }
}

impl fmt::Display for TrafficDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inbound" => Ok(TrafficDirection::Inbound),
            "outbound" => Ok(TrafficDirection::Outbound),
            other => Err(Error::validation(format!("Unknown traffic direction '{}'", other))),
        }
    }
}

/// Parsed form of a cluster name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterName {
    pub direction: TrafficDirection,
    pub subset: String,
    pub hostname: Hostname,
    pub port: u16,
}

impl ClusterName {
    pub fn new(
        direction: TrafficDirection,
        subset: impl Into<String>,
        hostname: Hostname,
        port: u16,
    ) -> Self {
        Self { direction, subset: subset.into(), hostname, port }
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.direction,
            self.port,
            self.subset,
            self.hostname,
            sep = SEPARATOR
        )
    }
}

impl FromStr for ClusterName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Hostnames never contain the separator, so a fixed split is exact.
        let parts: Vec<&str> = s.splitn(4, SEPARATOR).collect();
        if parts.len() != 4 {
            return Err(Error::validation(format!(
                "Cluster name '{}' must have 4 '|'-separated parts",
                s
            )));
        }

        let direction = parts[0].parse()?;
        let port = parts[1].parse::<u16>().map_err(|e| {
            Error::validation(format!("Invalid port in cluster name '{}': {}", s, e))
        })?;

        Ok(Self {
            direction,
            port,
            subset: parts[2].to_string(),
            hostname: Hostname::new(parts[3]),
        })
    }
}

/// Build the cluster name for a (direction, subset, hostname, port) tuple.
pub fn build_subset_key(
    direction: TrafficDirection,
    subset: &str,
    hostname: &Hostname,
    port: u16,
) -> String {
    ClusterName::new(direction, subset, hostname.clone(), port).to_string()
}
