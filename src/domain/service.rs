//! Service registry domain types
//!
//! Point-in-time views of mesh services as handed out by the registry.
//! These values are owned by the registry snapshot; plugins only read them.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Fully qualified service hostname, unique within a registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self(hostname.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.0.contains(pattern)
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Hostname {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Hostname {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Application protocol spoken on a service port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Http2,
    Https,
    Grpc,
    #[default]
    Tcp,
    Tls,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Http => "HTTP",
            Protocol::Http2 => "HTTP2",
            Protocol::Https => "HTTPS",
            Protocol::Grpc => "GRPC",
            Protocol::Tcp => "TCP",
            Protocol::Tls => "TLS",
            Protocol::Udp => "UDP",
        };
        f.write_str(s)
    }
}

/// A named endpoint on a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Port {
    #[serde(default)]
    pub name: String,

    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    #[serde(default)]
    pub protocol: Protocol,
}

impl Port {
    pub fn new(name: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self { name: name.into(), port, protocol }
    }
}

/// A service known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Service {
    #[validate(custom(function = "validate_hostname"))]
    pub hostname: Hostname,

    #[serde(default)]
    #[validate(nested)]
    pub ports: Vec<Port>,
}

impl Service {
    pub fn new(hostname: impl Into<Hostname>, ports: Vec<Port>) -> Self {
        Self { hostname: hostname.into(), ports }
    }

    /// The only port of this service, or `None` when it exposes zero or
    /// several ports.
    pub fn single_port(&self) -> Option<&Port> {
        match self.ports.as_slice() {
            [port] => Some(port),
            _ => None,
        }
    }
}

fn validate_hostname(hostname: &Hostname) -> Result<(), validator::ValidationError> {
    if hostname.as_str().trim().is_empty() {
        let mut err = validator::ValidationError::new("hostname");
        err.message = Some("Hostname cannot be empty".into());
        return Err(err);
    }
    Ok(())
}
