//! # Service Registry
//!
//! Read-only access to the services known to the mesh. Plugins receive a
//! `&dyn ServiceDiscovery` for the duration of a single hook call and must
//! not hold on to the snapshot afterwards.

use crate::domain::Service;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// Source of registry snapshots.
///
/// `services` returns the registry's current ordering. Implementations whose
/// ordering is not stable across calls make first-match selection
/// non-deterministic across generation passes.
pub trait ServiceDiscovery: Send + Sync {
    /// List every known service, or fail with [`Error::Registry`] when the
    /// registry cannot be reached.
    fn services(&self) -> Result<Vec<Service>>;
}

/// Static in-memory registry, typically loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    services: Vec<Service>,
}

impl MemoryRegistry {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// Parse a registry document (YAML, which also accepts JSON).
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(contents)?;
        Self::validated(file.services)
    }

    /// Load a registry document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::registry_with_source(
                format!("Failed to read registry file '{}'", path.display()),
                Box::new(e),
            )
        })?;
        let registry = Self::from_yaml_str(&contents)?;
        debug!(path = %path.display(), services = registry.len(), "Loaded registry file");
        Ok(registry)
    }

    fn validated(services: Vec<Service>) -> Result<Self> {
        let mut seen = HashSet::new();
        for service in &services {
            service.validate()?;
            if !seen.insert(service.hostname.clone()) {
                return Err(Error::validation(format!(
                    "Duplicate service hostname '{}'",
                    service.hostname
                )));
            }
        }
        Ok(Self { services })
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceDiscovery for MemoryRegistry {
    fn services(&self) -> Result<Vec<Service>> {
        Ok(self.services.clone())
    }
}
