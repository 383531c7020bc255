//! Domain types
//!
//! Pure domain entities consumed by the listener plugins: services and ports
//! from the registry, and the cluster naming scheme shared with the rest of
//! the generated configuration.

pub mod cluster_name;
pub mod service;

pub use cluster_name::{build_subset_key, ClusterName, TrafficDirection};
pub use service::{Hostname, Port, Protocol, Service};
