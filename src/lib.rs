//! # Squashplane
//!
//! Listener configuration plugins for an Envoy control plane.
//!
//! Before a generated listener is sent to a proxy, an ordered chain of
//! plugins may inspect the service registry and mutate the listener's filter
//! chains. The plugin shipped here injects a debug-attach (squash) HTTP
//! filter into inbound HTTP listeners whenever a debugging service is present
//! in the mesh.
//!
//! ## Architecture
//!
//! ```text
//! Registry snapshot ─┐
//!                    ├→ PluginChain → DebugAttachPlugin → MutableObjects → Envoy Listener
//! Listener skeleton ─┘        (matcher → config encoder → filter chain mutator)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use squashplane::plugin::{DebugAttachPlugin, InputParams, PluginChain};
//! use squashplane::registry::MemoryRegistry;
//! use squashplane::xds::{ListenerType, MutableObjects};
//! use squashplane::Result;
//!
//! fn generate(listener: envoy_types::pb::envoy::config::listener::v3::Listener) -> Result<()> {
//!     let registry = MemoryRegistry::from_file("registry.yaml")?;
//!     let chain = PluginChain::new(vec![Box::new(DebugAttachPlugin::default())]);
//!
//!     let mut mutable = MutableObjects::for_listener(listener)?;
//!     chain.on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut mutable)?;
//!     let _listener = mutable.into_listener()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod plugin;
pub mod registry;
pub mod xds;

// Re-export commonly used types and traits
pub use config::Config;
pub use errors::{Error, Result};
pub use observability::init_logging;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
