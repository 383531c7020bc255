//! # Listener configuration plugins
//!
//! A plugin gets a say in every artifact the control plane generates for a
//! proxy. The surrounding generator builds a listener, cluster or route
//! configuration and then calls the matching hook of each plugin, in the
//! order the plugins were handed to [`PluginChain::new`].
//!
//! Every hook receives a read-only view of the registry and a mutable
//! reference to the artifact under construction. A hook either leaves the
//! artifact alone or mutates it in place. It returns an error only when a
//! correct configuration cannot be produced at all, for example when the
//! registry is unreachable. A plugin deciding it does not apply is not an
//! error.
//!
//! Plugins keep no state between calls, so one instance can serve
//! concurrent generation passes for different proxies.

mod chain;
mod debug_attach;
mod matcher;

pub use chain::PluginChain;
pub use debug_attach::DebugAttachPlugin;
pub use matcher::find_eligible_service;

use crate::domain::{Port, Service};
use crate::errors::Result;
use crate::registry::ServiceDiscovery;
use crate::xds::{ListenerType, MutableObjects};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;

/// Read-only inputs shared by every hook of a generation pass
#[derive(Clone, Copy)]
pub struct InputParams<'a> {
    /// Kind of listener being generated
    pub listener_type: ListenerType,
    /// Registry view, valid for the duration of the call only
    pub registry: &'a dyn ServiceDiscovery,
    /// Proxy the configuration is generated for
    pub node_id: Option<&'a str>,
    /// Hostname of the service the proxy fronts, when known
    pub service_hostname: Option<&'a str>,
}

impl<'a> InputParams<'a> {
    pub fn new(listener_type: ListenerType, registry: &'a dyn ServiceDiscovery) -> Self {
        Self { listener_type, registry, node_id: None, service_hostname: None }
    }

    pub fn with_node_id(mut self, node_id: &'a str) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_service_hostname(mut self, hostname: &'a str) -> Self {
        self.service_hostname = Some(hostname);
        self
    }
}

/// Hooks invoked while generating configuration for a proxy.
///
/// There are no default implementations: a plugin that has nothing to do in
/// a phase says so explicitly by returning `Ok(())`.
pub trait Plugin: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Called for each outbound listener being generated
    fn on_outbound_listener(
        &self,
        input: &InputParams<'_>,
        mutable: &mut MutableObjects,
    ) -> Result<()>;

    /// Called for each inbound listener being generated
    fn on_inbound_listener(&self, input: &InputParams<'_>, mutable: &mut MutableObjects)
        -> Result<()>;

    /// Called for each outbound cluster being generated
    fn on_outbound_cluster(
        &self,
        input: &InputParams<'_>,
        service: &Service,
        port: &Port,
        cluster: &mut Cluster,
    ) -> Result<()>;

    /// Called for each inbound cluster being generated
    fn on_inbound_cluster(
        &self,
        input: &InputParams<'_>,
        service: &Service,
        port: &Port,
        cluster: &mut Cluster,
    ) -> Result<()>;

    /// Called for each outbound route configuration being generated
    fn on_outbound_route_configuration(
        &self,
        input: &InputParams<'_>,
        route_configuration: &mut RouteConfiguration,
    ) -> Result<()>;

    /// Called for each inbound route configuration being generated
    fn on_inbound_route_configuration(
        &self,
        input: &InputParams<'_>,
        route_configuration: &mut RouteConfiguration,
    ) -> Result<()>;
}
