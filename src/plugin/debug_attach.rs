//! Debug-attach plugin
//!
//! When the mesh contains a debugging service (hostname containing the
//! configured marker, `squash` by default) that exposes exactly one port,
//! every HTTP filter chain of each inbound HTTP listener gets a debug-attach
//! filter pointing at that service's cluster.

use super::{find_eligible_service, InputParams, Plugin};
use crate::config::PluginSettings;
use crate::domain::{ClusterName, Port, Service};
use crate::errors::Result;
use crate::xds::filters::http::build_filter_config;
use crate::xds::helpers::append_filter_with_policy;
use crate::xds::{ListenerType, MutableObjects};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct DebugAttachPlugin {
    settings: PluginSettings,
}

impl DebugAttachPlugin {
    pub fn new(settings: PluginSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    fn cluster_for(&self, service: &Service, port: &Port) -> ClusterName {
        ClusterName::new(
            self.settings.cluster_direction,
            self.settings.cluster_subset.clone(),
            service.hostname.clone(),
            port.port,
        )
    }
}

impl Plugin for DebugAttachPlugin {
    fn name(&self) -> &'static str {
        "debug_attach"
    }

    fn on_outbound_listener(&self, _: &InputParams<'_>, _: &mut MutableObjects) -> Result<()> {
        // Debugging attaches on the serving side only.
        Ok(())
    }

    fn on_inbound_listener(
        &self,
        input: &InputParams<'_>,
        mutable: &mut MutableObjects,
    ) -> Result<()> {
        let listener = mutable.listener.name.as_str();

        if input.listener_type != ListenerType::Http {
            debug!(
                listener = %listener,
                listener_type = %input.listener_type,
                "Not an HTTP listener, skipping debug-attach"
            );
            return Ok(());
        }

        if self.settings.exclude_self {
            if let Some(hostname) =
                input.service_hostname.filter(|h| h.contains(self.settings.service_marker.as_str()))
            {
                debug!(
                    listener = %listener,
                    hostname = %hostname,
                    "Proxy fronts the debug-attach service itself, skipping"
                );
                return Ok(());
            }
        }

        let services = input.registry.services()?;

        let Some(service) = find_eligible_service(&services, &self.settings.service_marker) else {
            debug!(
                listener = %listener,
                marker = %self.settings.service_marker,
                "No debug-attach service in registry"
            );
            return Ok(());
        };

        let Some(port) = service.single_port() else {
            debug!(
                listener = %listener,
                hostname = %service.hostname,
                ports = service.ports.len(),
                "Debug-attach service must expose exactly one port, skipping"
            );
            return Ok(());
        };

        let cluster = self.cluster_for(service, port);
        let filter = build_filter_config(&cluster).to_http_filter(self.settings.filter_name)?;

        let modified = append_filter_with_policy(
            &mut mutable.filter_chains,
            &filter,
            self.settings.duplicate_policy,
        );

        info!(
            listener = %mutable.listener.name,
            hostname = %service.hostname,
            cluster = %cluster,
            filter_name = %filter.name,
            filter_chains = modified,
            "Injected debug-attach filter"
        );

        Ok(())
    }

    fn on_outbound_cluster(
        &self,
        _: &InputParams<'_>,
        _: &Service,
        _: &Port,
        _: &mut Cluster,
    ) -> Result<()> {
        Ok(())
    }

    fn on_inbound_cluster(
        &self,
        _: &InputParams<'_>,
        _: &Service,
        _: &Port,
        _: &mut Cluster,
    ) -> Result<()> {
        Ok(())
    }

    fn on_outbound_route_configuration(
        &self,
        _: &InputParams<'_>,
        _: &mut RouteConfiguration,
    ) -> Result<()> {
        Ok(())
    }

    fn on_inbound_route_configuration(
        &self,
        _: &InputParams<'_>,
        _: &mut RouteConfiguration,
    ) -> Result<()> {
        Ok(())
    }
}
