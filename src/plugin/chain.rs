//! Ordered plugin execution.

use super::{InputParams, Plugin};
use crate::domain::{Port, Service};
use crate::errors::Result;
use crate::plugin_span;
use crate::xds::MutableObjects;
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use tracing::warn;

/// An explicitly ordered list of plugins.
///
/// Each hook runs the plugins in list order against a scratch copy of the
/// artifact. The copy replaces the caller's artifact only if every plugin
/// succeeded, so a failed pass never leaves a half-mutated listener behind.
pub struct PluginChain {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginChain {
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugin names in execution order
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn on_outbound_listener(
        &self,
        input: &InputParams<'_>,
        mutable: &mut MutableObjects,
    ) -> Result<()> {
        self.run("on_outbound_listener", input, mutable, |plugin, target| {
            plugin.on_outbound_listener(input, target)
        })
    }

    pub fn on_inbound_listener(
        &self,
        input: &InputParams<'_>,
        mutable: &mut MutableObjects,
    ) -> Result<()> {
        self.run("on_inbound_listener", input, mutable, |plugin, target| {
            plugin.on_inbound_listener(input, target)
        })
    }

    pub fn on_outbound_cluster(
        &self,
        input: &InputParams<'_>,
        service: &Service,
        port: &Port,
        cluster: &mut Cluster,
    ) -> Result<()> {
        self.run("on_outbound_cluster", input, cluster, |plugin, target| {
            plugin.on_outbound_cluster(input, service, port, target)
        })
    }

    pub fn on_inbound_cluster(
        &self,
        input: &InputParams<'_>,
        service: &Service,
        port: &Port,
        cluster: &mut Cluster,
    ) -> Result<()> {
        self.run("on_inbound_cluster", input, cluster, |plugin, target| {
            plugin.on_inbound_cluster(input, service, port, target)
        })
    }

    pub fn on_outbound_route_configuration(
        &self,
        input: &InputParams<'_>,
        route_configuration: &mut RouteConfiguration,
    ) -> Result<()> {
        self.run("on_outbound_route_configuration", input, route_configuration, |plugin, target| {
            plugin.on_outbound_route_configuration(input, target)
        })
    }

    pub fn on_inbound_route_configuration(
        &self,
        input: &InputParams<'_>,
        route_configuration: &mut RouteConfiguration,
    ) -> Result<()> {
        self.run("on_inbound_route_configuration", input, route_configuration, |plugin, target| {
            plugin.on_inbound_route_configuration(input, target)
        })
    }

    fn run<T, F>(
        &self,
        hook: &'static str,
        input: &InputParams<'_>,
        target: &mut T,
        f: F,
    ) -> Result<()>
    where
        T: Clone,
        F: Fn(&dyn Plugin, &mut T) -> Result<()>,
    {
        let mut scratch = target.clone();

        for plugin in &self.plugins {
            let _span = plugin_span!(hook, plugin.name(), input.node_id.unwrap_or("")).entered();

            if let Err(e) = f(plugin.as_ref(), &mut scratch) {
                warn!(
                    hook = hook,
                    plugin = plugin.name(),
                    error = %e,
                    "Plugin failed, discarding changes from this pass"
                );
                return Err(e);
            }
        }

        *target = scratch;
        Ok(())
    }
}

impl std::fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginChain").field("plugins", &self.plugin_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::registry::MemoryRegistry;
    use crate::xds::ListenerType;
    use envoy_types::pb::envoy::config::listener::v3::{FilterChain as EnvoyFilterChain, Listener};
    use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::HttpFilter;
    use tracing_test::traced_test;

    /// Appends a filter named after itself, then optionally fails.
    struct Stub {
        name: &'static str,
        fail: bool,
    }

    impl Plugin for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_outbound_listener(&self, _: &InputParams<'_>, _: &mut MutableObjects) -> Result<()> {
            Ok(())
        }

        fn on_inbound_listener(&self, _: &InputParams<'_>, mutable: &mut MutableObjects) -> Result<()> {
            for chain in &mut mutable.filter_chains {
                chain.http.push(HttpFilter { name: self.name.to_string(), ..Default::default() });
            }
            if self.fail {
                return Err(Error::internal("stub failure"));
            }
            Ok(())
        }

        fn on_outbound_cluster(&self, _: &InputParams<'_>, _: &Service, _: &Port, _: &mut Cluster) -> Result<()> {
            Ok(())
        }

        fn on_inbound_cluster(&self, _: &InputParams<'_>, _: &Service, _: &Port, _: &mut Cluster) -> Result<()> {
            Ok(())
        }

        fn on_outbound_route_configuration(&self, _: &InputParams<'_>, _: &mut RouteConfiguration) -> Result<()> {
            Ok(())
        }

        fn on_inbound_route_configuration(&self, _: &InputParams<'_>, _: &mut RouteConfiguration) -> Result<()> {
            Ok(())
        }
    }

    fn mutable() -> MutableObjects {
        MutableObjects::for_listener(Listener {
            name: "virtualInbound".to_string(),
            filter_chains: vec![EnvoyFilterChain::default()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn empty_chain_leaves_listener_alone() {
        let chain = PluginChain::new(Vec::new());
        let registry = MemoryRegistry::default();
        let mut objects = mutable();

        chain.on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut objects).unwrap();

        assert_eq!(objects, mutable());
    }

    #[test]
    #[traced_test]
    fn failure_is_logged_and_rolled_back() {
        let chain = PluginChain::new(vec![
            Box::new(Stub { name: "first", fail: false }),
            Box::new(Stub { name: "second", fail: true }),
        ]);
        let registry = MemoryRegistry::default();
        let mut objects = mutable();

        let err = chain
            .on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut objects)
            .unwrap_err();

        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(objects, mutable());
        assert!(logs_contain("Plugin failed, discarding changes from this pass"));
        assert!(logs_contain("stub failure"));
    }

    #[test]
    fn debug_output_lists_plugins() {
        let chain = PluginChain::new(vec![Box::new(Stub { name: "first", fail: false })]);
        assert_eq!(format!("{:?}", chain), r#"PluginChain { plugins: ["first"] }"#);
    }
}
