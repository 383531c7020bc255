//! Integration tests for ordered plugin execution

mod common;

use common::*;
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use squashplane::domain::{Port, Service};
use squashplane::plugin::{DebugAttachPlugin, InputParams, Plugin, PluginChain};
use squashplane::registry::MemoryRegistry;
use squashplane::xds::{ListenerType, MutableObjects};
use squashplane::{Error, Result};
use std::sync::{Arc, Mutex};

/// Appends a named filter to every chain and records that it ran.
struct Tagging {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Plugin for Tagging {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_outbound_listener(&self, _: &InputParams<'_>, _: &mut MutableObjects) -> Result<()> {
        Ok(())
    }

    fn on_inbound_listener(&self, _: &InputParams<'_>, mutable: &mut MutableObjects) -> Result<()> {
        self.log.lock().unwrap().push(self.name);
        for chain in &mut mutable.filter_chains {
            chain.http.push(named_filter(self.name));
        }
        Ok(())
    }

    fn on_outbound_cluster(
        &self,
        _: &InputParams<'_>,
        _: &Service,
        _: &Port,
        cluster: &mut Cluster,
    ) -> Result<()> {
        cluster.alt_stat_name.push_str(self.name);
        Ok(())
    }

    fn on_inbound_cluster(&self, _: &InputParams<'_>, _: &Service, _: &Port, _: &mut Cluster) -> Result<()> {
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

/// Fails every listener hook after touching the listener.
struct Failing;

impl Plugin for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn on_outbound_listener(&self, _: &InputParams<'_>, _: &mut MutableObjects) -> Result<()> {
        Err(Error::internal("outbound listener rejected"))
    }

    fn on_inbound_listener(&self, _: &InputParams<'_>, mutable: &mut MutableObjects) -> Result<()> {
        for chain in &mut mutable.filter_chains {
            chain.http.push(named_filter("partial"));
        }
        Err(Error::internal("inbound listener rejected"))
    }

    fn on_outbound_cluster(
        &self,
        _: &InputParams<'_>,
        _: &Service,
        _: &Port,
        cluster: &mut Cluster,
    ) -> Result<()> {
        cluster.alt_stat_name = "partial".to_string();
        Err(Error::internal("cluster rejected"))
    }

    fn on_inbound_cluster(&self, _: &InputParams<'_>, _: &Service, _: &Port, _: &mut Cluster) -> Result<()> {
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

fn tagging(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Box<dyn Plugin> {
    Box::new(Tagging { name, log: Arc::clone(log) })
}

#[test]
fn plugins_run_in_list_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = PluginChain::new(vec![tagging("first", &log), tagging("second", &log)]);
    let registry = MemoryRegistry::default();
    let mut mutable = listener_with(2, &[]);

    chain.on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut mutable).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    for names in filter_names(&mutable) {
        assert_eq!(names, vec!["first", "second"]);
    }
}

#[test]
fn debug_attach_follows_earlier_plugin_output() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = PluginChain::new(vec![tagging("authn", &log), Box::new(DebugAttachPlugin::default())]);
    let registry = MemoryRegistry::new(vec![squash_service()]);
    let mut mutable = listener_with(1, &["envoy.filters.http.cors"]);

    chain.on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut mutable).unwrap();

    assert_eq!(filter_names(&mutable)[0], vec!["envoy.filters.http.cors", "authn", "debug-attach"]);
}

#[test]
fn failed_pass_discards_every_plugin_change() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = PluginChain::new(vec![
        Box::new(DebugAttachPlugin::default()),
        tagging("authn", &log),
        Box::new(Failing),
        tagging("never", &log),
    ]);
    let registry = MemoryRegistry::new(vec![squash_service()]);
    let mut mutable = listener_with(2, &["envoy.filters.http.cors"]);
    let before = mutable.clone();

    let err = chain
        .on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut mutable)
        .unwrap_err();

    assert!(matches!(err, Error::Internal(_)));
    assert_eq!(mutable, before);
    assert_eq!(*log.lock().unwrap(), vec!["authn"]);
}

#[test]
fn registry_failure_aborts_the_pass() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = PluginChain::new(vec![tagging("authn", &log), Box::new(DebugAttachPlugin::default())]);
    let mut mutable = listener_with(1, &[]);
    let before = mutable.clone();

    let err = chain
        .on_inbound_listener(&InputParams::new(ListenerType::Http, &UnavailableRegistry), &mut mutable)
        .unwrap_err();

    assert!(matches!(err, Error::Registry { .. }));
    assert_eq!(mutable, before);
}

#[test]
fn cluster_hooks_commit_atomically() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = MemoryRegistry::default();
    let input = InputParams::new(ListenerType::Http, &registry).with_node_id("sidecar~10.0.0.1");
    let service = squash_service();
    let port = http_port(80);

    let ok_chain = PluginChain::new(vec![tagging("a", &log), tagging("b", &log)]);
    let mut cluster = Cluster { name: "outbound|80||squash".to_string(), ..Default::default() };
    ok_chain.on_outbound_cluster(&input, &service, &port, &mut cluster).unwrap();
    assert_eq!(cluster.alt_stat_name, "ab");

    let failing_chain = PluginChain::new(vec![tagging("c", &log), Box::new(Failing)]);
    failing_chain.on_outbound_cluster(&input, &service, &port, &mut cluster).unwrap_err();
    assert_eq!(cluster.alt_stat_name, "ab");
}

#[test]
fn debug_attach_is_inert_outside_inbound_listeners() {
    let chain = PluginChain::new(vec![Box::new(DebugAttachPlugin::default())]);
    let registry = CountingRegistry::new(vec![squash_service()]);
    let input = InputParams::new(ListenerType::Http, &registry);
    let service = squash_service();
    let port = http_port(80);

    let mut cluster = Cluster::default();
    chain.on_outbound_cluster(&input, &service, &port, &mut cluster).unwrap();
    chain.on_inbound_cluster(&input, &service, &port, &mut cluster).unwrap();
    assert_eq!(cluster, Cluster::default());

    let mut routes = RouteConfiguration::default();
    chain.on_outbound_route_configuration(&input, &mut routes).unwrap();
    chain.on_inbound_route_configuration(&input, &mut routes).unwrap();
    assert_eq!(routes, RouteConfiguration::default());

    let mut mutable = listener_with(1, &[]);
    chain.on_outbound_listener(&input, &mut mutable).unwrap();
    assert!(mutable.filter_chains[0].http.is_empty());

    assert_eq!(registry.calls(), 0);
}

#[test]
fn registry_consulted_once_per_inbound_pass() {
    let chain = PluginChain::new(vec![Box::new(DebugAttachPlugin::default())]);
    let registry = CountingRegistry::new(vec![squash_service()]);
    let mut mutable = listener_with(4, &[]);

    chain.on_inbound_listener(&InputParams::new(ListenerType::Http, &registry), &mut mutable).unwrap();

    assert_eq!(registry.calls(), 1);
    assert!(mutable.filter_chains.iter().all(|chain| chain.contains_http_filter("debug-attach")));
}

#[test]
fn shared_chain_serves_concurrent_passes() {
    let chain = Arc::new(PluginChain::new(vec![Box::new(DebugAttachPlugin::default())]));
    let registry = Arc::new(MemoryRegistry::new(vec![squash_service()]));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let chain = Arc::clone(&chain);
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let mut mutable = listener_with(i + 1, &[]);
                chain
                    .on_inbound_listener(
                        &InputParams::new(ListenerType::Http, registry.as_ref()),
                        &mut mutable,
                    )
                    .unwrap();
                filter_names(&mutable)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let names = handle.join().unwrap();
        assert_eq!(names.len(), i + 1);
        assert!(names.iter().all(|chain| chain == &vec!["debug-attach".to_string()]));
    }
}

#[test]
fn chain_reports_plugin_names() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = PluginChain::new(vec![tagging("authn", &log), Box::new(DebugAttachPlugin::default())]);

    assert_eq!(chain.len(), 2);
    assert!(!chain.is_empty());
    assert_eq!(chain.plugin_names(), vec!["authn", "debug_attach"]);
    assert!(PluginChain::new(Vec::new()).is_empty());
}
