//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use envoy_types::pb::envoy::config::listener::v3::{
    filter::ConfigType, Filter, FilterChain as EnvoyFilterChain, Listener,
};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    HttpConnectionManager, HttpFilter,
};
use squashplane::xds::filters::any_from_message;
use squashplane::xds::filters::http::router_filter;
use squashplane::xds::listener::HTTP_CONNECTION_MANAGER_NAME;
use squashplane::domain::{Port, Protocol, Service};
use squashplane::registry::ServiceDiscovery;
use squashplane::xds::MutableObjects;
use squashplane::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SQUASH_HOSTNAME: &str = "squash.svc.cluster.local";
pub const SQUASH_CLUSTER: &str = "outbound|80||squash.svc.cluster.local";

pub fn http_port(port: u16) -> Port {
    Port::new("http", port, Protocol::Http)
}

pub fn squash_service() -> Service {
    Service::new(SQUASH_HOSTNAME, vec![http_port(80)])
}

pub fn app_service(hostname: &str) -> Service {
    Service::new(hostname, vec![http_port(9080)])
}

pub fn named_filter(name: &str) -> HttpFilter {
    HttpFilter { name: name.to_string(), ..Default::default() }
}

/// Listener with `chains` filter chains, each pre-populated with `existing`.
pub fn listener_with(chains: usize, existing: &[&str]) -> MutableObjects {
    let mut mutable = MutableObjects::for_listener(Listener {
        name: "virtualInbound".to_string(),
        filter_chains: vec![EnvoyFilterChain::default(); chains],
        ..Default::default()
    })
    .expect("empty skeleton decodes");
    for chain in &mut mutable.filter_chains {
        chain.http.extend(existing.iter().map(|name| named_filter(name)));
    }
    mutable
}

/// Envoy listener whose single chain already carries a connection manager
/// with `existing` HTTP filters followed by the router.
pub fn served_listener(existing: &[&str]) -> Listener {
    let mut http_filters: Vec<HttpFilter> = existing.iter().map(|name| named_filter(name)).collect();
    http_filters.push(router_filter());

    let hcm = HttpConnectionManager {
        stat_prefix: "inbound_9080".to_string(),
        http_filters,
        ..Default::default()
    };

    Listener {
        name: "virtualInbound".to_string(),
        filter_chains: vec![EnvoyFilterChain {
            filters: vec![Filter {
                name: HTTP_CONNECTION_MANAGER_NAME.to_string(),
                config_type: Some(ConfigType::TypedConfig(any_from_message(
                    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager",
                    &hcm,
                ))),
            }],
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn filter_names(mutable: &MutableObjects) -> Vec<Vec<String>> {
    mutable
        .filter_chains
        .iter()
        .map(|chain| chain.http.iter().map(|f| f.name.clone()).collect())
        .collect()
}

/// Registry that is always unreachable.
pub struct UnavailableRegistry;

impl ServiceDiscovery for UnavailableRegistry {
    fn services(&self) -> Result<Vec<Service>> {
        Err(Error::registry("service discovery unavailable"))
    }
}

/// Registry that counts how often it was consulted.
pub struct CountingRegistry {
    services: Vec<Service>,
    calls: AtomicUsize,
}

impl CountingRegistry {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ServiceDiscovery for CountingRegistry {
    fn services(&self) -> Result<Vec<Service>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.services.clone())
    }
}
