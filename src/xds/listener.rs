//! Listener generation state handed to plugins
//!
//! While a listener is being generated its filter chains are kept in a
//! plugin-friendly form: network filters and HTTP filters in separate ordered
//! lists. [`MutableObjects::for_listener`] decodes whatever the skeleton
//! already carries, including the HTTP filters of an existing
//! `HttpConnectionManager`. Once every plugin has run,
//! [`MutableObjects::into_listener`] encodes them back into the Envoy
//! `Listener`.
//!
//! The router, and anything configured after it, is held apart from
//! [`FilterChain::http`]. Plugins append to `http`, so their filters always
//! land in front of the router and pre-existing entries keep their order.

use crate::errors::{Error, Result};
use crate::xds::filters::any_from_message;
use crate::xds::filters::http::{router_filter, ROUTER_FILTER_NAME};
use envoy_types::pb::envoy::config::core::v3::{
    config_source::ConfigSourceSpecifier, AggregatedConfigSource, ConfigSource,
};
use envoy_types::pb::envoy::config::listener::v3::{
    filter::ConfigType, Filter, FilterChain as EnvoyFilterChain, Listener,
};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager::{CodecType, RouteSpecifier},
    HttpConnectionManager, HttpFilter, Rds,
};
use prost::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network filter name of the HTTP connection manager
pub const HTTP_CONNECTION_MANAGER_NAME: &str = "envoy.filters.network.http_connection_manager";
const HTTP_CONNECTION_MANAGER_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";

/// Kind of listener being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerType {
    /// Listener terminating HTTP through a connection manager
    Http,
    /// Plain TCP proxying
    Tcp,
}

impl fmt::Display for ListenerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerType::Http => f.write_str("http"),
            ListenerType::Tcp => f.write_str("tcp"),
        }
    }
}

/// Connection manager found on a listener skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionManager {
    /// Index among the chain's other network filters
    pub position: usize,
    /// Network filter name of the original entry
    pub filter_name: String,
    /// Type URL of the original typed config
    pub type_url: String,
    /// Decoded settings, with `http_filters` moved out
    pub config: HttpConnectionManager,
    /// The router and any filters configured after it
    pub terminal: Vec<HttpFilter>,
}

/// One filter chain of the listener under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    /// HTTP filters ahead of the router, in execution order
    pub http: Vec<HttpFilter>,
    /// Network filters other than the connection manager
    pub tcp: Vec<Filter>,
    /// Connection manager decoded from the skeleton, if it had one
    pub connection_manager: Option<ConnectionManager>,
}

impl FilterChain {
    pub fn contains_http_filter(&self, name: &str) -> bool {
        self.http.iter().any(|f| f.name == name)
    }

    fn decode(filters: Vec<Filter>, listener: &str) -> Result<Self> {
        let mut chain = FilterChain::default();

        for filter in filters {
            if filter.name != HTTP_CONNECTION_MANAGER_NAME || chain.connection_manager.is_some() {
                chain.tcp.push(filter);
                continue;
            }

            let typed_config = match &filter.config_type {
                Some(ConfigType::TypedConfig(any)) => any.clone(),
                _ => {
                    chain.tcp.push(filter);
                    continue;
                }
            };

            let mut config = HttpConnectionManager::decode(typed_config.value.as_slice())
                .map_err(|e| {
                    Error::internal(format!("Failed to decode HCM for listener '{}': {}", listener, e))
                })?;

            let mut http = std::mem::take(&mut config.http_filters);
            let router_pos =
                http.iter().position(|f| f.name == ROUTER_FILTER_NAME).unwrap_or(http.len());
            let terminal = http.split_off(router_pos);

            chain.http = http;
            chain.connection_manager = Some(ConnectionManager {
                position: chain.tcp.len(),
                filter_name: filter.name,
                type_url: typed_config.type_url,
                config,
                terminal,
            });
        }

        Ok(chain)
    }

    fn into_filters(self, listener: &str) -> Vec<Filter> {
        let FilterChain { http, mut tcp, connection_manager } = self;

        match connection_manager {
            Some(manager) => {
                let mut config = manager.config;
                config.http_filters = http;
                config.http_filters.extend(manager.terminal);
                ensure_router(&mut config.http_filters);

                let position = manager.position.min(tcp.len());
                tcp.insert(
                    position,
                    Filter {
                        name: manager.filter_name,
                        config_type: Some(ConfigType::TypedConfig(any_from_message(
                            manager.type_url,
                            &config,
                        ))),
                    },
                );
            }
            None if !http.is_empty() => tcp.push(build_connection_manager(listener, http)),
            None => {}
        }

        tcp
    }
}

/// Output objects a listener hook is allowed to mutate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutableObjects {
    /// The listener skeleton (name, address, per-chain match criteria)
    pub listener: Listener,
    /// Plugin-facing chains, index-aligned with `listener.filter_chains`
    pub filter_chains: Vec<FilterChain>,
}

impl MutableObjects {
    /// Take over a listener skeleton, decoding the filters of every chain.
    pub fn for_listener(mut listener: Listener) -> Result<Self> {
        let name = listener.name.clone();
        let filter_chains = listener
            .filter_chains
            .iter_mut()
            .map(|chain| FilterChain::decode(std::mem::take(&mut chain.filters), &name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { listener, filter_chains })
    }

    /// Render the plugin chains into the Envoy listener.
    pub fn into_listener(self) -> Result<Listener> {
        let MutableObjects { mut listener, filter_chains } = self;

        if listener.filter_chains.len() != filter_chains.len() {
            return Err(Error::internal(format!(
                "Listener '{}' has {} filter chains but {} were generated",
                listener.name,
                listener.filter_chains.len(),
                filter_chains.len()
            )));
        }

        let name = listener.name.clone();
        for (envoy_chain, chain) in listener.filter_chains.iter_mut().zip(filter_chains) {
            envoy_chain.filters = chain.into_filters(&name);
        }

        Ok(listener)
    }
}

// An HCM without a terminal filter is rejected by Envoy.
fn ensure_router(http_filters: &mut Vec<HttpFilter>) {
    if !http_filters.iter().any(|f| f.name == ROUTER_FILTER_NAME) {
        http_filters.push(router_filter());
    }
}

fn build_connection_manager(name: &str, mut http_filters: Vec<HttpFilter>) -> Filter {
    ensure_router(&mut http_filters);

    let hcm = HttpConnectionManager {
        codec_type: CodecType::Auto as i32,
        stat_prefix: name.to_string(),
        route_specifier: Some(RouteSpecifier::Rds(Rds {
            route_config_name: name.to_string(),
            config_source: Some(ConfigSource {
                config_source_specifier: Some(ConfigSourceSpecifier::Ads(
                    AggregatedConfigSource::default(),
                )),
                ..Default::default()
            }),
        })),
        http_filters,
        ..Default::default()
    };

    Filter {
        name: HTTP_CONNECTION_MANAGER_NAME.to_string(),
        config_type: Some(ConfigType::TypedConfig(any_from_message(
            HTTP_CONNECTION_MANAGER_TYPE_URL,
            &hcm,
        ))),
    }
}

/// HTTP filter names of every connection manager in `listener`, one list per
/// filter chain (empty for chains without a connection manager).
pub fn http_filter_names(listener: &Listener) -> Result<Vec<Vec<String>>> {
    listener
        .filter_chains
        .iter()
        .map(|chain: &EnvoyFilterChain| {
            let mut names = Vec::new();
            for filter in &chain.filters {
                if filter.name != HTTP_CONNECTION_MANAGER_NAME {
                    continue;
                }
                if let Some(ConfigType::TypedConfig(typed_config)) = &filter.config_type {
                    let hcm = HttpConnectionManager::decode(typed_config.value.as_slice())
                        .map_err(|e| {
                            Error::internal(format!(
                                "Failed to decode HCM for listener '{}': {}",
                                listener.name, e
                            ))
                        })?;
                    names.extend(hcm.http_filters.into_iter().map(|f| f.name));
                }
            }
            Ok(names)
        })
        .collect()
}
