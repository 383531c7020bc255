//! # Command Line Interface
//!
//! Offline tooling for the plugins: run a generation pass against a registry
//! file and inspect what would be injected.

use crate::config::Config;
use crate::observability::{init_logging, log_config_info};
use crate::plugin::{find_eligible_service, DebugAttachPlugin, InputParams, PluginChain};
use crate::registry::{MemoryRegistry, ServiceDiscovery};
use crate::xds::filters::http::DebugAttachConfig;
use crate::xds::{http_filter_names, ListenerType, MutableObjects};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use envoy_types::pb::envoy::config::listener::v3::{FilterChain as EnvoyFilterChain, Listener};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "squashplane")]
#[command(about = "Debug-attach listener plugin tooling")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the inbound listener hooks over a listener skeleton and print the result
    Render {
        /// Registry file (YAML or JSON)
        #[arg(long)]
        registry: PathBuf,

        /// Listener name
        #[arg(long, default_value = "virtualInbound")]
        name: String,

        /// Listener type
        #[arg(long, value_enum, default_value_t = ListenerKind::Http)]
        listener_type: ListenerKind,

        /// Number of filter chains on the listener
        #[arg(long, default_value_t = 1)]
        chains: usize,

        /// Number of generation passes to run over the same listener
        #[arg(long, default_value_t = 1)]
        passes: usize,

        /// Hostname of the service the proxy fronts
        #[arg(long)]
        service_hostname: Option<String>,
    },

    /// Report which registry service, if any, the plugin would select
    Check {
        /// Registry file (YAML or JSON)
        #[arg(long)]
        registry: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ListenerKind {
    Http,
    Tcp,
}

impl From<ListenerKind> for ListenerType {
    fn from(kind: ListenerKind) -> Self {
        match kind {
            ListenerKind::Http => ListenerType::Http,
            ListenerKind::Tcp => ListenerType::Tcp,
        }
    }
}

#[derive(Debug, Serialize)]
struct RenderedChain {
    index: usize,
    http_filters: Vec<String>,
    debug_attach: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum CheckReport {
    Eligible { hostname: String, port: u16, cluster: String },
    Ambiguous { hostname: String, ports: usize },
    NotFound { marker: String },
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if cli.verbose {
        config.logging.log_level = "debug".to_string();
    }
    init_logging(&config.logging)?;
    log_config_info(&config);

    match cli.command {
        Commands::Render { registry, name, listener_type, chains, passes, service_hostname } => {
            let registry = MemoryRegistry::from_file(&registry)
                .with_context(|| format!("failed to load registry {}", registry.display()))?;
            let target = RenderTarget {
                name: &name,
                listener_type: listener_type.into(),
                chains,
                service_hostname: service_hostname.as_deref(),
            };
            let rendered = render(&config, &registry, &target, passes)?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Commands::Check { registry } => {
            let registry = MemoryRegistry::from_file(&registry)
                .with_context(|| format!("failed to load registry {}", registry.display()))?;
            let report = check(&config, &registry)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Listener skeleton a render pass runs against
struct RenderTarget<'a> {
    name: &'a str,
    listener_type: ListenerType,
    chains: usize,
    service_hostname: Option<&'a str>,
}

fn render(
    config: &Config,
    registry: &dyn ServiceDiscovery,
    target: &RenderTarget<'_>,
    passes: usize,
) -> anyhow::Result<Vec<RenderedChain>> {
    let plugins = PluginChain::new(vec![Box::new(DebugAttachPlugin::new(config.plugin.clone()))]);

    let skeleton = Listener {
        name: target.name.to_string(),
        filter_chains: vec![EnvoyFilterChain::default(); target.chains],
        ..Default::default()
    };
    let mut mutable = MutableObjects::for_listener(skeleton)?;

    let mut input = InputParams::new(target.listener_type, registry);
    if let Some(hostname) = target.service_hostname {
        input = input.with_service_hostname(hostname);
    }
    for _ in 0..passes {
        plugins.on_inbound_listener(&input, &mut mutable)?;
    }

    let debug_configs = mutable
        .filter_chains
        .iter()
        .map(|chain| {
            chain
                .http
                .iter()
                .map(DebugAttachConfig::from_http_filter)
                .filter_map(|decoded| decoded.transpose())
                .map(|decoded| decoded.and_then(|c| c.to_document()))
                .collect::<crate::Result<Vec<_>>>()
        })
        .collect::<crate::Result<Vec<_>>>()?;

    let listener = mutable.into_listener()?;
    let names = http_filter_names(&listener)?;

    Ok(names
        .into_iter()
        .zip(debug_configs)
        .enumerate()
        .map(|(index, (http_filters, debug_attach))| RenderedChain {
            index,
            http_filters,
            debug_attach,
        })
        .collect())
}

fn check(config: &Config, registry: &dyn ServiceDiscovery) -> anyhow::Result<CheckReport> {
    let services = registry.services()?;
    let marker = &config.plugin.service_marker;

    let report = match find_eligible_service(&services, marker) {
        None => CheckReport::NotFound { marker: marker.clone() },
        Some(service) => match service.single_port() {
            Some(port) => CheckReport::Eligible {
                hostname: service.hostname.to_string(),
                port: port.port,
                cluster: crate::domain::build_subset_key(
                    config.plugin.cluster_direction,
                    &config.plugin.cluster_subset,
                    &service.hostname,
                    port.port,
                ),
            },
            None => CheckReport::Ambiguous {
                hostname: service.hostname.to_string(),
                ports: service.ports.len(),
            },
        },
    };

    Ok(report)
}
