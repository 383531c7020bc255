//! Debug-attach HTTP filter configuration
//!
//! Builds the configuration for Envoy's squash filter, which asks a debugging
//! agent to attach to the pod serving a matched request. The attachment
//! template carries macro placeholders that Envoy substitutes at request time;
//! they are passed through verbatim here.

use crate::domain::ClusterName;
use crate::errors::{Error, Result};
use crate::xds::filters::{any_from_message, json_to_struct, struct_to_json};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::http_filter::ConfigType as HttpFilterConfigType;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::HttpFilter;
use envoy_types::pb::google::protobuf::Any as EnvoyAny;
use prost_types::Struct as ProstStruct;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the injected HTTP filter
pub const DEBUG_ATTACH_FILTER_NAME: &str = "debug-attach";

/// Historical filter name, still understood by older data planes
pub const LEGACY_FILTER_NAME: &str = "envoy.squash";

/// Type URL of the squash filter configuration message
pub const SQUASH_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.http.squash.v3.Squash";

/// Replaced by Envoy with the name of the pod handling the request
pub const POD_NAME_MACRO: &str = "{{ POD_NAME }}";

/// Replaced by Envoy with the namespace of the pod handling the request
pub const POD_NAMESPACE_MACRO: &str = "{{ POD_NAMESPACE }}";

/// Wire form of the squash filter configuration.
///
/// Only the fields this crate sets are declared; the timeout fields of the
/// upstream message keep their data-plane defaults.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SquashProto {
    #[prost(string, tag = "1")]
    pub cluster: String,
    #[prost(message, optional, tag = "2")]
    pub attachment_template: Option<ProstStruct>,
}

/// Which name the injected filter is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterNameStyle {
    /// `debug-attach`
    #[default]
    Current,
    /// `envoy.squash`
    Legacy,
}

impl FilterNameStyle {
    pub fn filter_name(&self) -> &'static str {
        match self {
            FilterNameStyle::Current => DEBUG_ATTACH_FILTER_NAME,
            FilterNameStyle::Legacy => LEGACY_FILTER_NAME,
        }
    }
}

impl fmt::Display for FilterNameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filter_name())
    }
}

impl FromStr for FilterNameStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "current" | DEBUG_ATTACH_FILTER_NAME => Ok(FilterNameStyle::Current),
            "legacy" | LEGACY_FILTER_NAME => Ok(FilterNameStyle::Legacy),
            other => Err(Error::validation(format!("Unknown filter name style '{}'", other))),
        }
    }
}

/// Pod selector inside the attachment template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub pod: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    pub match_request: bool,
    pub attachment: Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentTemplate {
    pub spec: AttachmentSpec,
}

/// Configuration for the debug-attach filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugAttachConfig {
    /// Cluster through which the debugging agent's API is reached
    pub cluster: String,
    pub attachment_template: AttachmentTemplate,
}

/// Build the filter configuration pointing at `cluster`.
pub fn build_filter_config(cluster: &ClusterName) -> DebugAttachConfig {
    DebugAttachConfig {
        cluster: cluster.to_string(),
        attachment_template: AttachmentTemplate {
            spec: AttachmentSpec {
                match_request: true,
                attachment: Attachment {
                    pod: POD_NAME_MACRO.to_string(),
                    namespace: POD_NAMESPACE_MACRO.to_string(),
                },
            },
        },
    }
}

impl DebugAttachConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cluster.trim().is_empty() {
            return Err(Error::encoding("debug-attach cluster cannot be empty"));
        }
        self.cluster.parse::<ClusterName>().map_err(|e| {
            Error::encoding(format!("debug-attach cluster '{}' is malformed: {}", self.cluster, e))
        })?;
        Ok(())
    }

    /// The whole configuration as a JSON document
    pub fn to_document(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| Error::encoding(format!("Failed to encode debug-attach config: {}", e)))
    }

    /// Convert to the squash protobuf message
    pub fn to_proto(&self) -> Result<SquashProto> {
        self.validate()?;

        let template = serde_json::to_value(&self.attachment_template).map_err(|e| {
            Error::encoding(format!("Failed to encode attachment template: {}", e))
        })?;

        Ok(SquashProto {
            cluster: self.cluster.clone(),
            attachment_template: Some(json_to_struct(&template)?),
        })
    }

    /// Convert to Envoy Any payload
    pub fn to_any(&self) -> Result<EnvoyAny> {
        Ok(any_from_message(SQUASH_TYPE_URL, &self.to_proto()?))
    }

    /// Build the HTTP filter entry carrying this configuration
    pub fn to_http_filter(&self, style: FilterNameStyle) -> Result<HttpFilter> {
        Ok(HttpFilter {
            name: style.filter_name().to_string(),
            is_optional: false,
            disabled: false,
            config_type: Some(HttpFilterConfigType::TypedConfig(self.to_any()?)),
        })
    }

    /// Build configuration from the squash protobuf message
    pub fn from_proto(proto: &SquashProto) -> Result<Self> {
        let template = proto
            .attachment_template
            .as_ref()
            .ok_or_else(|| Error::encoding("debug-attach config has no attachment template"))?;

        let attachment_template: AttachmentTemplate =
            serde_json::from_value(struct_to_json(template)).map_err(|e| {
                Error::encoding(format!("Failed to decode attachment template: {}", e))
            })?;

        let config = Self { cluster: proto.cluster.clone(), attachment_template };
        config.validate()?;
        Ok(config)
    }

    /// Decode the configuration carried by an HTTP filter, if it is one of ours
    pub fn from_http_filter(filter: &HttpFilter) -> Result<Option<Self>> {
        use prost::Message;

        match &filter.config_type {
            Some(HttpFilterConfigType::TypedConfig(any)) if any.type_url == SQUASH_TYPE_URL => {
                let proto = SquashProto::decode(any.value.as_slice())?;
                Self::from_proto(&proto).map(Some)
            }
            _ => Ok(None),
        }
    }
}
