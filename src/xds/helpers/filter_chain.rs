//! Appending HTTP filters to plugin-facing filter chains.
//!
//! Filters are only ever appended at the tail of a chain. Existing entries
//! keep their relative order and no chain is created or removed.

use crate::errors::{Error, Result};
use crate::xds::listener::FilterChain;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::HttpFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when a chain already holds a filter with the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Always append. Repeated passes over the same chain add repeated entries.
    #[default]
    Append,
    /// Leave chains that already contain a filter of that name untouched.
    SkipExisting,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Append => f.write_str("append"),
            DuplicatePolicy::SkipExisting => f.write_str("skip_existing"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "append" => Ok(DuplicatePolicy::Append),
            "skip_existing" => Ok(DuplicatePolicy::SkipExisting),
            other => Err(Error::validation(format!("Unknown duplicate policy '{}'", other))),
        }
    }
}

/// Append `filter` to the tail of every chain.
///
/// Returns the number of chains that were modified.
pub fn append_filter(chains: &mut [FilterChain], filter: &HttpFilter) -> usize {
    append_filter_with_policy(chains, filter, DuplicatePolicy::Append)
}

/// Append `filter` to the tail of every chain, honouring `policy`.
///
/// Returns the number of chains that were modified.
pub fn append_filter_with_policy(
    chains: &mut [FilterChain],
    filter: &HttpFilter,
    policy: DuplicatePolicy,
) -> usize {
    let mut modified = 0;

    for chain in chains.iter_mut() {
        if policy == DuplicatePolicy::SkipExisting && chain.contains_http_filter(&filter.name) {
            continue;
        }

        chain.http.push(filter.clone());
        modified += 1;
    }

    modified
}
