//! # Envoy resource building
//!
//! Envoy protobuf plumbing used by the plugins: HTTP filter payloads, filter
//! chain mutation, and rendering of the listener under construction.

pub mod filters;
pub mod helpers;
pub mod listener;

pub use listener::{http_filter_names, FilterChain, ListenerType, MutableObjects};
