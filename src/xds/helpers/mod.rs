//! Helper utilities for xDS resource manipulation.

mod filter_chain;

pub use filter_chain::{append_filter, append_filter_with_policy, DuplicatePolicy};
