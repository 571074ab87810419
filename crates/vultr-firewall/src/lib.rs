//! Firewall group facts for the Vultr API.
//!
//! Lists the firewall groups of an account and normalizes the provider's
//! keyed response into [`FirewallGroupRecord`]s.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod normalize;

pub use client::{FirewallGroupLister, FACTS_NAMESPACE, FIREWALL_GROUP_LIST_PATH};
pub use models::FirewallGroupRecord;
pub use normalize::{
    normalize, normalize_firewall_groups, Conversion, FieldMapping, FIREWALL_GROUP_FIELDS,
};

/// Convenient result alias that reuses the shared Vultr error type.
pub type Result<T> = vultr_core::Result<T>;
