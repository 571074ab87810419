//! Firewall group models.

use serde::{Deserialize, Serialize};

/// A firewall group as reported by the facts module.
///
/// Built from the provider's native fields by
/// [`normalize_firewall_groups`](crate::normalize::normalize_firewall_groups).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallGroupRecord {
    /// Group identifier (`FIREWALLGROUPID` upstream).
    pub id: String,
    /// Creation timestamp, provider formatted.
    pub date_created: String,
    /// Last modification timestamp, provider formatted.
    pub date_modified: String,
    /// User-supplied label.
    pub description: String,
    /// Number of instances attached to the group.
    pub instance_count: i64,
    /// Maximum number of rules the group may hold.
    pub max_rule_count: i64,
    /// Number of rules in the group.
    pub rule_count: i64,
}
