//! Firewall group lister.

use crate::models::FirewallGroupRecord;
use crate::normalize::normalize_firewall_groups;
use crate::Result;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use vultr_core::ApiQuery;

/// API path listing every firewall group of the account.
pub const FIREWALL_GROUP_LIST_PATH: &str = "/v1/firewall/group_list";

/// Key the records are reported under.
pub const FACTS_NAMESPACE: &str = "vultr_firewall_group_facts";

/// Lists the firewall groups of an account through an injected [`ApiQuery`].
#[derive(Clone)]
pub struct FirewallGroupLister {
    api: Arc<dyn ApiQuery>,
}

impl FirewallGroupLister {
    /// Create a lister over an API capability.
    #[must_use]
    pub fn new(api: Arc<dyn ApiQuery>) -> Self {
        Self { api }
    }

    /// Fetch the raw group listing, keyed by group id.
    pub async fn fetch_groups(&self) -> Result<Option<Map<String, Value>>> {
        self.api.query(FIREWALL_GROUP_LIST_PATH).await
    }

    /// Fetch and normalize the group listing.
    pub async fn list_groups(&self) -> Result<Vec<FirewallGroupRecord>> {
        let raw = self.fetch_groups().await?;
        let groups = normalize_firewall_groups(raw.as_ref())?;
        debug!(count = groups.len(), "Normalized firewall groups");
        Ok(groups)
    }
}
