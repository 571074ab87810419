//! Module invocation: parameters in, facts result out.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use vultr_core::{ApiClient, FactsResult, ModuleArgs, VultrClientConfig};
use vultr_firewall::{FirewallGroupLister, FACTS_NAMESPACE};

/// Run the module against a JSON parameter blob, resolving unset values
/// from the process environment.
pub async fn run(input: &str) -> anyhow::Result<FactsResult> {
    run_with_env(input, |name| std::env::var(name).ok()).await
}

/// Run the module, consulting `env` for values the parameters leave unset.
pub async fn run_with_env<F>(input: &str, env: F) -> anyhow::Result<FactsResult>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = if input.trim().is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(input).context("Module arguments are not valid JSON")?
    };

    let args = ModuleArgs::from_json(raw)?;
    let config = VultrClientConfig::from_args_with_env(args, env)?;
    let api_info = config.api_info();

    info!(
        account = %api_info.api_account,
        endpoint = %api_info.api_endpoint,
        "Gathering Vultr firewall group facts"
    );

    let client = ApiClient::from_config(config)?;
    let lister = FirewallGroupLister::new(Arc::new(client));
    let groups = lister.list_groups().await?;

    Ok(FactsResult::new(FACTS_NAMESPACE, api_info, &groups)?)
}
