//! Facts result builder.
//!
//! Every facts module reports its records under a namespace key, both at the
//! top level of the result and inside `ansible_facts`, next to the connection
//! parameters it used.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Connection parameters echoed back under `vultr_api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// Account name used to select the key
    pub api_account: String,
    /// Request timeout in seconds
    pub api_timeout: u64,
    /// Maximum retry attempts
    pub api_retries: u32,
    /// API endpoint
    pub api_endpoint: String,
}

/// Successful module result.
#[derive(Debug, Clone, PartialEq)]
pub struct FactsResult {
    namespace: String,
    api: ApiInfo,
    facts: Value,
}

impl FactsResult {
    /// Build a result carrying `facts` under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if `facts` cannot be serialized to JSON.
    pub fn new<T>(namespace: impl Into<String>, api: ApiInfo, facts: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self {
            namespace: namespace.into(),
            api,
            facts: serde_json::to_value(facts)?,
        })
    }

    /// Namespace key the facts are reported under.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The serialized facts.
    #[must_use]
    pub const fn facts(&self) -> &Value {
        &self.facts
    }

    /// Render the full result document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut ansible_facts = Map::new();
        ansible_facts.insert(self.namespace.clone(), self.facts.clone());

        let mut result = Map::new();
        result.insert("changed".to_string(), Value::Bool(false));
        result.insert(
            "vultr_api".to_string(),
            serde_json::json!({
                "api_account": self.api.api_account,
                "api_timeout": self.api.api_timeout,
                "api_retries": self.api.api_retries,
                "api_endpoint": self.api.api_endpoint,
            }),
        );
        result.insert(self.namespace.clone(), self.facts.clone());
        result.insert("ansible_facts".to_string(), Value::Object(ansible_facts));
        Value::Object(result)
    }
}

/// Failed module result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureResult {
    /// Always true
    pub failed: bool,
    /// Human-readable reason
    pub msg: String,
}

impl FailureResult {
    /// Build a failure result from any displayable error.
    #[must_use]
    pub fn new(msg: impl std::fmt::Display) -> Self {
        Self {
            failed: true,
            msg: msg.to_string(),
        }
    }

    /// Render the failure document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "failed": self.failed,
            "msg": self.msg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_info() -> ApiInfo {
        ApiInfo {
            api_account: "default".to_string(),
            api_timeout: 60,
            api_retries: 5,
            api_endpoint: "https://api.vultr.com".to_string(),
        }
    }

    #[test]
    fn facts_result_layout() {
        let result = FactsResult::new("vultr_thing_facts", api_info(), &vec![json!({"id": "a"})])
            .unwrap()
            .to_json();

        assert_eq!(
            result,
            json!({
                "changed": false,
                "vultr_api": {
                    "api_account": "default",
                    "api_timeout": 60,
                    "api_retries": 5,
                    "api_endpoint": "https://api.vultr.com"
                },
                "vultr_thing_facts": [{"id": "a"}],
                "ansible_facts": {"vultr_thing_facts": [{"id": "a"}]}
            })
        );
    }

    #[test]
    fn facts_result_empty_list_stays_a_list() {
        let empty: Vec<Value> = Vec::new();
        let result = FactsResult::new("vultr_thing_facts", api_info(), &empty).unwrap();
        assert_eq!(result.facts(), &json!([]));
        assert_eq!(result.namespace(), "vultr_thing_facts");
        assert_eq!(result.to_json()["ansible_facts"]["vultr_thing_facts"], json!([]));
    }

    #[test]
    fn failure_result_serialization() {
        let failure = FailureResult::new(crate::Error::Unauthorized("bad key".to_string()));
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({"failed": true, "msg": "Unauthorized: bad key"})
        );
        assert_eq!(failure.to_json(), serde_json::to_value(&failure).unwrap());
    }
}
