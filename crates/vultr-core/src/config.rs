//! Configuration structures for Vultr clients.
//!
//! This module provides the module arguments shared by all Vultr facts
//! modules and the resolved, validated client configuration built from it.

use crate::facts::ApiInfo;
use crate::Error;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default Vultr API endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.vultr.com";

/// Default account name reported back in the `vultr_api` result.
pub const DEFAULT_API_ACCOUNT: &str = "default";

/// Default request timeout in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 60;

/// Default number of retries for rate-limited or failing requests.
pub const DEFAULT_API_RETRIES: u32 = 5;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "VULTR_API_KEY";
/// Environment variable holding the account name.
pub const ENV_API_ACCOUNT: &str = "VULTR_API_ACCOUNT";
/// Environment variable holding the request timeout.
pub const ENV_API_TIMEOUT: &str = "VULTR_API_TIMEOUT";
/// Environment variable holding the retry count.
pub const ENV_API_RETRIES: &str = "VULTR_API_RETRIES";
/// Environment variable holding the API endpoint.
pub const ENV_API_ENDPOINT: &str = "VULTR_API_ENDPOINT";

const WRAPPED_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";
const INTERNAL_ARG_PREFIX: &str = "_ansible_";

/// Arguments accepted by every Vultr facts module.
///
/// Unset values fall back to the environment and then to the defaults above
/// when resolved into a [`VultrClientConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleArgs {
    /// API key used for the `API-Key` header
    pub api_key: Option<String>,

    /// Account name, echoed back for diagnostics
    pub api_account: Option<String>,

    /// Request timeout in seconds
    pub api_timeout: Option<u64>,

    /// Maximum number of retry attempts
    pub api_retries: Option<u32>,

    /// API base URL
    pub api_endpoint: Option<String>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_validate_certs")]
    pub validate_certs: bool,
}

const fn default_validate_certs() -> bool {
    true
}

impl ModuleArgs {
    /// Parse module arguments from the JSON blob handed over by the host.
    ///
    /// Accepts both the bare parameter object and one wrapped in
    /// `ANSIBLE_MODULE_ARGS`. Host-internal `_ansible_*` keys are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not an object or contains unsupported
    /// parameters.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(Error::ConfigError(format!(
                    "Module arguments must be a JSON object, got {other}"
                )))
            }
        };

        if let Some(wrapped) = object.remove(WRAPPED_ARGS_KEY) {
            return Self::from_json(wrapped);
        }

        let params: Map<String, Value> = object
            .into_iter()
            .filter(|(key, _)| !key.starts_with(INTERNAL_ARG_PREFIX))
            .collect();

        serde_json::from_value(Value::Object(params))
            .map_err(|e| Error::ConfigError(format!("Unsupported parameters: {e}")))
    }
}

/// Resolved configuration for a Vultr API client.
#[derive(Debug, Validate)]
pub struct VultrClientConfig {
    /// API base URL
    #[validate(url)]
    pub api_endpoint: String,

    /// API key, kept out of debug output
    pub api_key: Option<SecretString>,

    /// Account name
    pub api_account: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub api_timeout_secs: u64,

    /// Maximum number of retry attempts
    #[validate(range(min = 0, max = 10))]
    pub api_retries: u32,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,
}

impl VultrClientConfig {
    /// Create a configuration for the given endpoint with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(api_endpoint: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            api_endpoint: api_endpoint.into(),
            api_key: None,
            api_account: DEFAULT_API_ACCOUNT.to_string(),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            api_retries: DEFAULT_API_RETRIES,
            tls_verify: true,
        };

        config.validate()?;

        Ok(config)
    }

    /// Resolve module arguments against the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value is malformed or validation fails.
    pub fn from_args(args: ModuleArgs) -> Result<Self, Error> {
        Self::from_args_with_env(args, |name| std::env::var(name).ok())
    }

    /// Resolve module arguments, consulting `env` for any value left unset.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value is malformed or validation fails.
    pub fn from_args_with_env<F>(args: ModuleArgs, env: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_timeout_secs = match args.api_timeout {
            Some(timeout) => timeout,
            None => parse_env(&env, ENV_API_TIMEOUT)?.unwrap_or(DEFAULT_API_TIMEOUT_SECS),
        };

        let api_retries = match args.api_retries {
            Some(retries) => retries,
            None => parse_env(&env, ENV_API_RETRIES)?.unwrap_or(DEFAULT_API_RETRIES),
        };

        let config = Self {
            api_endpoint: args
                .api_endpoint
                .or_else(|| env(ENV_API_ENDPOINT))
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            api_key: args.api_key.or_else(|| env(ENV_API_KEY)).map(SecretString::from),
            api_account: args
                .api_account
                .or_else(|| env(ENV_API_ACCOUNT))
                .unwrap_or_else(|| DEFAULT_API_ACCOUNT.to_string()),
            api_timeout_secs,
            api_retries,
            tls_verify: args.validate_certs,
        };

        config.validate()?;

        Ok(config)
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Set the account name.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.api_account = account.into();
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.api_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.api_retries = retries;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Parse and validate the API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_endpoint(&self) -> Result<Url, Error> {
        Url::parse(&self.api_endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid API endpoint: {e}")))
    }

    /// Connection parameters echoed back in the module result.
    #[must_use]
    pub fn api_info(&self) -> ApiInfo {
        ApiInfo {
            api_account: self.api_account.clone(),
            api_timeout: self.api_timeout_secs,
            api_retries: self.api_retries,
            api_endpoint: self.api_endpoint.clone(),
        }
    }
}

fn parse_env<F, T>(env: &F, name: &str) -> Result<Option<T>, Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::ConfigError(format!("Invalid {name} `{raw}`: {e}")))
        })
        .transpose()
}
