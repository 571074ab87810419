//! HTTP client utilities and retry logic.
//!
//! This module provides the [`ApiQuery`] capability consumed by facts modules,
//! its `reqwest` implementation [`ApiClient`], and the HTTP configuration and
//! retry policy used for reliable communication with the Vultr API.

use crate::config::VultrClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("vultr-core/", env!("CARGO_PKG_VERSION"));

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Retry settings

/// Default initial retry delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default maximum retry delay in milliseconds (for exponential backoff)
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 16_000;

/// Retry policy with exponential backoff.
///
/// Configures how HTTP requests should be retried on failure, using exponential
/// backoff to stay clear of the API rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,

    /// Backoff multiplier (typically 2 for exponential backoff)
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_API_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
        }
    }

    /// Create a retry policy with no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = min(initial_delay * multiplier^(attempt - 1), max_delay)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let multiplier = self.backoff_multiplier.saturating_pow(attempt - 1);
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(initial_ms.saturating_mul(u64::from(multiplier)));

        std::cmp::min(delay, self.max_delay)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
///
/// Configures connection pooling, retry backoff shape, and request logging.
/// Timeout and retry count are taken from [`VultrClientConfig`] when the
/// client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retry policy
    pub retry_policy: RetryPolicy,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable request logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retry_policy: RetryPolicy::new(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only access to the Vultr API.
///
/// Facts modules depend on this capability instead of a concrete transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiQuery: Send + Sync {
    /// Issue a GET for `path` and return the response object.
    ///
    /// Returns `None` when the API answers with an empty body, `null`, or an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns an error on transport, authentication, or API failures, or if
    /// the response is neither an object nor empty.
    async fn query(&self, path: &str) -> Result<Option<Map<String, Value>>>;
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    config: VultrClientConfig,
    http_config: ClientConfig,
}

impl ApiClientBuilder {
    /// Create a new builder from a [`VultrClientConfig`].
    #[must_use]
    pub fn new(config: VultrClientConfig) -> Self {
        Self {
            config,
            http_config: ClientConfig::new(),
        }
    }

    /// Override the HTTP client configuration used when building the client.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder and create the [`ApiClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured, the endpoint is invalid,
    /// or the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self.config.parse_endpoint()?;
        let timeout = self.config.timeout();

        let api_key = self.config.api_key.ok_or_else(|| {
            Error::ConfigError(format!(
                "No API key configured for account `{}`",
                self.config.api_account
            ))
        })?;

        let retry_policy = self
            .http_config
            .retry_policy
            .with_max_retries(self.config.api_retries);

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT))
            .gzip(self.http_config.enable_compression);

        if !self.config.tls_verify {
            warn!("TLS verification disabled for Vultr API client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build Vultr HTTP client: {err}"))
        })?;

        Ok(ApiClient {
            http,
            base_url,
            api_key,
            retry_policy,
            enable_logging: self.http_config.enable_logging,
        })
    }
}

/// Authenticated client for the Vultr v1 API.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    api_key: SecretString,
    retry_policy: RetryPolicy,
    enable_logging: bool,
}

impl ApiClient {
    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`ApiClientBuilder::build`].
    pub fn from_config(config: VultrClientConfig) -> Result<Self> {
        ApiClientBuilder::new(config).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: VultrClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the effective retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Append `path` to the endpoint, keeping any path prefix the endpoint carries.
    fn build_url(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidEndpoint(format!("Vultr API endpoint `{}` cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    async fn get_json(&self, path: &str) -> Result<Option<Value>> {
        let mut attempt = 0;
        #[allow(unused_assignments)]
        let mut last_error: Option<Error> = None;

        loop {
            let url = self.build_url(path)?;
            let request = self
                .http
                .get(url)
                .header("API-Key", self.api_key.expose_secret())
                .header("Accept", "application/json");

            if self.enable_logging {
                info!(path = %path, attempt, "Sending Vultr API request");
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body = response.text().await.map_err(Error::from)?;
                        return parse_body(path, &body);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    let error = map_status_to_error(status, message);
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(err) => {
                    let error = Error::from(err);
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }

            attempt += 1;
            if attempt > self.retry_policy.max_retries {
                break;
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            if delay > Duration::from_millis(0) {
                debug!("Retrying Vultr API request after {:?}", delay);
                sleep(delay).await;
            }
        }

        if let Some(error) = last_error {
            Err(error)
        } else {
            Err(Error::ServiceUnavailable(
                "Vultr API request failed after retries".to_string(),
            ))
        }
    }
}

#[async_trait]
impl ApiQuery for ApiClient {
    async fn query(&self, path: &str) -> Result<Option<Map<String, Value>>> {
        let value = self.get_json(path).await?;
        into_mapping(path, value)
    }
}

fn parse_body(path: &str, body: &str) -> Result<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(body).map(Some).map_err(|err| {
        Error::ParseError(format!("Failed to parse response for `{path}`: {err}"))
    })
}

fn into_mapping(path: &str, value: Option<Value>) -> Result<Option<Map<String, Value>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(Error::ParseError(format!(
            "Expected an object from `{path}`, got {other}"
        ))),
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("Vultr API authentication failed: {text}"))
        }
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Vultr API temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Vultr API server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("Vultr API error {status}: {text}")),
    }
}
