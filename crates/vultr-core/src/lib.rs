//! # vultr-core
//!
//! Core types and utilities shared by Vultr facts modules.
//!
//! This crate provides error handling, configuration, the authenticated HTTP
//! client, and the result builder that facts modules report through.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`config`] - Module arguments and resolved client configuration
//! - [`client`] - The [`ApiQuery`] capability, HTTP client, and retry logic
//! - [`facts`] - Facts and failure result documents

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod facts;

// Re-export commonly used types
pub use client::{ApiClient, ApiClientBuilder, ApiQuery};
pub use config::{ModuleArgs, VultrClientConfig};
pub use error::{Error, Result};
pub use facts::{ApiInfo, FactsResult, FailureResult};
