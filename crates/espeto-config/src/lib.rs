//! Configuration module for the espeto order service.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files with
//! `${VAR}` environment variable resolution and validates that all required
//! configuration values are properly set before the service starts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the order service.
///
/// Contains all sections required for the service to operate: shop identity,
/// order lifecycle parameters, the store backend, the chat transports and the
/// HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Shop-facing values used in chat replies.
	pub service: ServiceConfig,
	/// Order lifecycle parameters.
	#[serde(default)]
	pub orders: OrdersConfig,
	/// Configuration for the order store backend.
	pub store: StoreConfig,
	/// Configuration for the chat transports.
	pub chat: ChatConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Shop-facing values used in chat replies.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Public URL of the digital menu, included in replies.
	pub menu_url: String,
	/// Contact string shown to customers.
	pub contact: String,
}

/// Order lifecycle parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
	/// Maximum active (non-cancelled) orders per customer.
	#[serde(default = "default_max_active_per_customer")]
	pub max_active_per_customer: usize,
	/// Minutes of inactivity after which an order expires.
	#[serde(default = "default_timeout_minutes")]
	pub timeout_minutes: u64,
	/// Interval in seconds between expiry sweeps.
	#[serde(default = "default_sweep_interval_seconds")]
	pub sweep_interval_seconds: u64,
}

impl Default for OrdersConfig {
	fn default() -> Self {
		Self {
			max_active_per_customer: default_max_active_per_customer(),
			timeout_minutes: default_timeout_minutes(),
			sweep_interval_seconds: default_sweep_interval_seconds(),
		}
	}
}

/// Returns the default per-customer active-order limit.
fn default_max_active_per_customer() -> usize {
	3
}

/// Returns the default order timeout in minutes.
fn default_timeout_minutes() -> u64 {
	30
}

/// Returns the default sweep interval in seconds.
fn default_sweep_interval_seconds() -> u64 {
	300 // every 5 minutes
}

/// Configuration for the order store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of store implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the chat transports.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
	/// Inbound message source configuration.
	pub inbound: SeamConfig,
	/// Outbound message sink configuration.
	pub outbound: SeamConfig,
}

/// Configuration for one pluggable seam.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeamConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to. When the port is taken the server retries
	/// once on the next port.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

/// Returns the default API enablement.
fn default_api_enabled() -> bool {
	true
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable
/// VAR_NAME. Supports default values with `${VAR_NAME:-default_value}`.
/// Input is capped at 1 MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment variables are resolved and the configuration is validated
	/// after parsing.
	pub fn from_file(path: &str) -> Result<Self, ConfigError> {
		let contents = std::fs::read_to_string(path)?;
		contents.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - Shop values (menu URL, contact) must be non-empty
	/// - Lifecycle bounds: limit >= 1, timeout >= 1 minute, sweep interval
	///   within 1..=86400 seconds
	/// - Every seam's primary implementation must exist in its map
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.menu_url.is_empty() {
			return Err(ConfigError::Validation("menu_url cannot be empty".into()));
		}
		if self.service.contact.is_empty() {
			return Err(ConfigError::Validation("contact cannot be empty".into()));
		}

		if self.orders.max_active_per_customer == 0 {
			return Err(ConfigError::Validation(
				"max_active_per_customer must be at least 1".into(),
			));
		}
		if self.orders.timeout_minutes == 0 {
			return Err(ConfigError::Validation(
				"timeout_minutes must be at least 1".into(),
			));
		}
		if self.orders.sweep_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"sweep_interval_seconds must be greater than 0".into(),
			));
		}
		if self.orders.sweep_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"sweep_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		validate_seam("store", &self.store.primary, &self.store.implementations)?;
		validate_seam(
			"chat.inbound",
			&self.chat.inbound.primary,
			&self.chat.inbound.implementations,
		)?;
		validate_seam(
			"chat.outbound",
			&self.chat.outbound.primary,
			&self.chat.outbound.implementations,
		)?;

		Ok(())
	}
}

/// Checks that a seam names a primary implementation that is configured.
fn validate_seam(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} implementation '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
