// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration.

use std::time::Duration;

use beacon_common_http::RetryConfig;
use beacon_core::Platform;

/// Default number of envelopes the HTTP transport sends concurrently.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 30;

pub const ENV_DSN: &str = "BEACON_DSN";
pub const ENV_RELEASE: &str = "BEACON_RELEASE";
pub const ENV_ENVIRONMENT: &str = "BEACON_ENVIRONMENT";
pub const ENV_SEND_CLIENT_REPORTS: &str = "BEACON_SEND_CLIENT_REPORTS";
pub const ENV_ENABLE_NATIVE: &str = "BEACON_ENABLE_NATIVE";

/// Options read by the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct ClientOptions {
	/// Where envelopes go. Without one, only the native transport can send.
	pub dsn: Option<String>,
	pub release: Option<String>,
	pub environment: Option<String>,
	/// Attach a client report summarizing dropped events to outgoing envelopes.
	pub send_client_reports: bool,
	/// Prefer the native bridge when the native module is linked.
	pub enable_native: bool,
	pub platform: Platform,
	/// Maximum concurrent HTTP sends before new envelopes are dropped.
	pub max_queue_size: usize,
	pub request_timeout: Duration,
	pub retry_config: RetryConfig,
	/// Default wait used by `close`.
	pub shutdown_timeout: Duration,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			dsn: None,
			release: None,
			environment: None,
			send_client_reports: true,
			enable_native: true,
			platform: Platform::default(),
			max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
			request_timeout: Duration::from_secs(30),
			retry_config: RetryConfig::default(),
			shutdown_timeout: Duration::from_secs(2),
		}
	}
}

impl ClientOptions {
	/// Defaults overridden by `BEACON_*` environment variables.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut options = Self::default();
		let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		options.dsn = non_empty(ENV_DSN);
		options.release = non_empty(ENV_RELEASE);
		options.environment = non_empty(ENV_ENVIRONMENT);
		if let Some(flag) = non_empty(ENV_SEND_CLIENT_REPORTS).and_then(|v| parse_flag(&v)) {
			options.send_client_reports = flag;
		}
		if let Some(flag) = non_empty(ENV_ENABLE_NATIVE).and_then(|v| parse_flag(&v)) {
			options.enable_native = flag;
		}
		options
	}
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}
