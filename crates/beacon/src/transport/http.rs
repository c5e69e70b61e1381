// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network delivery of encoded envelopes.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use beacon_common_http::{retry, RetryConfig, SDK_NAME, SDK_VERSION};
use beacon_core::{encode_envelope, Dsn, Envelope};
use reqwest::header::{HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::{SendResult, Transport};
use crate::error::TransportError;

const ENVELOPE_CONTENT_TYPE: &str = "application/x-beacon-envelope";
const AUTH_HEADER: &str = "X-Beacon-Auth";

/// Backoff applied after a 429 without a usable `Retry-After`.
const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// Upper bound on any server-requested backoff.
const MAX_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// `acquire_many` takes a `u32` and the semaphore has its own permit limit.
const MAX_IN_FLIGHT: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
	Semaphore::MAX_PERMITS
} else {
	u32::MAX as usize
};

/// Posts envelopes to the DSN's envelope endpoint.
pub struct HttpTransport {
	client: Client,
	url: String,
	auth: HeaderValue,
	retry_config: RetryConfig,
	in_flight: Semaphore,
	max_in_flight: u32,
	disabled_until: Mutex<Option<Instant>>,
}

impl HttpTransport {
	/// Creates a transport for `dsn` allowing at most `max_queue_size`
	/// concurrent sends. The size is clamped to at least one.
	pub fn new(
		client: Client,
		dsn: &Dsn,
		retry_config: RetryConfig,
		max_queue_size: usize,
	) -> Result<Self, TransportError> {
		let client_name = format!("{SDK_NAME}/{SDK_VERSION}");
		let auth = HeaderValue::from_str(&dsn.auth_header(&client_name))
			.map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
		let max_in_flight = max_queue_size.clamp(1, MAX_IN_FLIGHT);

		Ok(Self {
			client,
			url: dsn.envelope_url(),
			auth,
			retry_config,
			in_flight: Semaphore::new(max_in_flight),
			max_in_flight: max_in_flight as u32,
			disabled_until: Mutex::new(None),
		})
	}

	/// Remaining backoff requested by the endpoint, if any.
	fn backoff_remaining(&self) -> Option<Duration> {
		let mut guard = self.disabled_until.lock().unwrap_or_else(|e| e.into_inner());
		match *guard {
			Some(until) => {
				let now = Instant::now();
				if until > now {
					Some(until - now)
				} else {
					*guard = None;
					None
				}
			}
			None => None,
		}
	}

	fn back_off(&self, retry_after: Duration) {
		let mut guard = self.disabled_until.lock().unwrap_or_else(|e| e.into_inner());
		let now = Instant::now();
		let until = now
			.checked_add(retry_after.min(MAX_RATE_LIMIT_BACKOFF))
			.unwrap_or(now + DEFAULT_RATE_LIMIT_BACKOFF);
		*guard = Some(until);
	}

	async fn post(&self, body: Vec<u8>) -> Result<(), TransportError> {
		let client = &self.client;
		let url = self.url.as_str();
		let auth = &self.auth;
		let body = &body;

		let response = retry(&self.retry_config, || async move {
			let response = client
				.post(url)
				.header(CONTENT_TYPE, ENVELOPE_CONTENT_TYPE)
				.header(AUTH_HEADER, auth.clone())
				.body(body.clone())
				.send()
				.await?;

			let status = response.status();
			if status.is_success() || status == StatusCode::TOO_MANY_REQUESTS {
				return Ok::<_, TransportError>(response);
			}
			let message = response.text().await.unwrap_or_default();
			Err(TransportError::ServerError {
				status: status.as_u16(),
				message,
			})
		})
		.await?;

		if response.status() == StatusCode::TOO_MANY_REQUESTS {
			let retry_after_secs = response
				.headers()
				.get(RETRY_AFTER)
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.trim().parse::<u64>().ok());
			self.back_off(
				retry_after_secs
					.map(Duration::from_secs)
					.unwrap_or(DEFAULT_RATE_LIMIT_BACKOFF),
			);
			return Err(TransportError::RateLimited { retry_after_secs });
		}

		Ok(())
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	fn name(&self) -> &'static str {
		"http"
	}

	async fn send(&self, envelope: Envelope) -> SendResult {
		let body = match encode_envelope(&envelope) {
			Ok(encoded) => encoded.bytes,
			Err(e) => return SendResult::ConstructionFailed(e.into()),
		};

		if let Some(remaining) = self.backoff_remaining() {
			return SendResult::DeliveryFailed(TransportError::RateLimited {
				retry_after_secs: Some(remaining.as_secs()),
			});
		}

		let Ok(_permit) = self.in_flight.try_acquire() else {
			return SendResult::DeliveryFailed(TransportError::QueueOverflow);
		};

		debug!(url = %self.url, bytes = body.len(), "Posting envelope");

		match self.post(body).await {
			Ok(()) => SendResult::Delivered,
			Err(TransportError::RequestFailed(e)) if e.is_builder() => {
				SendResult::ConstructionFailed(TransportError::RequestFailed(e))
			}
			Err(e) => SendResult::DeliveryFailed(e),
		}
	}

	async fn flush(&self, timeout: Duration) -> bool {
		let wait_all = self.in_flight.acquire_many(self.max_in_flight);
		match tokio::time::timeout(timeout, wait_all).await {
			Ok(Ok(_permits)) => true,
			Ok(Err(_)) => true,
			Err(_) => {
				warn!(timeout_ms = timeout.as_millis() as u64, "Timed out flushing HTTP transport");
				false
			}
		}
	}
}
