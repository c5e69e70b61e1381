// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Beacon SDK.

use beacon_common_http::RetryableError;
use beacon_core::BeaconError;
use thiserror::Error;

/// Result type alias for SDK setup operations.
pub type Result<T> = std::result::Result<T, BeaconSdkError>;

/// Errors returned while configuring or building a client.
///
/// Dispatch failures never surface as this type; they are logged.
#[derive(Debug, Error)]
pub enum BeaconSdkError {
	/// The DSN could not be parsed.
	#[error("invalid DSN: {0}")]
	InvalidDsn(#[from] BeaconError),

	/// The HTTP client could not be built.
	#[error("HTTP client error: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// A transport could not be set up.
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),
}

/// Failure reported by the in-process native module.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct NativeError(pub String);

impl NativeError {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Why a transport could not deliver an envelope.
#[derive(Debug, Error)]
pub enum TransportError {
	/// No transport is configured for this client.
	#[error("no transport available (missing DSN or native module)")]
	Unavailable,

	/// The native transport was selected but the module is not loaded.
	#[error("native module is not available")]
	NativeModuleUnavailable,

	/// The envelope could not be serialized.
	#[error("failed to encode envelope: {0}")]
	Encode(#[from] BeaconError),

	/// The outgoing request could not be built.
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	/// No async runtime was available to run the send.
	#[error("no tokio runtime available to send envelope")]
	NoRuntime,

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The endpoint rejected the envelope.
	#[error("server error (status {status}): {message}")]
	ServerError { status: u16, message: String },

	/// The endpoint asked us to back off.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },

	/// Too many sends already in flight.
	#[error("transport buffer is full")]
	QueueOverflow,

	/// The native module rejected the envelope.
	#[error("native transport failed: {0}")]
	Native(#[from] NativeError),
}

impl RetryableError for TransportError {
	fn is_retryable(&self) -> bool {
		match self {
			TransportError::RequestFailed(e) => e.is_retryable(),
			TransportError::ServerError { status, .. } => {
				matches!(*status, 408 | 500 | 502 | 503 | 504)
			}
			_ => false,
		}
	}
}
