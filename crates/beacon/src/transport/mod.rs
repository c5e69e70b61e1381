// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transports deliver envelopes and report what happened as a [`SendResult`].

mod http;
mod native;

use std::time::Duration;

use beacon_core::Envelope;

use crate::error::TransportError;

pub use http::HttpTransport;
pub use native::{CaptureOptions, NativeModule, NativeSdkOptions, NativeTransport};

/// Outcome of a single transport send.
#[derive(Debug)]
pub enum SendResult {
	/// The envelope was accepted by the endpoint or native module.
	Delivered,
	/// The transport failed before anything left the process.
	///
	/// This is the only failure after which buffered outcomes are retried.
	ConstructionFailed(TransportError),
	/// The transport accepted the envelope but delivery failed.
	DeliveryFailed(TransportError),
}

impl SendResult {
	pub fn is_delivered(&self) -> bool {
		matches!(self, SendResult::Delivered)
	}
}

/// A destination for encoded envelopes.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	/// Short name used in logs.
	fn name(&self) -> &'static str;

	/// Sends one envelope. Every failure is classified in the result.
	async fn send(&self, envelope: Envelope) -> SendResult;

	/// Waits for transport-internal work to finish. Returns false on timeout.
	async fn flush(&self, _timeout: Duration) -> bool {
		true
	}
}
