// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery through the in-process native SDK instead of the network.
//!
//! The native side persists envelopes to disk when asked to (`store`), which
//! lets crash envelopes survive an immediate process termination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use beacon_core::{
	encode_envelope, prepare_for_native, EncodedEnvelope, Envelope, EnvelopeItem, ItemPayload,
	ItemType, Platform,
};
use serde::Serialize;
use tracing::{debug, warn};

use super::{SendResult, Transport};
use crate::error::{NativeError, TransportError};

/// Options passed alongside envelope bytes to the native module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureOptions {
	/// Persist the envelope before attempting delivery.
	pub store: bool,
}

/// Options used to start the native SDK.
///
/// Callbacks and integrations never cross the bridge; only plain values do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeSdkOptions {
	pub dsn: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub release: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
	pub send_client_reports: bool,
}

/// The capability surface of the native counterpart.
#[async_trait::async_trait]
pub trait NativeModule: Send + Sync {
	/// Hands a fully encoded envelope to the native SDK.
	async fn capture_envelope(
		&self,
		bytes: Vec<u8>,
		options: CaptureOptions,
	) -> std::result::Result<(), NativeError>;

	/// Starts the native SDK. Returns whether it is ready to accept envelopes.
	async fn init_native_sdk(
		&self,
		options: &NativeSdkOptions,
	) -> std::result::Result<bool, NativeError>;

	async fn close_native_sdk(&self) -> std::result::Result<(), NativeError>;

	async fn did_crash_last_launch(&self) -> std::result::Result<bool, NativeError>;

	/// Triggers a native crash. Test builds only.
	fn crash(&self);
}

/// Transport backed by a [`NativeModule`].
pub struct NativeTransport {
	module: Option<Arc<dyn NativeModule>>,
	enabled: bool,
	platform: Platform,
	ready: AtomicBool,
}

impl NativeTransport {
	pub fn new(module: Option<Arc<dyn NativeModule>>, enabled: bool, platform: Platform) -> Self {
		Self {
			module,
			enabled,
			platform,
			ready: AtomicBool::new(false),
		}
	}

	/// True when native delivery is enabled and the module is linked.
	pub fn is_available(&self) -> bool {
		self.enabled && self.module.is_some()
	}

	/// True once [`NativeTransport::init`] reported the native SDK ready.
	pub fn is_ready(&self) -> bool {
		self.ready.load(Ordering::SeqCst)
	}

	fn module(&self) -> Option<&Arc<dyn NativeModule>> {
		if self.enabled {
			self.module.as_ref()
		} else {
			None
		}
	}

	/// Starts the native SDK and records its readiness.
	pub async fn init(&self, options: &NativeSdkOptions) -> Result<bool, TransportError> {
		let module = self.module().ok_or(TransportError::NativeModuleUnavailable)?;
		let ready = module.init_native_sdk(options).await?;
		self.ready.store(ready, Ordering::SeqCst);
		debug!(ready, "Native SDK initialized");
		Ok(ready)
	}

	/// Closes the native SDK. Failures are logged.
	pub async fn close(&self) {
		let Some(module) = self.module() else {
			return;
		};
		if let Err(e) = module.close_native_sdk().await {
			warn!(error = %e, "Failed to close native SDK");
		}
		self.ready.store(false, Ordering::SeqCst);
	}

	/// Whether the previous run of the app ended in a native crash.
	pub async fn did_crash_last_launch(&self) -> bool {
		let Some(module) = self.module() else {
			return false;
		};
		match module.did_crash_last_launch().await {
			Ok(crashed) => crashed,
			Err(e) => {
				warn!(error = %e, "Failed to query last launch crash state");
				false
			}
		}
	}

	pub fn crash(&self) {
		if let Some(module) = self.module() {
			module.crash();
		}
	}

	fn process_item(&self, item: EnvelopeItem) -> EnvelopeItem {
		match (item.header.item_type, item.payload) {
			(ItemType::Event | ItemType::Transaction, ItemPayload::Json(event)) => EnvelopeItem::new(
				item.header,
				ItemPayload::Json(prepare_for_native(event, self.platform)),
			),
			(_, payload) => EnvelopeItem::new(item.header, payload),
		}
	}

	/// Applies native item processing and encodes the result.
	pub fn encode(&self, envelope: Envelope) -> Result<EncodedEnvelope, TransportError> {
		let processed = Envelope {
			header: envelope.header,
			items: envelope
				.items
				.into_iter()
				.map(|item| self.process_item(item))
				.collect(),
		};
		Ok(encode_envelope(&processed)?)
	}
}

#[async_trait::async_trait]
impl Transport for NativeTransport {
	fn name(&self) -> &'static str {
		"native"
	}

	async fn send(&self, envelope: Envelope) -> SendResult {
		let Some(module) = self.module() else {
			return SendResult::DeliveryFailed(TransportError::NativeModuleUnavailable);
		};

		let encoded = match self.encode(envelope) {
			Ok(encoded) => encoded,
			Err(e) => return SendResult::ConstructionFailed(e),
		};

		let options = CaptureOptions {
			store: encoded.hard_crash,
		};
		debug!(
			bytes = encoded.bytes.len(),
			store = options.store,
			"Sending envelope to native SDK"
		);

		match module.capture_envelope(encoded.bytes, options).await {
			Ok(()) => SendResult::Delivered,
			Err(e) => SendResult::DeliveryFailed(TransportError::Native(e)),
		}
	}
}
