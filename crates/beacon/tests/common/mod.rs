// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures for the dispatch integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use beacon::{
	CaptureOptions, Envelope, NativeError, NativeModule, NativeSdkOptions, SendResult, Transport,
	TransportError,
};
use beacon_core::{ItemPayload, ItemType};
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Log line captured by [`CapturingLayer`].
#[derive(Debug, Clone)]
pub struct CapturedLog {
	pub level: Level,
	pub message: String,
}

/// Tracing layer that keeps every event it sees.
#[derive(Clone, Default)]
pub struct CapturingLayer {
	logs: Arc<Mutex<Vec<CapturedLog>>>,
}

impl CapturingLayer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn logs(&self) -> Vec<CapturedLog> {
		self.logs.lock().unwrap().clone()
	}

	/// Events at WARN or above.
	pub fn warnings(&self) -> Vec<CapturedLog> {
		self.logs()
			.into_iter()
			.filter(|log| log.level <= Level::WARN)
			.collect()
	}
}

impl<S: Subscriber> Layer<S> for CapturingLayer {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);
		self.logs.lock().unwrap().push(CapturedLog {
			level: *event.metadata().level(),
			message: visitor.message,
		});
	}
}

#[derive(Default)]
struct MessageVisitor {
	message: String,
}

impl Visit for MessageVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{value:?}");
		}
	}
}

/// How [`RecordingTransport`] answers each send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
	Deliver,
	FailConstruction,
	FailDelivery,
}

/// Transport that keeps every envelope it is handed.
pub struct RecordingTransport {
	behavior: Mutex<Behavior>,
	sent: Mutex<Vec<Envelope>>,
}

impl RecordingTransport {
	pub fn new(behavior: Behavior) -> Arc<Self> {
		Arc::new(Self {
			behavior: Mutex::new(behavior),
			sent: Mutex::new(Vec::new()),
		})
	}

	pub fn set_behavior(&self, behavior: Behavior) {
		*self.behavior.lock().unwrap() = behavior;
	}

	pub fn sent(&self) -> Vec<Envelope> {
		self.sent.lock().unwrap().clone()
	}
}

#[async_trait]
impl Transport for RecordingTransport {
	fn name(&self) -> &'static str {
		"recording"
	}

	async fn send(&self, envelope: Envelope) -> SendResult {
		self.sent.lock().unwrap().push(envelope);
		match *self.behavior.lock().unwrap() {
			Behavior::Deliver => SendResult::Delivered,
			Behavior::FailConstruction => SendResult::ConstructionFailed(
				TransportError::InvalidRequest("request could not be built".to_string()),
			),
			Behavior::FailDelivery => SendResult::DeliveryFailed(TransportError::ServerError {
				status: 503,
				message: "unavailable".to_string(),
			}),
		}
	}
}

/// Native module double that records capture calls.
#[derive(Default)]
pub struct MockNativeModule {
	pub captured: Mutex<Vec<(Vec<u8>, CaptureOptions)>>,
	pub init_options: Mutex<Option<NativeSdkOptions>>,
	pub closed: AtomicBool,
	pub crashed_last_launch: AtomicBool,
}

impl MockNativeModule {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn captured(&self) -> Vec<(Vec<u8>, CaptureOptions)> {
		self.captured.lock().unwrap().clone()
	}
}

#[async_trait]
impl NativeModule for MockNativeModule {
	async fn capture_envelope(
		&self,
		bytes: Vec<u8>,
		options: CaptureOptions,
	) -> Result<(), NativeError> {
		self.captured.lock().unwrap().push((bytes, options));
		Ok(())
	}

	async fn init_native_sdk(&self, options: &NativeSdkOptions) -> Result<bool, NativeError> {
		*self.init_options.lock().unwrap() = Some(options.clone());
		Ok(true)
	}

	async fn close_native_sdk(&self) -> Result<(), NativeError> {
		self.closed.store(true, Ordering::SeqCst);
		Ok(())
	}

	async fn did_crash_last_launch(&self) -> Result<bool, NativeError> {
		Ok(self.crashed_last_launch.load(Ordering::SeqCst))
	}

	fn crash(&self) {}
}

/// JSON payload of the `client_report` item, if the envelope has one.
pub fn client_report(envelope: &Envelope) -> Option<Value> {
	let reports: Vec<&Value> = envelope
		.items
		.iter()
		.filter(|item| item.item_type() == ItemType::ClientReport)
		.filter_map(|item| match &item.payload {
			ItemPayload::Json(value) => Some(value),
			_ => None,
		})
		.collect();
	assert!(reports.len() <= 1, "at most one client report per envelope");
	reports.first().map(|v| (*v).clone())
}
