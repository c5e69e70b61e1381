// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The dispatch client: turns captured telemetry into envelopes, picks a
//! transport and keeps outcome accounting consistent across sends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use beacon_common_http::{RetryConfig, SDK_NAME, SDK_VERSION};
use beacon_core::{
	attach_client_report, DataCategory, DiscardReason, Dsn, Envelope, EnvelopeHeader,
	EnvelopeItem, ItemType, Outcome, Platform, SdkInfo, UserFeedback,
};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientOptions;
use crate::error::{Result, TransportError};
use crate::ledger::{OutcomeBuffer, OutcomeLedger, OutcomeSource};
use crate::transport::{HttpTransport, NativeModule, NativeSdkOptions, NativeTransport, SendResult, Transport};

/// Builder for constructing a [`BeaconClient`].
pub struct BeaconClientBuilder {
	options: ClientOptions,
	transport: Option<Arc<dyn Transport>>,
	native_module: Option<Arc<dyn NativeModule>>,
	outcome_source: Option<Arc<dyn OutcomeSource>>,
}

impl BeaconClientBuilder {
	/// Creates a new builder with default options.
	pub fn new() -> Self {
		Self {
			options: ClientOptions::default(),
			transport: None,
			native_module: None,
			outcome_source: None,
		}
	}

	/// Replaces all options at once, e.g. with [`ClientOptions::from_env`].
	pub fn options(mut self, options: ClientOptions) -> Self {
		self.options = options;
		self
	}

	/// Sets the DSN envelopes are delivered to.
	///
	/// Example: `https://public_key@ingest.example.com/42`
	pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
		self.options.dsn = Some(dsn.into());
		self
	}

	pub fn release(mut self, release: impl Into<String>) -> Self {
		self.options.release = Some(release.into());
		self
	}

	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.options.environment = Some(environment.into());
		self
	}

	/// Enables or disables client reports (default: enabled).
	pub fn send_client_reports(mut self, enabled: bool) -> Self {
		self.options.send_client_reports = enabled;
		self
	}

	/// Enables or disables the native bridge (default: enabled).
	pub fn enable_native(mut self, enabled: bool) -> Self {
		self.options.enable_native = enabled;
		self
	}

	pub fn platform(mut self, platform: Platform) -> Self {
		self.options.platform = platform;
		self
	}

	/// Sets how many HTTP sends may be in flight before envelopes are dropped.
	pub fn max_queue_size(mut self, size: usize) -> Self {
		self.options.max_queue_size = size;
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.options.request_timeout = timeout;
		self
	}

	pub fn retry_config(mut self, config: RetryConfig) -> Self {
		self.options.retry_config = config;
		self
	}

	pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
		self.options.shutdown_timeout = timeout;
		self
	}

	/// Uses a custom transport instead of choosing between native and HTTP.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Links the in-process native module.
	pub fn native_module(mut self, module: Arc<dyn NativeModule>) -> Self {
		self.native_module = Some(module);
		self
	}

	/// Uses an external source of discarded-event outcomes.
	pub fn outcome_source(mut self, source: Arc<dyn OutcomeSource>) -> Self {
		self.outcome_source = Some(source);
		self
	}

	/// Builds the client.
	///
	/// Transport selection: an explicit transport wins, then the native
	/// bridge when it is available, then HTTP when a DSN is set. Without any
	/// of them the client still builds and drops everything it is given.
	pub fn build(self) -> Result<BeaconClient> {
		let options = self.options;
		let dsn = options.dsn.as_deref().map(str::parse::<Dsn>).transpose()?;

		let native = Arc::new(NativeTransport::new(
			self.native_module,
			options.enable_native,
			options.platform,
		));

		let transport: Option<Arc<dyn Transport>> = match (self.transport, &dsn) {
			(Some(transport), _) => Some(transport),
			(None, _) if native.is_available() => Some(native.clone() as Arc<dyn Transport>),
			(None, Some(dsn)) => {
				let http_client = beacon_common_http::builder()
					.timeout(options.request_timeout)
					.build()?;
				let http = HttpTransport::new(
					http_client,
					dsn,
					options.retry_config.clone(),
					options.max_queue_size,
				)?;
				Some(Arc::new(http) as Arc<dyn Transport>)
			}
			(None, None) => None,
		};

		match &transport {
			Some(transport) => info!(transport = transport.name(), "Beacon client initialized"),
			None => warn!("No DSN was provided and the native SDK is unavailable; envelopes will be dropped"),
		}

		let inner = Arc::new(BeaconClientInner {
			options,
			dsn,
			transport,
			native,
			outcome_source: self
				.outcome_source
				.unwrap_or_else(|| Arc::new(OutcomeBuffer::new())),
			ledger: OutcomeLedger::new(),
			tracker: TaskTracker::new(),
			closed: AtomicBool::new(false),
			close_result: OnceCell::new(),
		});

		Ok(BeaconClient { inner })
	}

	/// Builds the client and starts the native SDK when it is the active
	/// transport.
	pub async fn build_async(self) -> Result<BeaconClient> {
		let client = self.build()?;
		client.init_native().await?;
		Ok(client)
	}
}

impl Default for BeaconClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct BeaconClientInner {
	options: ClientOptions,
	dsn: Option<Dsn>,
	transport: Option<Arc<dyn Transport>>,
	native: Arc<NativeTransport>,
	outcome_source: Arc<dyn OutcomeSource>,
	ledger: OutcomeLedger,
	tracker: TaskTracker,
	closed: AtomicBool,
	close_result: OnceCell<bool>,
}

/// Handle for dispatching telemetry.
///
/// Cheap to clone; the application holds one and passes it to whatever needs
/// to send.
///
/// # Example
///
/// ```ignore
/// use beacon::BeaconClient;
///
/// let client = BeaconClient::builder()
///     .dsn("https://public_key@ingest.example.com/42")
///     .release(env!("CARGO_PKG_VERSION"))
///     .build()?;
///
/// let event_id = client.capture_event(serde_json::json!({"message": "hello"}));
///
/// client.close().await;
/// ```
#[derive(Clone)]
pub struct BeaconClient {
	inner: Arc<BeaconClientInner>,
}

impl BeaconClient {
	pub fn builder() -> BeaconClientBuilder {
		BeaconClientBuilder::new()
	}

	/// Name of the selected transport, if any.
	pub fn transport_name(&self) -> Option<&'static str> {
		self.inner.transport.as_ref().map(|t| t.name())
	}

	pub fn options(&self) -> &ClientOptions {
		&self.inner.options
	}

	/// Current contents of the outcome ledger.
	pub fn outcomes(&self) -> Vec<Outcome> {
		self.inner.ledger.snapshot()
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	/// Records one discarded event so it is reported with the next send.
	pub fn record_dropped_event(&self, reason: DiscardReason, category: DataCategory) {
		self.inner
			.outcome_source
			.record_outcome(Outcome::new(reason, category, 1));
	}

	/// Wraps an event in an envelope and sends it. Returns the event id.
	///
	/// An `event_id` already present on the event is kept. Events with
	/// `"type": "transaction"` are sent as transaction items.
	pub fn capture_event(&self, mut event: Value) -> String {
		let event_id = event
			.get("event_id")
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| Uuid::new_v4().simple().to_string());

		if let Some(obj) = event.as_object_mut() {
			obj.insert("event_id".to_string(), Value::String(event_id.clone()));
			if let Some(release) = &self.inner.options.release {
				obj.entry("release")
					.or_insert_with(|| Value::String(release.clone()));
			}
			if let Some(environment) = &self.inner.options.environment {
				obj.entry("environment")
					.or_insert_with(|| Value::String(environment.clone()));
			}
		}

		let item_type = match event.get("type").and_then(Value::as_str) {
			Some("transaction") => ItemType::Transaction,
			_ => ItemType::Event,
		};

		let envelope = Envelope::new(self.envelope_header(Some(event_id.clone())))
			.with_item(EnvelopeItem::json(item_type, event));
		self.send_envelope(envelope);

		event_id
	}

	/// Sends user feedback about a previously captured event.
	pub fn capture_user_feedback(&self, feedback: &UserFeedback) {
		let item = match feedback.to_item() {
			Ok(item) => item,
			Err(e) => {
				warn!(error = %e, "Failed to serialize user feedback");
				return;
			}
		};

		let envelope =
			Envelope::new(self.envelope_header(Some(feedback.event_id.clone()))).with_item(item);
		self.send_envelope(envelope);
	}

	fn envelope_header(&self, event_id: Option<String>) -> EnvelopeHeader {
		EnvelopeHeader {
			event_id,
			dsn: self.inner.dsn.as_ref().map(|d| d.to_string()),
			sdk: Some(SdkInfo {
				name: SDK_NAME.to_string(),
				version: SDK_VERSION.to_string(),
			}),
			sent_at: Some(Utc::now().to_rfc3339()),
		}
	}

	/// Dispatches an envelope without waiting for delivery.
	///
	/// Buffered outcomes are merged into the ledger and, when client reports
	/// are enabled, attached as a `client_report` item. The ledger is then
	/// cleared before the transport runs; only a construction failure puts
	/// the outcomes back. Failures are logged, never returned.
	///
	/// Must be called from within a tokio runtime for the send to happen.
	pub fn send_envelope(&self, mut envelope: Envelope) {
		let inner = &self.inner;

		if self.is_closed() {
			debug!("Client is closed; dropping envelope");
			return;
		}

		let drained = inner.outcome_source.drain_outcomes();
		let merged = inner.ledger.merge(&drained);

		if inner.options.send_client_reports {
			if let Err(e) = attach_client_report(&merged, &mut envelope) {
				warn!(error = %e, "Failed to attach client report");
			}
		}

		let Some(transport) = inner.transport.clone() else {
			inner.ledger.clear();
			warn!(error = %TransportError::Unavailable, "Dropping envelope");
			return;
		};

		let taken = inner.ledger.take();

		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			inner.ledger.restore(&taken);
			warn!(error = %TransportError::NoRuntime, "Failed to send envelope");
			return;
		};

		let dropped_categories: Vec<DataCategory> = envelope
			.items
			.iter()
			.map(EnvelopeItem::item_type)
			.filter(|t| *t != ItemType::ClientReport)
			.map(|t| t.data_category())
			.collect();

		let client = self.clone();
		inner.tracker.spawn_on(
			async move {
				let result = transport.send(envelope).await;
				client.reconcile(transport.name(), result, &taken, &dropped_categories);
			},
			&runtime,
		);
	}

	fn reconcile(
		&self,
		transport: &'static str,
		result: SendResult,
		taken: &[Outcome],
		dropped_categories: &[DataCategory],
	) {
		match result {
			SendResult::Delivered => {
				debug!(transport, "Envelope delivered");
			}
			SendResult::ConstructionFailed(e) => {
				warn!(transport, error = %e, "Failed to send envelope; keeping outcomes for next send");
				self.inner.ledger.restore(taken);
			}
			SendResult::DeliveryFailed(e) => {
				warn!(transport, error = %e, "Envelope delivery failed");
				if let Some(reason) = discard_reason(&e) {
					for category in dropped_categories {
						self.inner
							.outcome_source
							.record_outcome(Outcome::new(reason, *category, 1));
					}
				}
			}
		}
	}

	/// Waits for outstanding sends. Returns false if `timeout` elapsed first.
	pub async fn flush(&self, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let tracker = &self.inner.tracker;

		tracker.close();
		let sends_done = tokio::time::timeout_at(deadline, tracker.wait()).await.is_ok();
		tracker.reopen();

		if !sends_done {
			warn!(pending = tracker.len(), "Timed out waiting for envelope sends");
			return false;
		}

		match &self.inner.transport {
			Some(transport) => {
				transport
					.flush(deadline.saturating_duration_since(Instant::now()))
					.await
			}
			None => true,
		}
	}

	/// Flushes with the configured shutdown timeout, closes the native SDK and
	/// stops accepting envelopes. Returns whether the flush completed.
	///
	/// Repeated calls wait for the first close and return its result.
	pub async fn close(&self) -> bool {
		*self
			.inner
			.close_result
			.get_or_init(|| async {
				self.inner.closed.store(true, Ordering::SeqCst);

				let flushed = self.flush(self.inner.options.shutdown_timeout).await;
				self.inner.native.close().await;

				info!(flushed, "Beacon client closed");
				flushed
			})
			.await
	}

	async fn init_native(&self) -> Result<()> {
		let native = &self.inner.native;
		if !native.is_available() {
			return Ok(());
		}

		let Some(dsn) = &self.inner.dsn else {
			warn!("No DSN was provided; the native SDK will not be initialized");
			return Ok(());
		};

		let options = NativeSdkOptions {
			dsn: dsn.to_string(),
			release: self.inner.options.release.clone(),
			environment: self.inner.options.environment.clone(),
			send_client_reports: self.inner.options.send_client_reports,
		};
		native.init(&options).await?;
		Ok(())
	}

	/// Whether the native SDK is initialized and ready.
	pub fn is_native_ready(&self) -> bool {
		self.inner.native.is_ready()
	}

	/// Whether the previous app launch ended in a native crash.
	pub async fn did_crash_last_launch(&self) -> bool {
		self.inner.native.did_crash_last_launch().await
	}

	/// Triggers a native crash when the native SDK is linked. Testing only.
	pub fn native_crash(&self) {
		self.inner.native.crash();
	}
}

/// Outcome reason for items lost after the transport accepted them.
fn discard_reason(error: &TransportError) -> Option<DiscardReason> {
	match error {
		TransportError::QueueOverflow => Some(DiscardReason::QueueOverflow),
		TransportError::RateLimited { .. } => Some(DiscardReason::RateLimitBackoff),
		TransportError::RequestFailed(_) => Some(DiscardReason::NetworkError),
		TransportError::ServerError { .. } | TransportError::Native(_) => {
			Some(DiscardReason::SendError)
		}
		_ => None,
	}
}
