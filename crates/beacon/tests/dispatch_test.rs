// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end dispatch behavior: outcome accounting, transport selection and
//! failure reconciliation.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use beacon::{
	BeaconClient, DataCategory, DiscardReason, Envelope, EnvelopeHeader, EnvelopeItem, ItemType,
	Outcome, Platform, UserFeedback,
};
use beacon_core::ItemPayload;
use common::{client_report, Behavior, CapturingLayer, MockNativeModule, RecordingTransport};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;

const FLUSH: Duration = Duration::from_secs(5);

fn event_envelope() -> Envelope {
	Envelope::new(EnvelopeHeader {
		event_id: Some("9ec79c33ec9942ab8353589fcb2e04dc".to_string()),
		..Default::default()
	})
	.with_item(EnvelopeItem::json(ItemType::Event, json!({"message": "hello"})))
}

#[tokio::test]
async fn successful_send_reports_and_clears_outcomes() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	client.record_dropped_event(DiscardReason::BeforeSend, DataCategory::Error);
	client.record_dropped_event(DiscardReason::BeforeSend, DataCategory::Error);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	assert!(client.outcomes().is_empty());
	let sent = transport.sent();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].items.len(), 2);
	assert_eq!(sent[0].items[1].item_type(), ItemType::ClientReport);

	let report = client_report(&sent[0]).unwrap();
	assert_eq!(
		report["discarded_events"],
		json!([{"reason": "before_send", "category": "error", "quantity": 2}])
	);
	assert!(report["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn repeated_outcomes_are_summed_before_sending() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	client.record_dropped_event(DiscardReason::RateLimitBackoff, DataCategory::Error);
	for _ in 0..3 {
		client.record_dropped_event(DiscardReason::RateLimitBackoff, DataCategory::Error);
	}
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	let report = client_report(&transport.sent()[0]).unwrap();
	assert_eq!(
		report["discarded_events"],
		json!([{"reason": "ratelimit_backoff", "category": "error", "quantity": 4}])
	);
}

#[tokio::test]
async fn empty_ledger_adds_no_client_report() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	let sent = transport.sent();
	assert_eq!(sent[0].items.len(), 1);
	assert!(client_report(&sent[0]).is_none());
}

#[tokio::test]
async fn construction_failure_restores_outcomes() {
	let transport = RecordingTransport::new(Behavior::FailConstruction);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	client.record_dropped_event(DiscardReason::BeforeSend, DataCategory::Error);
	client.record_dropped_event(DiscardReason::SampleRate, DataCategory::Transaction);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	assert_eq!(
		client.outcomes(),
		vec![
			Outcome::new(DiscardReason::BeforeSend, DataCategory::Error, 1),
			Outcome::new(DiscardReason::SampleRate, DataCategory::Transaction, 1),
		]
	);

	transport.set_behavior(Behavior::Deliver);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	assert!(client.outcomes().is_empty());
	let report = client_report(&transport.sent()[1]).unwrap();
	assert_eq!(
		report["discarded_events"],
		json!([
			{"reason": "before_send", "category": "error", "quantity": 1},
			{"reason": "sample_rate", "category": "transaction", "quantity": 1},
		])
	);
}

#[tokio::test]
async fn delivery_failure_is_reported_on_next_send() {
	let transport = RecordingTransport::new(Behavior::FailDelivery);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	client.record_dropped_event(DiscardReason::BeforeSend, DataCategory::Error);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	// The outcomes that rode along on the lost envelope are not retried.
	assert!(client.outcomes().is_empty());

	transport.set_behavior(Behavior::Deliver);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	let report = client_report(&transport.sent()[1]).unwrap();
	assert_eq!(
		report["discarded_events"],
		json!([{"reason": "send_error", "category": "error", "quantity": 1}])
	);
}

#[tokio::test]
async fn disabled_client_reports_still_clear_ledger() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.send_client_reports(false)
		.build()
		.unwrap();

	client.record_dropped_event(DiscardReason::BeforeSend, DataCategory::Error);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	assert!(client.outcomes().is_empty());
	assert!(client_report(&transport.sent()[0]).is_none());
}

#[tokio::test]
async fn missing_transport_drops_envelope_with_one_warning() {
	let client = BeaconClient::builder().enable_native(false).build().unwrap();
	assert_eq!(client.transport_name(), None);

	let layer = CapturingLayer::new();
	let subscriber = tracing_subscriber::registry().with(layer.clone());
	let _guard = tracing::subscriber::set_default(subscriber);

	client.record_dropped_event(DiscardReason::BeforeSend, DataCategory::Error);
	client.send_envelope(event_envelope());
	assert!(client.flush(FLUSH).await);

	assert!(client.outcomes().is_empty());
	assert_eq!(layer.warnings().len(), 1);
}

#[tokio::test]
async fn unhandled_exception_is_stored_by_native_sdk() {
	let module = MockNativeModule::new();
	let client = BeaconClient::builder()
		.dsn("https://key@ingest.example.com/42")
		.native_module(module.clone())
		.platform(Platform::Ios)
		.build_async()
		.await
		.unwrap();

	assert_eq!(client.transport_name(), Some("native"));
	assert!(client.is_native_ready());

	let envelope = Envelope::new(EnvelopeHeader::default()).with_item(EnvelopeItem::json(
		ItemType::Event,
		json!({"exception": {"values": [{"type": "Error"}]}}),
	));
	client.send_envelope(envelope);
	assert!(client.flush(FLUSH).await);

	let captured = module.captured();
	assert_eq!(captured.len(), 1);
	assert!(captured[0].1.store);
}

#[tokio::test]
async fn handled_exception_is_not_stored() {
	let module = MockNativeModule::new();
	let client = BeaconClient::builder()
		.native_module(module.clone())
		.build()
		.unwrap();

	client.capture_event(json!({
		"exception": {"values": [{"type": "Error", "mechanism": {"handled": true}}]}
	}));
	assert!(client.flush(FLUSH).await);

	assert!(!module.captured()[0].1.store);
}

#[tokio::test]
async fn build_async_passes_options_to_native_sdk() {
	let module = MockNativeModule::new();
	let client = BeaconClient::builder()
		.dsn("https://key@ingest.example.com/42")
		.release("app@1.0.0")
		.native_module(module.clone())
		.build_async()
		.await
		.unwrap();

	let options = module.init_options.lock().unwrap().clone().unwrap();
	assert_eq!(options.dsn, "https://key@ingest.example.com/42");
	assert_eq!(options.release.as_deref(), Some("app@1.0.0"));
	assert!(options.send_client_reports);

	assert!(client.close().await);
	assert!(module.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn build_async_without_dsn_skips_native_init() {
	let module = MockNativeModule::new();
	let client = BeaconClient::builder()
		.native_module(module.clone())
		.build_async()
		.await
		.unwrap();

	assert!(module.init_options.lock().unwrap().is_none());
	assert!(!client.is_native_ready());
	assert_eq!(client.transport_name(), Some("native"));
}

#[tokio::test]
async fn did_crash_last_launch_asks_native_sdk() {
	let module = MockNativeModule::new();
	module.crashed_last_launch.store(true, Ordering::SeqCst);

	let native = BeaconClient::builder()
		.native_module(module.clone())
		.build()
		.unwrap();
	assert!(native.did_crash_last_launch().await);

	let disabled = BeaconClient::builder()
		.native_module(module)
		.enable_native(false)
		.build()
		.unwrap();
	assert!(!disabled.did_crash_last_launch().await);
}

#[tokio::test]
async fn capture_event_fills_in_identity_fields() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.release("app@2.0.0")
		.environment("staging")
		.build()
		.unwrap();

	let event_id = client.capture_event(json!({"message": "hi", "environment": "prod"}));
	assert!(client.flush(FLUSH).await);

	let sent = transport.sent();
	assert_eq!(sent[0].header.event_id.as_deref(), Some(event_id.as_str()));
	assert!(sent[0].header.sdk.is_some());

	let ItemPayload::Json(payload) = &sent[0].items[0].payload else {
		panic!("event payload should be JSON");
	};
	assert_eq!(payload["event_id"], event_id.as_str());
	assert_eq!(payload["release"], "app@2.0.0");
	assert_eq!(payload["environment"], "prod");
}

#[tokio::test]
async fn capture_event_keeps_existing_id_and_detects_transactions() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	let event_id = client.capture_event(json!({"event_id": "fixed", "type": "transaction"}));
	assert!(client.flush(FLUSH).await);

	assert_eq!(event_id, "fixed");
	assert_eq!(transport.sent()[0].items[0].item_type(), ItemType::Transaction);
}

#[tokio::test]
async fn user_feedback_is_sent_as_user_report() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	client.capture_user_feedback(&UserFeedback {
		event_id: "abc".to_string(),
		comments: "it broke".to_string(),
		..Default::default()
	});
	assert!(client.flush(FLUSH).await);

	let sent = transport.sent();
	assert_eq!(sent[0].header.event_id.as_deref(), Some("abc"));
	assert_eq!(sent[0].items[0].item_type(), ItemType::UserReport);
}

#[tokio::test]
async fn closed_client_stops_sending() {
	let transport = RecordingTransport::new(Behavior::Deliver);
	let client = BeaconClient::builder()
		.transport(transport.clone())
		.build()
		.unwrap();

	assert!(client.close().await);
	client.send_envelope(event_envelope());
	client.capture_event(json!({"message": "late"}));

	assert!(transport.sent().is_empty());
}
