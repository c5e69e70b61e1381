// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Capture events and user feedback with the Beacon SDK.
//!
//! Run with:
//!   BEACON_DSN=https://key@ingest.example.com/42 cargo run --example capture -p beacon

use std::time::Duration;

use beacon::{BeaconClient, ClientOptions, DataCategory, DiscardReason, UserFeedback};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beacon=debug")),
		)
		.init();

	let mut options = ClientOptions::from_env();
	if options.release.is_none() {
		options.release = Some("0.1.0-example".to_string());
	}

	println!("Initializing Beacon client...");
	println!("  DSN: {}", options.dsn.as_deref().unwrap_or("<none>"));

	let client = BeaconClient::builder()
		.options(options)
		.environment("development")
		.build_async()
		.await?;

	println!("  Transport: {}", client.transport_name().unwrap_or("<none>"));

	// Pretend a sampler dropped some transactions before this point
	for _ in 0..3 {
		client.record_dropped_event(DiscardReason::SampleRate, DataCategory::Transaction);
	}

	let event_id = client.capture_event(json!({
		"message": "Example message from the Beacon SDK",
		"level": "info",
	}));
	println!("\nCaptured message event {event_id}");

	let crash_id = client.capture_event(json!({
		"level": "error",
		"exception": {
			"values": [{"type": "ExampleError", "value": "something went wrong"}]
		},
	}));
	println!("Captured exception event {crash_id}");

	client.capture_user_feedback(&UserFeedback {
		event_id: crash_id,
		name: Some("Example User".to_string()),
		email: Some("example@example.com".to_string()),
		comments: "It crashed when I clicked the button".to_string(),
	});

	let flushed = client.flush(Duration::from_secs(5)).await;
	println!("\nFlushed: {flushed}");

	client.close().await;
	println!("Client closed.");

	Ok(())
}
