// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Beacon telemetry SDK.
//!
//! Captured events become envelopes that are sent either through an
//! in-process native SDK or over HTTP to the DSN's envelope endpoint.
//! Events the SDK drops are counted and reported back in a `client_report`
//! item on a later envelope.
//!
//! # Example
//!
//! ```ignore
//! use beacon::{BeaconClient, DataCategory, DiscardReason};
//!
//! let client = BeaconClient::builder()
//!     .dsn("https://public_key@ingest.example.com/42")
//!     .environment("production")
//!     .build()?;
//!
//! client.record_dropped_event(DiscardReason::SampleRate, DataCategory::Transaction);
//! client.capture_event(serde_json::json!({"message": "deploy finished", "level": "info"}));
//!
//! client.close().await;
//! ```

mod client;
pub mod config;
mod error;
mod ledger;
pub mod transport;

pub use client::{BeaconClient, BeaconClientBuilder};
pub use config::ClientOptions;
pub use error::{BeaconSdkError, NativeError, Result, TransportError};
pub use ledger::{OutcomeBuffer, OutcomeLedger, OutcomeSource};
pub use transport::{
	CaptureOptions, HttpTransport, NativeModule, NativeSdkOptions, NativeTransport, SendResult,
	Transport,
};

pub use beacon_common_http::RetryConfig;
pub use beacon_core::{
	DataCategory, DiscardReason, Dsn, Envelope, EnvelopeHeader, EnvelopeItem, ItemType, Outcome,
	Platform, UserFeedback,
};
