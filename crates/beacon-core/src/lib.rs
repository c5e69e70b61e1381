// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Beacon telemetry SDK.
//!
//! This crate holds everything about an envelope that does not involve I/O:
//!
//! - Envelope, item header and payload types
//! - Discarded-event outcomes, their merge rule and the client report item
//! - The byte-exact envelope encoder and the hard-crash predicate
//! - Event level normalization for native SDKs
//! - DSN parsing
//!
//! Dispatching envelopes lives in the `beacon` crate.

pub mod dsn;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod event;
pub mod feedback;
pub mod outcome;

pub use dsn::Dsn;
pub use encode::{encode_envelope, EncodedEnvelope};
pub use envelope::{
	attach_client_report, attach_client_report_at, Envelope, EnvelopeHeader, EnvelopeItem,
	ItemHeader, ItemPayload, ItemType, SdkInfo,
};
pub use error::{BeaconError, Result};
pub use event::{is_hard_crash, normalize_level, normalize_levels, prepare_for_native, Platform};
pub use feedback::UserFeedback;
pub use outcome::{merge_outcomes, ClientReport, DataCategory, DiscardReason, Outcome};
