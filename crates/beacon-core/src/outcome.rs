// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Discarded-event outcomes and the client report that summarizes them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BeaconError;

/// Why a piece of telemetry was generated but never delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
	BeforeSend,
	EventProcessor,
	SampleRate,
	QueueOverflow,
	NetworkError,
	#[serde(rename = "ratelimit_backoff")]
	RateLimitBackoff,
	SendError,
	InternalSdkError,
}

impl fmt::Display for DiscardReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::BeforeSend => write!(f, "before_send"),
			Self::EventProcessor => write!(f, "event_processor"),
			Self::SampleRate => write!(f, "sample_rate"),
			Self::QueueOverflow => write!(f, "queue_overflow"),
			Self::NetworkError => write!(f, "network_error"),
			Self::RateLimitBackoff => write!(f, "ratelimit_backoff"),
			Self::SendError => write!(f, "send_error"),
			Self::InternalSdkError => write!(f, "internal_sdk_error"),
		}
	}
}

impl FromStr for DiscardReason {
	type Err = BeaconError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"before_send" => Ok(Self::BeforeSend),
			"event_processor" => Ok(Self::EventProcessor),
			"sample_rate" => Ok(Self::SampleRate),
			"queue_overflow" => Ok(Self::QueueOverflow),
			"network_error" => Ok(Self::NetworkError),
			"ratelimit_backoff" => Ok(Self::RateLimitBackoff),
			"send_error" => Ok(Self::SendError),
			"internal_sdk_error" => Ok(Self::InternalSdkError),
			_ => Err(BeaconError::InvalidDiscardReason(s.to_string())),
		}
	}
}

/// The kind of telemetry an outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
	Default,
	Error,
	Transaction,
	Security,
	Attachment,
	Session,
	Internal,
}

impl fmt::Display for DataCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Default => write!(f, "default"),
			Self::Error => write!(f, "error"),
			Self::Transaction => write!(f, "transaction"),
			Self::Security => write!(f, "security"),
			Self::Attachment => write!(f, "attachment"),
			Self::Session => write!(f, "session"),
			Self::Internal => write!(f, "internal"),
		}
	}
}

impl FromStr for DataCategory {
	type Err = BeaconError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"default" => Ok(Self::Default),
			"error" => Ok(Self::Error),
			"transaction" => Ok(Self::Transaction),
			"security" => Ok(Self::Security),
			"attachment" => Ok(Self::Attachment),
			"session" => Ok(Self::Session),
			"internal" => Ok(Self::Internal),
			_ => Err(BeaconError::InvalidDataCategory(s.to_string())),
		}
	}
}

/// A counted class of discarded telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
	pub reason: DiscardReason,
	pub category: DataCategory,
	pub quantity: u64,
}

impl Outcome {
	pub fn new(reason: DiscardReason, category: DataCategory, quantity: u64) -> Self {
		Self {
			reason,
			category,
			quantity,
		}
	}

	fn same_class(&self, other: &Outcome) -> bool {
		self.reason == other.reason && self.category == other.category
	}
}

/// Merges `incoming` into `existing`.
///
/// Records with the same (reason, category) have their quantities summed;
/// new pairs are appended in the order they are first seen.
pub fn merge_outcomes(existing: &[Outcome], incoming: &[Outcome]) -> Vec<Outcome> {
	let mut merged = existing.to_vec();
	for outcome in incoming {
		match merged.iter_mut().find(|o| o.same_class(outcome)) {
			Some(found) => found.quantity = found.quantity.saturating_add(outcome.quantity),
			None => merged.push(*outcome),
		}
	}
	merged
}

/// Payload of a `client_report` envelope item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientReport {
	/// Capture time in seconds since the Unix epoch.
	pub timestamp: f64,
	pub discarded_events: Vec<Outcome>,
}
