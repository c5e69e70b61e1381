// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Envelope types: one header followed by an ordered list of typed items.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BeaconError, Result};
use crate::outcome::{ClientReport, DataCategory, Outcome};

/// Identifies the SDK that produced an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkInfo {
	pub name: String,
	pub version: String,
}

/// Delivery metadata for a whole envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub event_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dsn: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sdk: Option<SdkInfo>,
	/// RFC 3339 time the envelope left the SDK.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sent_at: Option<String>,
}

/// Type of an envelope item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
	Event,
	Transaction,
	UserReport,
	ClientReport,
	Attachment,
	Session,
}

impl ItemType {
	/// The outcome category used when an item of this type is dropped.
	pub fn data_category(&self) -> DataCategory {
		match self {
			Self::Event => DataCategory::Error,
			Self::Transaction => DataCategory::Transaction,
			Self::UserReport => DataCategory::Default,
			Self::ClientReport => DataCategory::Internal,
			Self::Attachment => DataCategory::Attachment,
			Self::Session => DataCategory::Session,
		}
	}
}

impl fmt::Display for ItemType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Event => write!(f, "event"),
			Self::Transaction => write!(f, "transaction"),
			Self::UserReport => write!(f, "user_report"),
			Self::ClientReport => write!(f, "client_report"),
			Self::Attachment => write!(f, "attachment"),
			Self::Session => write!(f, "session"),
		}
	}
}

impl FromStr for ItemType {
	type Err = BeaconError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"event" => Ok(Self::Event),
			"transaction" => Ok(Self::Transaction),
			"user_report" => Ok(Self::UserReport),
			"client_report" => Ok(Self::ClientReport),
			"attachment" => Ok(Self::Attachment),
			"session" => Ok(Self::Session),
			_ => Err(BeaconError::InvalidItemType(s.to_string())),
		}
	}
}

/// Header of a single envelope item.
///
/// `content_type` and `length` are filled in by the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemHeader {
	#[serde(rename = "type")]
	pub item_type: ItemType,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub length: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attachment_type: Option<String>,
}

impl ItemHeader {
	pub fn new(item_type: ItemType) -> Self {
		Self {
			item_type,
			content_type: None,
			length: None,
			filename: None,
			attachment_type: None,
		}
	}
}

/// Body of an envelope item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
	/// Structured object, encoded as compact JSON.
	Json(serde_json::Value),
	/// UTF-8 text.
	Text(String),
	/// Raw bytes, written as-is.
	Binary(Vec<u8>),
}

/// One self-contained piece of telemetry inside an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeItem {
	pub header: ItemHeader,
	pub payload: ItemPayload,
}

impl EnvelopeItem {
	pub fn new(header: ItemHeader, payload: ItemPayload) -> Self {
		Self { header, payload }
	}

	pub fn json(item_type: ItemType, payload: serde_json::Value) -> Self {
		Self::new(ItemHeader::new(item_type), ItemPayload::Json(payload))
	}

	/// Creates an attachment item carrying raw bytes.
	pub fn attachment(
		filename: impl Into<String>,
		content_type: Option<String>,
		data: Vec<u8>,
	) -> Self {
		let mut header = ItemHeader::new(ItemType::Attachment);
		header.filename = Some(filename.into());
		header.content_type = content_type;
		Self::new(header, ItemPayload::Binary(data))
	}

	pub fn item_type(&self) -> ItemType {
		self.header.item_type
	}
}

/// The unit of transport: a header and an ordered list of items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
	pub header: EnvelopeHeader,
	pub items: Vec<EnvelopeItem>,
}

impl Envelope {
	pub fn new(header: EnvelopeHeader) -> Self {
		Self {
			header,
			items: Vec::new(),
		}
	}

	pub fn with_item(mut self, item: EnvelopeItem) -> Self {
		self.items.push(item);
		self
	}

	pub fn push(&mut self, item: EnvelopeItem) {
		self.items.push(item);
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

/// Appends a `client_report` item summarizing `ledger`, stamped with the
/// current time. Does nothing when the ledger is empty.
pub fn attach_client_report(ledger: &[Outcome], envelope: &mut Envelope) -> Result<()> {
	let now = Utc::now().timestamp_millis() as f64 / 1000.0;
	attach_client_report_at(ledger, envelope, now)
}

/// Same as [`attach_client_report`] with an explicit epoch-seconds timestamp.
pub fn attach_client_report_at(
	ledger: &[Outcome],
	envelope: &mut Envelope,
	timestamp: f64,
) -> Result<()> {
	if ledger.is_empty() {
		return Ok(());
	}

	let report = ClientReport {
		timestamp,
		discarded_events: ledger.to_vec(),
	};
	envelope.push(EnvelopeItem::json(
		ItemType::ClientReport,
		serde_json::to_value(report)?,
	));
	Ok(())
}
