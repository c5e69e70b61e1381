// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Byte-exact envelope serialization.
//!
//! The wire format is newline delimited:
//!
//! ```text
//! {envelope header JSON}\n
//! {item header JSON}\n{payload bytes}\n
//! ...
//! ```
//!
//! Each item header carries `length`, the exact byte count of its payload, so
//! readers can skip binary payloads without parsing them.

use crate::envelope::{Envelope, ItemPayload};
use crate::error::Result;
use crate::event::is_hard_crash;

const EOL: u8 = b'\n';

pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// An encoded envelope plus the hard-crash classification made while
/// encoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEnvelope {
	pub bytes: Vec<u8>,
	/// True if any JSON item was an unhandled exception event.
	pub hard_crash: bool,
}

/// Serializes an envelope into its wire representation.
///
/// The envelope is not modified; `content_type` and `length` are written to
/// copies of the item headers.
pub fn encode_envelope(envelope: &Envelope) -> Result<EncodedEnvelope> {
	let mut bytes = serde_json::to_vec(&envelope.header)?;
	bytes.push(EOL);

	let mut hard_crash = false;

	for item in &envelope.items {
		let mut header = item.header.clone();

		let payload: std::borrow::Cow<'_, [u8]> = match &item.payload {
			ItemPayload::Text(text) => {
				if header.content_type.is_none() {
					header.content_type = Some(CONTENT_TYPE_TEXT.to_string());
				}
				text.as_bytes().into()
			}
			ItemPayload::Binary(data) => {
				if header.content_type.is_none() {
					header.content_type = Some(CONTENT_TYPE_OCTET_STREAM.to_string());
				}
				data.as_slice().into()
			}
			ItemPayload::Json(value) => {
				if !hard_crash {
					hard_crash = is_hard_crash(value);
				}
				header.content_type = Some(CONTENT_TYPE_JSON.to_string());
				serde_json::to_vec(value)?.into()
			}
		};

		header.length = Some(payload.len());

		serde_json::to_writer(&mut bytes, &header)?;
		bytes.push(EOL);
		bytes.extend_from_slice(&payload);
		bytes.push(EOL);
	}

	Ok(EncodedEnvelope { bytes, hard_crash })
}
