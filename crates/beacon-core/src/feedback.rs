// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User feedback attached to a previously captured event.

use serde::{Deserialize, Serialize};

use crate::envelope::{EnvelopeItem, ItemType};
use crate::error::Result;

/// Feedback a user left about a specific event, sent as a `user_report` item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFeedback {
	pub event_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	pub comments: String,
}

impl UserFeedback {
	pub fn to_item(&self) -> Result<EnvelopeItem> {
		Ok(EnvelopeItem::json(
			ItemType::UserReport,
			serde_json::to_value(self)?,
		))
	}
}
