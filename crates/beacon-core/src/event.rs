// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers that inspect or normalize captured events.
//!
//! Events are plain JSON mappings produced by capture code elsewhere; these
//! functions only read the fields the dispatch pipeline cares about.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::BeaconError;

/// Operating system of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
	Ios,
	Android,
	#[default]
	Other,
}

impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ios => write!(f, "ios"),
			Self::Android => write!(f, "android"),
			Self::Other => write!(f, "other"),
		}
	}
}

impl FromStr for Platform {
	type Err = BeaconError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"ios" => Ok(Self::Ios),
			"android" => Ok(Self::Android),
			"other" => Ok(Self::Other),
			_ => Err(BeaconError::InvalidPlatform(s.to_string())),
		}
	}
}

/// Returns true when the payload is an event describing an unhandled
/// exception.
///
/// The exception list must be non-empty and at least one exception must lack
/// an explicit `mechanism.handled: true`. Message-only events are never hard
/// crashes.
pub fn is_hard_crash(payload: &Value) -> bool {
	let Some(values) = payload
		.get("exception")
		.and_then(|e| e.get("values"))
		.and_then(Value::as_array)
	else {
		return false;
	};

	values.iter().any(|exception| {
		exception
			.get("mechanism")
			.and_then(|m| m.get("handled"))
			.and_then(Value::as_bool)
			!= Some(true)
	})
}

/// Maps severity levels that native SDKs do not understand onto ones they do.
pub fn normalize_level(level: &str) -> &str {
	match level {
		"log" => "debug",
		"critical" => "fatal",
		other => other,
	}
}

/// Normalizes `level` on the event and on every breadcrumb.
pub fn normalize_levels(event: &mut Value) {
	normalize_level_field(event);

	if let Some(breadcrumbs) = event.get_mut("breadcrumbs").and_then(Value::as_array_mut) {
		for breadcrumb in breadcrumbs {
			normalize_level_field(breadcrumb);
		}
	}
}

fn normalize_level_field(value: &mut Value) {
	if let Some(level) = value.get_mut("level") {
		if let Some(s) = level.as_str() {
			let normalized = normalize_level(s);
			if normalized != s {
				*level = Value::String(normalized.to_string());
			}
		}
	}
}

/// Prepares an `event` or `transaction` payload for the native bridge.
///
/// Levels are always normalized. On Android the string `message` is wrapped
/// as `{"message": ..}` and breadcrumbs are emptied unless the event is a hard
/// crash, since the native scope already carries them.
pub fn prepare_for_native(mut event: Value, platform: Platform) -> Value {
	normalize_levels(&mut event);

	if platform == Platform::Android {
		let hard_crash = is_hard_crash(&event);
		if let Some(obj) = event.as_object_mut() {
			if let Some(message) = obj.get_mut("message") {
				if message.is_string() {
					let text = message.take();
					*message = serde_json::json!({ "message": text });
				}
			}
			if !hard_crash {
				if let Some(breadcrumbs) = obj.get_mut("breadcrumbs") {
					if breadcrumbs.is_array() {
						*breadcrumbs = Value::Array(Vec::new());
					}
				}
			}
		}
	}

	event
}
