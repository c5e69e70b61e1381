// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for envelope construction and encoding.

use thiserror::Error;

/// Errors that can occur while building or encoding envelopes.
#[derive(Debug, Error)]
pub enum BeaconError {
	#[error("invalid DSN: {0}")]
	InvalidDsn(String),

	#[error("invalid item type: {0}")]
	InvalidItemType(String),

	#[error("invalid discard reason: {0}")]
	InvalidDiscardReason(String),

	#[error("invalid data category: {0}")]
	InvalidDataCategory(String),

	#[error("invalid platform: {0}")]
	InvalidPlatform(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, BeaconError>;
