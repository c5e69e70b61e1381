// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outcome accounting between send attempts.

use std::sync::{Mutex, MutexGuard};

use beacon_core::{merge_outcomes, DataCategory, DiscardReason, Outcome};

/// Where freshly discarded-event outcomes accumulate before a send picks
/// them up.
pub trait OutcomeSource: Send + Sync {
	/// Records a discarded-event outcome.
	fn record_outcome(&self, outcome: Outcome);

	/// Returns everything recorded since the last drain and clears it.
	fn drain_outcomes(&self) -> Vec<Outcome>;
}

/// In-process [`OutcomeSource`] that merges as it records.
#[derive(Debug, Default)]
pub struct OutcomeBuffer {
	outcomes: Mutex<Vec<Outcome>>,
}

impl OutcomeBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a single dropped item.
	pub fn record(&self, reason: DiscardReason, category: DataCategory) {
		self.record_outcome(Outcome::new(reason, category, 1));
	}

	fn lock(&self) -> MutexGuard<'_, Vec<Outcome>> {
		self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
	}
}

impl OutcomeSource for OutcomeBuffer {
	fn record_outcome(&self, outcome: Outcome) {
		let mut outcomes = self.lock();
		*outcomes = merge_outcomes(&outcomes, &[outcome]);
	}

	fn drain_outcomes(&self) -> Vec<Outcome> {
		std::mem::take(&mut *self.lock())
	}
}

/// Merged outcomes waiting to be reported in a client report.
///
/// Owned by exactly one client. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct OutcomeLedger {
	outcomes: Mutex<Vec<Outcome>>,
}

impl OutcomeLedger {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, Vec<Outcome>> {
		self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// Merges `incoming` and returns the resulting ledger contents.
	pub fn merge(&self, incoming: &[Outcome]) -> Vec<Outcome> {
		let mut outcomes = self.lock();
		*outcomes = merge_outcomes(&outcomes, incoming);
		outcomes.clone()
	}

	/// Empties the ledger, returning what it held.
	pub fn take(&self) -> Vec<Outcome> {
		std::mem::take(&mut *self.lock())
	}

	/// Puts previously taken outcomes back, summing with anything merged in
	/// the meantime.
	pub fn restore(&self, taken: &[Outcome]) {
		let mut outcomes = self.lock();
		*outcomes = merge_outcomes(taken, &outcomes);
	}

	pub fn clear(&self) {
		self.lock().clear();
	}

	pub fn snapshot(&self) -> Vec<Outcome> {
		self.lock().clone()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}
}
