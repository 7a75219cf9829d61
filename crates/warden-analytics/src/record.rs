// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One authorization decision, as shipped through the audit pipeline.
///
/// Records are immutable after creation and travel MessagePack-encoded:
/// appended to the shared queue by the recorder, decoded again by the pump.
/// `request`, `policies` and `deciders` hold pre-serialized JSON so the
/// pipeline never needs the policy types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
	/// Decision time, unix seconds.
	pub timestamp: i64,
	pub username: String,
	/// `"allow"` or `"deny"`.
	pub effect: String,
	pub conclusion: String,
	/// The authorization request, serialized.
	pub request: String,
	/// Ids of the candidate policies that matched the request.
	pub policies: String,
	/// Ids of the policies that decided the outcome.
	pub deciders: String,
	/// Retention hint for downstream stores.
	pub expire_at: DateTime<Utc>,
}

impl AuditRecord {
	/// Sets the retention horizon. Zero means effectively forever (a
	/// hundred years).
	pub fn set_expiry(&mut self, expires_in_secs: i64) {
		let expiry = if expires_in_secs == 0 {
			Duration::hours(24 * 365 * 100)
		} else {
			Duration::seconds(expires_in_secs)
		};
		self.expire_at = Utc::now() + expiry;
	}

	/// Encodes the record for queue transit.
	pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
		rmp_serde::to_vec_named(self)
	}

	/// Decodes a record drained from the queue.
	pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
		rmp_serde::from_slice(bytes)
	}
}
