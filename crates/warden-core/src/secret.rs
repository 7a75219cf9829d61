// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// A signing secret issued by the control plane.
///
/// The `secret_id` doubles as the JWT `kid` header value: a token carries the
/// id of the secret it was signed with, and the data plane resolves the id
/// against its cache to find the verification key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
	/// Opaque identifier, used as the JWT `kid`.
	pub secret_id: String,
	/// Owner of the secret. Authenticated requests run as this user.
	pub username: String,
	/// Raw HMAC signing key material.
	pub secret_key: String,
	/// Unix timestamp (seconds) after which the secret is rejected.
	/// Zero means the secret never expires.
	pub expires: i64,
}

impl Secret {
	/// Returns true if the secret has expired at `now` (unix seconds).
	///
	/// A zero (or negative) `expires` marks a non-expiring secret.
	pub fn is_expired(&self, now: i64) -> bool {
		self.expires >= 1 && now >= self.expires
	}
}
