// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redis transport configuration section.
//!
//! Redis backs the shared key/value service: the invalidation pub/sub
//! channel, the audit record queue and the distributed leases.

use serde::{Deserialize, Serialize};

const DEFAULT_URL: &str = "redis://127.0.0.1:6379/0";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RedisConfigLayer {
	pub url: Option<String>,
	/// Prefix applied to every queue key, for sharing one Redis between
	/// environments.
	pub key_prefix: Option<String>,
}

impl RedisConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.key_prefix.is_some() {
			self.key_prefix = other.key_prefix;
		}
	}

	pub fn finalize(self) -> RedisConfig {
		RedisConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
			key_prefix: self.key_prefix.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedisConfig {
	pub url: String,
	pub key_prefix: String,
}

impl Default for RedisConfig {
	fn default() -> Self {
		RedisConfigLayer::default().finalize()
	}
}
