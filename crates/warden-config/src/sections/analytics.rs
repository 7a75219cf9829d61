// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit recording (analytics) configuration section.

use serde::{Deserialize, Serialize};

const DEFAULT_POOL_SIZE: usize = 50;
const DEFAULT_RECORDS_BUFFER_SIZE: usize = 1000;
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfigLayer {
	pub enabled: Option<bool>,
	pub pool_size: Option<usize>,
	pub records_buffer_size: Option<usize>,
	pub flush_interval_ms: Option<u64>,
}

impl AnalyticsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.pool_size.is_some() {
			self.pool_size = other.pool_size;
		}
		if other.records_buffer_size.is_some() {
			self.records_buffer_size = other.records_buffer_size;
		}
		if other.flush_interval_ms.is_some() {
			self.flush_interval_ms = other.flush_interval_ms;
		}
	}

	pub fn finalize(self) -> AnalyticsConfig {
		AnalyticsConfig {
			enabled: self.enabled.unwrap_or(true),
			pool_size: self.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1),
			records_buffer_size: self
				.records_buffer_size
				.unwrap_or(DEFAULT_RECORDS_BUFFER_SIZE)
				.max(1),
			flush_interval_ms: self.flush_interval_ms.unwrap_or(DEFAULT_FLUSH_INTERVAL_MS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
	/// Gate on audit recording. Disabled deployments skip the worker pool
	/// entirely.
	pub enabled: bool,
	/// Number of batching workers.
	pub pool_size: usize,
	/// Capacity of the shared ingress channel. Full channel applies
	/// backpressure to the authorize handlers.
	pub records_buffer_size: usize,
	/// Idle interval after which a worker ships a partial batch.
	pub flush_interval_ms: u64,
}

impl Default for AnalyticsConfig {
	fn default() -> Self {
		AnalyticsConfigLayer::default().finalize()
	}
}
