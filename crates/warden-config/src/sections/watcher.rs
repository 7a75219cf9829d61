// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Watcher (maintenance job) configuration section.

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_RESERVE_DAYS: i64 = 90;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleanConfigLayer {
	pub max_reserve_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatcherConfigLayer {
	pub clean: Option<CleanConfigLayer>,
}

impl WatcherConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.clean.is_some() {
			self.clean = other.clean;
		}
	}

	pub fn finalize(self) -> WatcherConfig {
		let clean = self.clean.unwrap_or_default();
		WatcherConfig {
			clean: CleanConfig {
				max_reserve_days: clean.max_reserve_days.unwrap_or(DEFAULT_MAX_RESERVE_DAYS),
			},
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanConfig {
	/// Policy-audit rows older than this many days are deleted.
	pub max_reserve_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherConfig {
	pub clean: CleanConfig,
}

impl Default for WatcherConfig {
	fn default() -> Self {
		WatcherConfigLayer::default().finalize()
	}
}
