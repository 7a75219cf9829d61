// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pump configuration section: drain cadence and sink declarations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const DEFAULT_PURGE_DELAY_SECS: u64 = 10;
const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:7070";

/// Record filters applied by a sink before writing.
///
/// Empty filter lists pass everything; `skip_usernames` wins over
/// `usernames`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SinkFilterConfig {
	#[serde(default)]
	pub usernames: Vec<String>,
	#[serde(default)]
	pub skip_usernames: Vec<String>,
	#[serde(default)]
	pub effects: Vec<String>,
}

impl SinkFilterConfig {
	pub fn is_empty(&self) -> bool {
		self.usernames.is_empty() && self.skip_usernames.is_empty() && self.effects.is_empty()
	}
}

/// One configured sink instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkConfig {
	/// Registry name of the sink implementation. Unknown names are logged
	/// and skipped at startup.
	#[serde(rename = "type")]
	pub kind: String,
	/// Sink-specific settings (file path, endpoint URL, ...).
	#[serde(default)]
	pub meta: HashMap<String, String>,
	#[serde(default)]
	pub filters: SinkFilterConfig,
	/// Per-write timeout in seconds; zero disables the timeout.
	#[serde(default)]
	pub timeout_secs: u64,
	#[serde(default)]
	pub omit_detailed_recording: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PumpConfigLayer {
	pub purge_delay_secs: Option<u64>,
	pub omit_detailed_recording: Option<bool>,
	pub health_addr: Option<String>,
	pub sinks: Option<Vec<SinkConfig>>,
}

impl PumpConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.purge_delay_secs.is_some() {
			self.purge_delay_secs = other.purge_delay_secs;
		}
		if other.omit_detailed_recording.is_some() {
			self.omit_detailed_recording = other.omit_detailed_recording;
		}
		if other.health_addr.is_some() {
			self.health_addr = other.health_addr;
		}
		if other.sinks.is_some() {
			self.sinks = other.sinks;
		}
	}

	pub fn finalize(self) -> PumpConfig {
		PumpConfig {
			purge_delay_secs: self
				.purge_delay_secs
				.unwrap_or(DEFAULT_PURGE_DELAY_SECS)
				.max(1),
			omit_detailed_recording: self.omit_detailed_recording.unwrap_or(false),
			health_addr: self
				.health_addr
				.unwrap_or_else(|| DEFAULT_HEALTH_ADDR.to_string()),
			sinks: self.sinks.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpConfig {
	/// Seconds between drain ticks.
	pub purge_delay_secs: u64,
	/// Clears `policies`/`deciders` on every record before fan-out.
	pub omit_detailed_recording: bool,
	pub health_addr: String,
	pub sinks: Vec<SinkConfig>,
}

impl Default for PumpConfig {
	fn default() -> Self {
		PumpConfigLayer::default().finalize()
	}
}
