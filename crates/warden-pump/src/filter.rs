// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use warden_analytics::AuditRecord;
use warden_config::SinkFilterConfig;

/// Per-sink record filter.
///
/// Empty filter lists pass everything. `skip_usernames` wins over
/// `usernames` when both name the same user.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
	config: SinkFilterConfig,
}

impl RecordFilter {
	pub fn new(config: SinkFilterConfig) -> Self {
		Self { config }
	}

	pub fn has_filter(&self) -> bool {
		!self.config.is_empty()
	}

	/// Returns true when the record should be dropped for this sink.
	pub fn should_filter(&self, record: &AuditRecord) -> bool {
		if self
			.config
			.skip_usernames
			.iter()
			.any(|u| u == &record.username)
		{
			return true;
		}

		if !self.config.usernames.is_empty()
			&& !self.config.usernames.iter().any(|u| u == &record.username)
		{
			return true;
		}

		if !self.config.effects.is_empty()
			&& !self.config.effects.iter().any(|e| e == &record.effect)
		{
			return true;
		}

		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn record(username: &str, effect: &str) -> AuditRecord {
		AuditRecord {
			timestamp: 0,
			username: username.to_string(),
			effect: effect.to_string(),
			conclusion: String::new(),
			request: String::new(),
			policies: String::new(),
			deciders: String::new(),
			expire_at: Utc::now(),
		}
	}

	#[test]
	fn empty_filter_passes_everything() {
		let filter = RecordFilter::default();
		assert!(!filter.has_filter());
		assert!(!filter.should_filter(&record("anyone", "allow")));
	}

	#[test]
	fn username_allowlist_drops_others() {
		let filter = RecordFilter::new(SinkFilterConfig {
			usernames: vec!["alice".to_string()],
			..Default::default()
		});
		assert!(!filter.should_filter(&record("alice", "allow")));
		assert!(filter.should_filter(&record("bob", "allow")));
	}

	#[test]
	fn skip_usernames_wins_over_allowlist() {
		let filter = RecordFilter::new(SinkFilterConfig {
			usernames: vec!["alice".to_string()],
			skip_usernames: vec!["alice".to_string()],
			..Default::default()
		});
		assert!(filter.should_filter(&record("alice", "allow")));
	}

	#[test]
	fn effect_filter_selects_by_decision() {
		let filter = RecordFilter::new(SinkFilterConfig {
			effects: vec!["deny".to_string()],
			..Default::default()
		});
		assert!(!filter.should_filter(&record("alice", "deny")));
		assert!(filter.should_filter(&record("alice", "allow")));
	}
}
