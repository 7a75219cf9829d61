// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy-audit retention job.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};
use warden_apiserver::store::PolicyAuditStore;

use crate::{Watcher, WatcherError};

const CLEAN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Deletes policy-audit rows past the retention window once a day.
pub struct CleanWatcher {
	policy_audits: PolicyAuditStore,
	max_reserve_days: i64,
}

impl CleanWatcher {
	pub fn new(policy_audits: PolicyAuditStore, max_reserve_days: i64) -> Self {
		Self {
			policy_audits,
			max_reserve_days,
		}
	}
}

#[async_trait]
impl Watcher for CleanWatcher {
	fn name(&self) -> &'static str {
		"clean"
	}

	fn schedule(&self) -> Duration {
		CLEAN_INTERVAL
	}

	async fn run(&self) -> Result<(), WatcherError> {
		match self.policy_audits.clear_outdated(self.max_reserve_days).await {
			Ok(rows_affected) => {
				debug!(rows_affected, "cleaned outdated policy audit rows");
				Ok(())
			}
			Err(e) => {
				error!(error = %e, "policy audit cleanup failed");
				Err(WatcherError::Failed(e.to_string()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration as ChronoDuration, Utc};
	use warden_apiserver::db::memory_pool;

	#[tokio::test]
	async fn run_removes_only_outdated_rows() {
		let pool = memory_pool().await;
		let audits = PolicyAuditStore::new(pool.clone());

		let old = (Utc::now() - ChronoDuration::days(200)).to_rfc3339();
		let recent = Utc::now().to_rfc3339();
		for deleted_at in [&old, &recent] {
			sqlx::query(
				"INSERT INTO policy_audit (name, username, policy_shadow, deleted_at) VALUES ('p', 'alice', '{}', ?)",
			)
			.bind(deleted_at)
			.execute(&pool)
			.await
			.unwrap();
		}

		let watcher = CleanWatcher::new(audits.clone(), 90);
		watcher.run().await.unwrap();

		assert_eq!(audits.count().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn run_on_empty_table_succeeds() {
		let pool = memory_pool().await;
		let watcher = CleanWatcher::new(PolicyAuditStore::new(pool), 90);
		watcher.run().await.unwrap();
	}
}
