// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Content cache for secrets and policies.
//!
//! The cache holds the data plane's working set: every secret keyed by id
//! and every user's policy list keyed by username. Lookups sit on the
//! authorization hot path and go straight to concurrent maps; a reload
//! replaces both maps wholesale from a control-plane snapshot.
//!
//! # Consistency
//!
//! Readers take the shared side of a read/write lock across the whole
//! lookup; a reload takes the exclusive side only for the clear-and-fill.
//! Readers therefore observe either the pre-reload or the post-reload
//! state, never a torn mix. Snapshot fetching happens before the exclusive
//! section, so a failed fetch leaves the cache untouched, and a separate
//! async mutex keeps reloads serialized without holding the readers' lock
//! across network calls.

use std::sync::Arc;

use moka::sync::Cache as MokaCache;
use parking_lot::RwLock;
use tracing::{debug, instrument};
use warden_authn::SecretGetter;
use warden_authz::PolicyGetter;
use warden_core::{Policy, Secret};

use crate::error::SyncError;
use crate::upstream::SnapshotSource;

/// Entry bound per map. Admission is frequency-biased (TinyLFU), so
/// one-shot keys do not evict the working set.
const CACHE_MAX_CAPACITY: u64 = 10_000_000;

pub struct Cache {
	source: Arc<dyn SnapshotSource>,
	lock: RwLock<()>,
	reload_section: tokio::sync::Mutex<()>,
	secrets: MokaCache<String, Arc<Secret>>,
	policies: MokaCache<String, Arc<Vec<Policy>>>,
}

impl Cache {
	pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
		Self {
			source,
			lock: RwLock::new(()),
			reload_section: tokio::sync::Mutex::new(()),
			secrets: MokaCache::builder().max_capacity(CACHE_MAX_CAPACITY).build(),
			policies: MokaCache::builder().max_capacity(CACHE_MAX_CAPACITY).build(),
		}
	}

	/// Looks up a secret by key id.
	pub fn get_secret(&self, secret_id: &str) -> Result<Arc<Secret>, SyncError> {
		let _shared = self.lock.read();
		self.secrets.get(secret_id).ok_or(SyncError::SecretNotFound)
	}

	/// Looks up a user's policy list.
	pub fn get_policies(&self, username: &str) -> Result<Arc<Vec<Policy>>, SyncError> {
		let _shared = self.lock.read();
		self.policies.get(username).ok_or(SyncError::PolicyNotFound)
	}

	/// Replaces the cache contents with a fresh control-plane snapshot.
	///
	/// Only one reload runs at a time. A failed snapshot call aborts the
	/// reload with the cache untouched.
	#[instrument(level = "debug", skip(self))]
	pub async fn reload(&self) -> Result<(), SyncError> {
		let _exclusive_reload = self.reload_section.lock().await;

		let secrets = self.source.list_secrets().await?;
		let policies = self.source.list_policies().await?;

		let secret_count = secrets.len();
		let policy_count = policies.values().map(Vec::len).sum::<usize>();

		{
			let _exclusive = self.lock.write();

			self.secrets.invalidate_all();
			for (id, secret) in secrets {
				self.secrets.insert(id, Arc::new(secret));
			}

			self.policies.invalidate_all();
			for (username, list) in policies {
				self.policies.insert(username, Arc::new(list));
			}
		}

		debug!(secret_count, policy_count, "cache reloaded");
		Ok(())
	}
}

#[async_trait::async_trait]
impl SecretGetter for Cache {
	async fn get_secret(&self, kid: &str) -> Option<Arc<Secret>> {
		Cache::get_secret(self, kid).ok()
	}
}

impl PolicyGetter for Cache {
	fn get_policies(&self, username: &str) -> Option<Arc<Vec<Policy>>> {
		Cache::get_policies(self, username).ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::FakeSource;
	use warden_core::Effect;

	fn secret(id: &str, username: &str) -> Secret {
		Secret {
			secret_id: id.to_string(),
			username: username.to_string(),
			secret_key: "sek".to_string(),
			expires: 0,
		}
	}

	fn policy(id: &str) -> Policy {
		Policy {
			id: id.to_string(),
			description: String::new(),
			subjects: vec!["alice".to_string()],
			resources: vec!["doc:1".to_string()],
			actions: vec!["read".to_string()],
			effect: Effect::Allow,
			conditions: Default::default(),
		}
	}

	#[tokio::test]
	async fn lookups_miss_before_first_reload() {
		let cache = Cache::new(Arc::new(FakeSource::default()));
		assert!(matches!(
			cache.get_secret("k1"),
			Err(SyncError::SecretNotFound)
		));
		assert!(matches!(
			cache.get_policies("alice"),
			Err(SyncError::PolicyNotFound)
		));
	}

	#[tokio::test]
	async fn reload_populates_both_maps() {
		let source = Arc::new(FakeSource::default());
		source.put_secret(secret("k1", "alice"));
		source.put_policies("alice", vec![policy("p1")]);

		let cache = Cache::new(Arc::clone(&source) as _);
		cache.reload().await.unwrap();

		assert_eq!(cache.get_secret("k1").unwrap().username, "alice");
		assert_eq!(cache.get_policies("alice").unwrap()[0].id, "p1");
	}

	#[tokio::test]
	async fn reload_evicts_removed_entries() {
		let source = Arc::new(FakeSource::default());
		source.put_secret(secret("k1", "alice"));

		let cache = Cache::new(Arc::clone(&source) as _);
		cache.reload().await.unwrap();
		assert!(cache.get_secret("k1").is_ok());

		source.clear();
		source.put_secret(secret("k2", "bob"));
		cache.reload().await.unwrap();

		assert!(matches!(
			cache.get_secret("k1"),
			Err(SyncError::SecretNotFound)
		));
		assert_eq!(cache.get_secret("k2").unwrap().username, "bob");
	}

	#[tokio::test]
	async fn failed_fetch_leaves_cache_untouched() {
		let source = Arc::new(FakeSource::default());
		source.put_secret(secret("k1", "alice"));

		let cache = Cache::new(Arc::clone(&source) as _);
		cache.reload().await.unwrap();

		source.fail_next();
		assert!(cache.reload().await.is_err());

		// The previous snapshot still serves.
		assert_eq!(cache.get_secret("k1").unwrap().username, "alice");
	}

	#[tokio::test]
	async fn reload_is_idempotent_for_unchanged_upstream() {
		let source = Arc::new(FakeSource::default());
		source.put_secret(secret("k1", "alice"));
		source.put_policies("alice", vec![policy("p1"), policy("p2")]);

		let cache = Cache::new(Arc::clone(&source) as _);
		cache.reload().await.unwrap();
		let before_secret = cache.get_secret("k1").unwrap();
		let before_policies = cache.get_policies("alice").unwrap();

		cache.reload().await.unwrap();
		let after_secret = cache.get_secret("k1").unwrap();
		let after_policies = cache.get_policies("alice").unwrap();

		assert_eq!(*before_secret, *after_secret);
		assert_eq!(*before_policies, *after_policies);
	}
}
