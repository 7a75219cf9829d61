// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process [`SharedStore`] for tests and local development.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::StorageError;
use crate::{Lease, MessageStream, SharedStore};

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Default)]
struct Inner {
	lists: HashMap<String, Vec<Vec<u8>>>,
	leases: HashMap<String, (String, Instant)>,
	channels: HashMap<String, broadcast::Sender<Vec<u8>>>,
}

/// Memory-backed store with the same semantics as the Redis one: atomic
/// drain, expiring leases, best-effort pub/sub.
#[derive(Default)]
pub struct MemoryStore {
	inner: Mutex<Inner>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Peeks at a list without draining it. Test helper.
	pub fn list_len(&self, key: &str) -> usize {
		let inner = self.inner.lock();
		inner.lists.get(key).map(Vec::len).unwrap_or(0)
	}

	fn sender(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
		let mut inner = self.inner.lock();
		inner
			.channels
			.entry(channel.to_string())
			.or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
			.clone()
	}
}

#[async_trait]
impl SharedStore for MemoryStore {
	async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), StorageError> {
		// A send error only means nobody is subscribed right now, which
		// matches pub/sub semantics.
		let _ = self.sender(channel).send(payload.to_vec());
		Ok(())
	}

	async fn subscribe(&self, channel: &str) -> Result<MessageStream, StorageError> {
		let rx = self.sender(channel).subscribe();
		let stream = BroadcastStream::new(rx).filter_map(|item| async move { item.ok() });
		Ok(Box::pin(stream))
	}

	async fn append_to_list(&self, key: &str, values: Vec<Vec<u8>>) -> Result<(), StorageError> {
		let mut inner = self.inner.lock();
		inner.lists.entry(key.to_string()).or_default().extend(values);
		Ok(())
	}

	async fn get_and_delete_set(&self, key: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let mut inner = self.inner.lock();
		Ok(inner.lists.remove(key).unwrap_or_default())
	}

	async fn acquire_lease(
		&self,
		name: &str,
		ttl: Duration,
	) -> Result<Option<Lease>, StorageError> {
		let mut inner = self.inner.lock();
		let now = Instant::now();

		if let Some((_, expires)) = inner.leases.get(name) {
			if *expires > now {
				return Ok(None);
			}
		}

		let token = Uuid::new_v4().to_string();
		inner
			.leases
			.insert(name.to_string(), (token.clone(), now + ttl));

		Ok(Some(Lease {
			name: name.to_string(),
			token,
		}))
	}

	async fn release_lease(&self, lease: &Lease) -> Result<(), StorageError> {
		let mut inner = self.inner.lock();
		if let Some((token, _)) = inner.leases.get(&lease.name) {
			if *token == lease.token {
				inner.leases.remove(&lease.name);
			}
		}
		Ok(())
	}
}
