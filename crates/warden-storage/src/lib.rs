// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared key/value service used for cross-service coordination.
//!
//! One external store (Redis in production) provides four capabilities:
//!
//! - **Pub/sub**: the cache invalidation channel. At-least-once while
//!   connected, no durability across disconnects.
//! - **List append**: audit records are appended in pipelined batches.
//! - **Atomic drain**: the pump takes the whole list and deletes it in one
//!   transaction.
//! - **Leases**: time-bounded exclusive claims on a name, used to keep a
//!   single writer across pump replicas and watcher jobs.
//!
//! [`SharedStore`] is the seam; [`RedisStore`] is the production
//! implementation and [`MemoryStore`] the in-process implementation used by
//! tests and local development.

pub mod error;
pub mod memory;
pub mod redis;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use redis::RedisStore;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

/// Stream of raw messages from a pub/sub subscription.
///
/// The stream ends when the underlying connection drops; consumers
/// re-subscribe (with backoff) to keep listening.
pub type MessageStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// A held lease. Dropping the value does not release the claim; callers
/// release explicitly or let the TTL expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
	pub name: String,
	pub token: String,
}

#[async_trait]
pub trait SharedStore: Send + Sync {
	/// Publishes a message on a channel. Fire-and-forget towards
	/// subscribers.
	async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), StorageError>;

	/// Opens a subscription on a channel.
	async fn subscribe(&self, channel: &str) -> Result<MessageStream, StorageError>;

	/// Appends values to a list as one pipelined command.
	async fn append_to_list(&self, key: &str, values: Vec<Vec<u8>>) -> Result<(), StorageError>;

	/// Atomically reads and deletes an entire list.
	async fn get_and_delete_set(&self, key: &str) -> Result<Vec<Vec<u8>>, StorageError>;

	/// Attempts to acquire a named lease. Returns `None` when another
	/// holder currently owns the name.
	async fn acquire_lease(&self, name: &str, ttl: Duration)
		-> Result<Option<Lease>, StorageError>;

	/// Releases a lease if it is still held with the same token. Releasing
	/// an expired or stolen lease is a no-op.
	async fn release_lease(&self, lease: &Lease) -> Result<(), StorageError>;
}
