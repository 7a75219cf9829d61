// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redis-backed [`SharedStore`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use tracing::instrument;
use uuid::Uuid;
use warden_config::RedisConfig;

use crate::error::StorageError;
use crate::{Lease, MessageStream, SharedStore};

const RELEASE_SCRIPT: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
	return redis.call('del', KEYS[1])
else
	return 0
end
"#;

/// Production store on a single Redis endpoint.
///
/// Commands run over a [`ConnectionManager`], which reconnects
/// transparently. Subscriptions use a dedicated connection per call because
/// a Redis connection in subscriber mode cannot run regular commands.
pub struct RedisStore {
	client: redis::Client,
	conn: ConnectionManager,
	key_prefix: String,
}

impl RedisStore {
	pub async fn connect(config: &RedisConfig) -> Result<Self, StorageError> {
		let client = redis::Client::open(config.url.as_str())?;
		let conn = ConnectionManager::new(client.clone()).await?;

		Ok(Self {
			client,
			conn,
			key_prefix: config.key_prefix.clone(),
		})
	}

	fn prefixed(&self, key: &str) -> String {
		format!("{}{}", self.key_prefix, key)
	}
}

#[async_trait]
impl SharedStore for RedisStore {
	#[instrument(level = "debug", skip(self, payload))]
	async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), StorageError> {
		let mut conn = self.conn.clone();
		redis::cmd("PUBLISH")
			.arg(channel)
			.arg(payload)
			.query_async::<_, ()>(&mut conn)
			.await?;
		Ok(())
	}

	async fn subscribe(&self, channel: &str) -> Result<MessageStream, StorageError> {
		let mut pubsub = self.client.get_async_pubsub().await?;
		pubsub.subscribe(channel).await?;

		let stream = pubsub
			.into_on_message()
			.map(|msg| msg.get_payload::<Vec<u8>>().unwrap_or_default());

		Ok(Box::pin(stream))
	}

	#[instrument(level = "debug", skip(self, values), fields(count = values.len()))]
	async fn append_to_list(&self, key: &str, values: Vec<Vec<u8>>) -> Result<(), StorageError> {
		if values.is_empty() {
			return Ok(());
		}

		let mut conn = self.conn.clone();
		redis::cmd("RPUSH")
			.arg(self.prefixed(key))
			.arg(values)
			.query_async::<_, ()>(&mut conn)
			.await?;
		Ok(())
	}

	#[instrument(level = "debug", skip(self))]
	async fn get_and_delete_set(&self, key: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let key = self.prefixed(key);
		let mut conn = self.conn.clone();

		let mut pipe = redis::pipe();
		pipe.atomic().lrange(&key, 0, -1).del(&key);
		let (values, _deleted): (Vec<Vec<u8>>, i64) = pipe.query_async(&mut conn).await?;

		Ok(values)
	}

	#[instrument(level = "debug", skip(self))]
	async fn acquire_lease(
		&self,
		name: &str,
		ttl: Duration,
	) -> Result<Option<Lease>, StorageError> {
		let token = Uuid::new_v4().to_string();
		let mut conn = self.conn.clone();

		let claimed: Option<String> = redis::cmd("SET")
			.arg(name)
			.arg(&token)
			.arg("NX")
			.arg("PX")
			.arg(ttl.as_millis() as u64)
			.query_async(&mut conn)
			.await?;

		Ok(claimed.map(|_| Lease {
			name: name.to_string(),
			token,
		}))
	}

	#[instrument(level = "debug", skip(self, lease), fields(name = %lease.name))]
	async fn release_lease(&self, lease: &Lease) -> Result<(), StorageError> {
		let mut conn = self.conn.clone();
		redis::Script::new(RELEASE_SCRIPT)
			.key(&lease.name)
			.arg(&lease.token)
			.invoke_async::<_, i64>(&mut conn)
			.await?;
		Ok(())
	}
}
