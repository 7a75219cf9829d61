// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Worker-pooled audit record shipping.
//!
//! Records enter through a bounded MPMC channel and are consumed by a pool
//! of identical workers. Each worker accumulates encoded records in a local
//! buffer and ships the buffer to the shared queue as one pipelined append
//! when any of three triggers fires:
//!
//! - the buffer reaches its size (`records_buffer_size / pool_size`)
//! - nothing arrived for `flush_interval_ms`
//! - the last ship is more than one second old (forced flush)
//!
//! A full ingress channel blocks `record()` callers. That backpressure is
//! deliberate: under sustained overload the authorize handlers slow down
//! instead of audit records being silently discarded.
//!
//! Shutdown closes the channel; workers drain their buffers and exit, so
//! every record accepted before [`Recorder::stop`] reaches the queue.
//! Records submitted after stop are dropped and counted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use warden_config::AnalyticsConfig;
use warden_storage::SharedStore;

use crate::record::AuditRecord;

/// Shared queue key holding audit records awaiting the pump.
pub const ANALYTICS_QUEUE_KEY: &str = "warden-system-analytics";

/// No worker buffer may hold a record longer than this, regardless of the
/// configured flush interval.
const FORCED_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

pub struct Recorder {
	tx: async_channel::Sender<AuditRecord>,
	should_stop: Arc<AtomicBool>,
	dropped: Arc<AtomicU64>,
	workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Recorder {
	/// Starts the worker pool and returns the process-wide recorder.
	pub fn start(config: &AnalyticsConfig, store: Arc<dyn SharedStore>) -> Self {
		let (tx, rx) = async_channel::bounded(config.records_buffer_size);
		let worker_buffer_size = (config.records_buffer_size / config.pool_size).max(1);
		let flush_interval = Duration::from_millis(config.flush_interval_ms.max(1));

		debug!(
			pool_size = config.pool_size,
			worker_buffer_size, "starting analytics worker pool"
		);

		let mut workers = Vec::with_capacity(config.pool_size);
		for _ in 0..config.pool_size {
			let rx = rx.clone();
			let store = Arc::clone(&store);
			workers.push(tokio::spawn(record_worker(
				rx,
				store,
				worker_buffer_size,
				flush_interval,
			)));
		}

		Self {
			tx,
			should_stop: Arc::new(AtomicBool::new(false)),
			dropped: Arc::new(AtomicU64::new(0)),
			workers: tokio::sync::Mutex::new(workers),
		}
	}

	/// Submits a record for shipping.
	///
	/// Blocks while the ingress channel is full. After [`Recorder::stop`]
	/// has begun the record is dropped and the drop counter incremented.
	pub async fn record(&self, record: AuditRecord) {
		if self.should_stop.load(Ordering::SeqCst) {
			self.dropped.fetch_add(1, Ordering::SeqCst);
			return;
		}

		if self.tx.send(record).await.is_err() {
			// Channel closed between the flag check and the send.
			self.dropped.fetch_add(1, Ordering::SeqCst);
		}
	}

	/// Number of records dropped because they arrived during or after
	/// shutdown.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::SeqCst)
	}

	/// Stops the pool: no new records are accepted, workers flush their
	/// buffers and exit. Waits for the drain to complete.
	pub async fn stop(&self) {
		self.should_stop.store(true, Ordering::SeqCst);
		self.tx.close();

		let mut workers = self.workers.lock().await;
		for handle in workers.drain(..) {
			let _ = handle.await;
		}

		info!(dropped = self.dropped(), "analytics recorder stopped");
	}
}

async fn record_worker(
	rx: async_channel::Receiver<AuditRecord>,
	store: Arc<dyn SharedStore>,
	worker_buffer_size: usize,
	flush_interval: Duration,
) {
	let mut buffer: Vec<Vec<u8>> = Vec::with_capacity(worker_buffer_size);
	let mut last_sent = Instant::now();

	loop {
		let mut ready_to_send = false;

		tokio::select! {
			received = rx.recv() => {
				match received {
					Ok(record) => {
						match record.encode() {
							Ok(encoded) => {
								buffer.push(encoded);
								ready_to_send = buffer.len() == worker_buffer_size;
							}
							Err(e) => error!(error = %e, "failed to encode audit record"),
						}
					}
					// Channel closed: ship what is left and exit.
					Err(_) => {
						flush(store.as_ref(), &mut buffer).await;
						return;
					}
				}
			}
			_ = tokio::time::sleep(flush_interval) => {
				// Quiet period; do not hold partial batches.
				ready_to_send = true;
			}
		}

		if !buffer.is_empty()
			&& (ready_to_send || last_sent.elapsed() >= FORCED_FLUSH_INTERVAL)
		{
			flush(store.as_ref(), &mut buffer).await;
			last_sent = Instant::now();
		}
	}
}

async fn flush(store: &dyn SharedStore, buffer: &mut Vec<Vec<u8>>) {
	if buffer.is_empty() {
		return;
	}

	if let Err(e) = store
		.append_to_list(ANALYTICS_QUEUE_KEY, std::mem::take(buffer))
		.await
	{
		error!(error = %e, "failed to append audit records to shared queue");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use warden_storage::MemoryStore;

	fn config(pool_size: usize, records_buffer_size: usize, flush_interval_ms: u64) -> AnalyticsConfig {
		AnalyticsConfig {
			enabled: true,
			pool_size,
			records_buffer_size,
			flush_interval_ms,
		}
	}

	fn record(username: &str) -> AuditRecord {
		AuditRecord {
			timestamp: Utc::now().timestamp(),
			username: username.to_string(),
			effect: "allow".to_string(),
			conclusion: String::new(),
			request: String::new(),
			policies: String::new(),
			deciders: String::new(),
			expire_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn full_worker_buffer_triggers_a_flush() {
		let store = Arc::new(MemoryStore::new());
		let recorder = Recorder::start(&config(1, 4, 60_000), Arc::clone(&store) as _);

		for _ in 0..4 {
			recorder.record(record("alice")).await;
		}

		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(store.list_len(ANALYTICS_QUEUE_KEY), 4);
	}

	#[tokio::test]
	async fn idle_flush_ships_partial_batches() {
		let store = Arc::new(MemoryStore::new());
		let recorder = Recorder::start(&config(1, 1000, 20), Arc::clone(&store) as _);

		recorder.record(record("alice")).await;

		tokio::time::sleep(Duration::from_millis(200)).await;
		assert_eq!(store.list_len(ANALYTICS_QUEUE_KEY), 1);
	}

	#[tokio::test]
	async fn stop_drains_every_accepted_record() {
		let store = Arc::new(MemoryStore::new());
		let recorder = Recorder::start(&config(8, 256, 60_000), Arc::clone(&store) as _);

		for i in 0..10_000 {
			recorder.record(record(&format!("user-{i}"))).await;
		}

		recorder.stop().await;

		assert_eq!(store.list_len(ANALYTICS_QUEUE_KEY), 10_000);
		assert_eq!(recorder.dropped(), 0);
	}

	#[tokio::test]
	async fn records_after_stop_are_dropped_and_counted() {
		let store = Arc::new(MemoryStore::new());
		let recorder = Recorder::start(&config(2, 16, 10), Arc::clone(&store) as _);

		recorder.record(record("before")).await;
		recorder.stop().await;

		recorder.record(record("after")).await;
		recorder.record(record("after")).await;

		assert_eq!(recorder.dropped(), 2);
		assert_eq!(store.list_len(ANALYTICS_QUEUE_KEY), 1);
	}

	#[tokio::test]
	async fn shipped_records_decode_back() {
		let store = Arc::new(MemoryStore::new());
		let recorder = Recorder::start(&config(1, 4, 10), Arc::clone(&store) as _);

		recorder.record(record("alice")).await;
		recorder.stop().await;

		let drained = store.get_and_delete_set(ANALYTICS_QUEUE_KEY).await.unwrap();
		assert_eq!(drained.len(), 1);
		let decoded = AuditRecord::decode(&drained[0]).unwrap();
		assert_eq!(decoded.username, "alice");
	}
}
