// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Queued, coalescing cache reloads.
//!
//! Two background tasks drive cache freshness:
//!
//! - a **subscriber** listens on the cluster notification channel and
//!   pushes a reload request into a mutex-guarded queue for every relevant
//!   notification; subscription failures back off ten seconds and
//!   reconnect
//! - a **tick loop** fires once a second, swaps the queue out, and when it
//!   was non-empty performs a single reload, then runs any callbacks that
//!   were attached to the queued requests
//!
//! The tick both coalesces bursts (a client uploading a hundred policies
//! causes one reload, not a hundred) and bounds the reload rate. On
//! startup [`Loader::warm`] reloads synchronously so the cache is
//! populated before the HTTP listener accepts traffic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use warden_core::{Notification, NotificationCommand, NOTIFICATIONS_CHANNEL};
use warden_storage::SharedStore;

use crate::cache::Cache;
use crate::error::SyncError;

/// Backoff after a failed subscribe or a dropped subscription.
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(10);

/// Minimum time between reloads; the interval counts from the start of one
/// reload to the next.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Callback invoked after the reload its request was drained into.
pub type ReloadCallback = Box<dyn FnOnce() + Send>;

struct ReloadRequest {
	callback: Option<ReloadCallback>,
}

pub struct Loader {
	cache: Arc<Cache>,
	store: Arc<dyn SharedStore>,
	queue: Arc<Mutex<Vec<ReloadRequest>>>,
	tick_interval: Duration,
	shutdown_tx: broadcast::Sender<()>,
	handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Loader {
	pub fn new(cache: Arc<Cache>, store: Arc<dyn SharedStore>) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			cache,
			store,
			queue: Arc::new(Mutex::new(Vec::new())),
			tick_interval: DEFAULT_TICK_INTERVAL,
			shutdown_tx,
			handles: tokio::sync::Mutex::new(Vec::new()),
		}
	}

	/// Overrides the coalescing tick, for tests.
	pub fn with_tick_interval(mut self, interval: Duration) -> Self {
		self.tick_interval = interval;
		self
	}

	/// Performs the synchronous warm-up reload. Call before serving.
	pub async fn warm(&self) -> Result<(), SyncError> {
		self.cache.reload().await
	}

	/// Queues a reload for the next tick. The callback, when given, runs
	/// after that reload completes.
	pub fn enqueue_reload(&self, callback: Option<ReloadCallback>) {
		let mut queue = self.queue.lock();
		queue.push(ReloadRequest { callback });
		debug!(queued = queue.len(), "reload queued");
	}

	/// Spawns the subscriber and tick tasks.
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		handles.push(tokio::spawn(subscriber_loop(
			Arc::clone(&self.store),
			Arc::clone(&self.queue),
			self.shutdown_tx.subscribe(),
		)));

		handles.push(tokio::spawn(tick_loop(
			Arc::clone(&self.cache),
			Arc::clone(&self.queue),
			self.tick_interval,
			self.shutdown_tx.subscribe(),
		)));
	}

	/// Stops both tasks. An in-flight reload completes first.
	pub async fn stop(&self) {
		let _ = self.shutdown_tx.send(());
		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}
		info!("loader stopped");
	}
}

async fn subscriber_loop(
	store: Arc<dyn SharedStore>,
	queue: Arc<Mutex<Vec<ReloadRequest>>>,
	mut shutdown: broadcast::Receiver<()>,
) {
	loop {
		let mut stream = tokio::select! {
			result = store.subscribe(NOTIFICATIONS_CHANNEL) => match result {
				Ok(stream) => stream,
				Err(e) => {
					if !e.is_down() {
						error!(error = %e, "notification subscribe failed, reconnect in 10s");
					}
					tokio::select! {
						_ = tokio::time::sleep(RESUBSCRIBE_DELAY) => continue,
						_ = shutdown.recv() => return,
					}
				}
			},
			_ = shutdown.recv() => return,
		};

		loop {
			tokio::select! {
				message = stream.next() => match message {
					Some(payload) => handle_notification(&payload, &queue),
					// Subscription dropped; back off and resubscribe.
					None => {
						warn!("notification subscription lost, reconnect in 10s");
						tokio::select! {
							_ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
							_ = shutdown.recv() => return,
						}
						break;
					}
				},
				_ = shutdown.recv() => return,
			}
		}
	}
}

fn handle_notification(payload: &[u8], queue: &Mutex<Vec<ReloadRequest>>) {
	let notification: Notification = match serde_json::from_slice(payload) {
		Ok(n) => n,
		Err(e) => {
			warn!(error = %e, "ignoring undecodable notification");
			return;
		}
	};

	match notification.command {
		NotificationCommand::PolicyChanged | NotificationCommand::SecretChanged => {
			queue.lock().push(ReloadRequest { callback: None });
			debug!(command = ?notification.command, "reload queued");
		}
		NotificationCommand::NoOp => {}
	}
}

/// Swaps out the pending queue. Returns `None` when there is nothing to do.
fn should_reload(queue: &Mutex<Vec<ReloadRequest>>) -> Option<Vec<ReloadRequest>> {
	let mut queue = queue.lock();
	if queue.is_empty() {
		return None;
	}
	Some(std::mem::take(&mut *queue))
}

async fn tick_loop(
	cache: Arc<Cache>,
	queue: Arc<Mutex<Vec<ReloadRequest>>>,
	tick_interval: Duration,
	mut shutdown: broadcast::Receiver<()>,
) {
	// The warm-up reload already ran; start checking one interval from now.
	let start = tokio::time::Instant::now() + tick_interval;
	let mut ticker = tokio::time::interval_at(start, tick_interval);

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				let Some(drained) = should_reload(&queue) else {
					continue;
				};

				let started = Instant::now();
				if let Err(e) = cache.reload().await {
					error!(error = %e, "cache reload failed");
				}

				for request in drained {
					if let Some(callback) = request.callback {
						callback();
					}
				}

				info!(elapsed = ?started.elapsed(), "reload cycle completed");
			}
			_ = shutdown.recv() => return,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::FakeSource;
	use warden_storage::MemoryStore;

	fn notification(command: NotificationCommand) -> Vec<u8> {
		serde_json::to_vec(&Notification::new(command)).unwrap()
	}

	async fn started_loader(source: Arc<FakeSource>) -> (Loader, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::new());
		let cache = Arc::new(Cache::new(source as _));
		let loader = Loader::new(cache, Arc::clone(&store) as _)
			.with_tick_interval(Duration::from_millis(50));
		loader.start().await;
		// Give the subscriber a beat to attach before tests publish.
		tokio::time::sleep(Duration::from_millis(20)).await;
		(loader, store)
	}

	#[tokio::test]
	async fn burst_of_notifications_coalesces_into_one_reload() {
		let source = Arc::new(FakeSource::new());
		let (loader, store) = started_loader(Arc::clone(&source)).await;

		for _ in 0..50 {
			store
				.publish(
					NOTIFICATIONS_CHANNEL,
					&notification(NotificationCommand::PolicyChanged),
				)
				.await
				.unwrap();
		}

		tokio::time::sleep(Duration::from_millis(200)).await;
		loader.stop().await;

		assert_eq!(source.policy_list_calls(), 1);
		assert_eq!(source.secret_list_calls(), 1);
	}

	#[tokio::test]
	async fn noop_notifications_do_not_reload() {
		let source = Arc::new(FakeSource::new());
		let (loader, store) = started_loader(Arc::clone(&source)).await;

		store
			.publish(
				NOTIFICATIONS_CHANNEL,
				&notification(NotificationCommand::NoOp),
			)
			.await
			.unwrap();

		tokio::time::sleep(Duration::from_millis(150)).await;
		loader.stop().await;

		assert_eq!(source.policy_list_calls(), 0);
	}

	#[tokio::test]
	async fn undecodable_notifications_are_ignored() {
		let source = Arc::new(FakeSource::new());
		let (loader, store) = started_loader(Arc::clone(&source)).await;

		store
			.publish(NOTIFICATIONS_CHANNEL, b"not json at all")
			.await
			.unwrap();

		tokio::time::sleep(Duration::from_millis(150)).await;
		loader.stop().await;

		assert_eq!(source.policy_list_calls(), 0);
	}

	#[tokio::test]
	async fn queued_callbacks_run_after_the_reload() {
		let source = Arc::new(FakeSource::new());
		let (loader, _store) = started_loader(Arc::clone(&source)).await;

		let (tx, rx) = tokio::sync::oneshot::channel();
		loader.enqueue_reload(Some(Box::new(move || {
			let _ = tx.send(());
		})));

		tokio::time::timeout(Duration::from_secs(1), rx)
			.await
			.expect("callback should fire within a tick")
			.unwrap();
		loader.stop().await;

		assert_eq!(source.policy_list_calls(), 1);
	}

	#[tokio::test]
	async fn warm_reload_propagates_upstream_errors() {
		let source = Arc::new(FakeSource::new());
		source.fail_next();

		let store = Arc::new(MemoryStore::new());
		let cache = Arc::new(Cache::new(Arc::clone(&source) as _));
		let loader = Loader::new(cache, store as _);

		assert!(loader.warm().await.is_err());
	}

	#[tokio::test]
	async fn separate_bursts_trigger_separate_reloads() {
		let source = Arc::new(FakeSource::new());
		let (loader, store) = started_loader(Arc::clone(&source)).await;

		store
			.publish(
				NOTIFICATIONS_CHANNEL,
				&notification(NotificationCommand::SecretChanged),
			)
			.await
			.unwrap();
		tokio::time::sleep(Duration::from_millis(150)).await;

		store
			.publish(
				NOTIFICATIONS_CHANNEL,
				&notification(NotificationCommand::SecretChanged),
			)
			.await
			.unwrap();
		tokio::time::sleep(Duration::from_millis(150)).await;

		loader.stop().await;
		assert_eq!(source.secret_list_calls(), 2);
	}
}
