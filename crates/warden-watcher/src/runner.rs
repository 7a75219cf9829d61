// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job registry and the leased interval runner.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};
use warden_apiserver::store::PolicyAuditStore;
use warden_config::WatcherConfig;
use warden_storage::SharedStore;

use crate::jobs::clean::CleanWatcher;
use crate::Watcher;

/// Lease lifetime per job run. Long enough for any maintenance task, short
/// enough that a crashed holder frees the job within hours.
const JOB_LEASE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Plain map from job name to instance, populated explicitly at startup.
#[derive(Default)]
pub struct WatcherRegistry {
	watchers: HashMap<&'static str, Arc<dyn Watcher>>,
}

impl WatcherRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, watcher: Arc<dyn Watcher>) {
		self.watchers.insert(watcher.name(), watcher);
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.watchers.keys().copied().collect()
	}

	fn into_watchers(self) -> Vec<Arc<dyn Watcher>> {
		self.watchers.into_values().collect()
	}
}

/// Registers the jobs shipped with the watcher service.
pub fn register_default_watchers(
	registry: &mut WatcherRegistry,
	policy_audits: PolicyAuditStore,
	config: &WatcherConfig,
) {
	registry.register(Arc::new(CleanWatcher::new(
		policy_audits,
		config.clean.max_reserve_days,
	)));
}

pub struct WatcherRunner {
	store: Arc<dyn SharedStore>,
	watchers: Vec<Arc<dyn Watcher>>,
	shutdown_tx: broadcast::Sender<()>,
	handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl WatcherRunner {
	pub fn new(registry: WatcherRegistry, store: Arc<dyn SharedStore>) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			store,
			watchers: registry.into_watchers(),
			shutdown_tx,
			handles: tokio::sync::Mutex::new(Vec::new()),
		}
	}

	/// Spawns one interval loop per job.
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for watcher in &self.watchers {
			let watcher = Arc::clone(watcher);
			let store = Arc::clone(&self.store);
			let mut shutdown = self.shutdown_tx.subscribe();

			handles.push(tokio::spawn(async move {
				let period = watcher.schedule();
				let start = tokio::time::Instant::now() + period;
				let mut ticker = tokio::time::interval_at(start, period);
				// A run that overlaps its next tick skips it, never queues.
				ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

				loop {
					tokio::select! {
						_ = ticker.tick() => run_leased(&*watcher, &*store).await,
						_ = shutdown.recv() => {
							info!(job = watcher.name(), "stopping watcher job");
							return;
						}
					}
				}
			}));
		}

		info!(job_count = handles.len(), "watcher runner started");
	}

	pub async fn stop(&self) {
		let _ = self.shutdown_tx.send(());
		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}
	}

	/// Runs every job once, for manual triggering.
	pub async fn run_all_once(&self) {
		for watcher in &self.watchers {
			run_leased(&**watcher, &*self.store).await;
		}
	}
}

async fn run_leased(watcher: &dyn Watcher, store: &dyn SharedStore) {
	let lease = match store.acquire_lease(watcher.name(), JOB_LEASE_TTL).await {
		Ok(Some(lease)) => lease,
		Ok(None) => {
			info!(job = watcher.name(), "job already running elsewhere");
			return;
		}
		Err(e) => {
			error!(job = watcher.name(), error = %e, "failed to acquire job lease");
			return;
		}
	};

	if let Err(e) = watcher.run().await {
		error!(job = watcher.name(), error = %e, "watcher job failed");
	}

	if let Err(e) = store.release_lease(&lease).await {
		error!(job = watcher.name(), error = %e, "could not release job lease");
	}
}
