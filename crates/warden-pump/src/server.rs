// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The leased drain loop.
//!
//! One task ticks every `purge_delay_secs`. A tick that wins the
//! cluster-wide lease drains the audit queue atomically, decodes the
//! batch, applies global redaction, and fans the records out to every
//! configured sink concurrently. Sink writes are best-effort: failures and
//! timeouts are logged, never re-enqueued, because the queue has already
//! been drained. The lease is released once all writers finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};
use warden_analytics::{AuditRecord, ANALYTICS_QUEUE_KEY};
use warden_config::PumpConfig;
use warden_storage::SharedStore;

use crate::registry::SinkRegistry;
use crate::sink::ConfiguredSink;

/// Lease name mutually excluding pump replicas.
pub const PUMP_LEASE_NAME: &str = "warden-pump";

/// Lease lifetime; generously above any expected drain duration so a
/// crashed holder expires rather than wedging the queue forever.
const LEASE_TTL: Duration = Duration::from_secs(600);

pub struct PumpServer {
	store: Arc<dyn SharedStore>,
	sinks: Vec<Arc<ConfiguredSink>>,
	purge_delay: Duration,
	omit_details: bool,
}

impl PumpServer {
	/// Builds the server from configuration. Unknown sink types and sinks
	/// that fail to initialize are logged and skipped; the rest run.
	pub fn new(config: &PumpConfig, registry: &SinkRegistry, store: Arc<dyn SharedStore>) -> Self {
		let mut sinks = Vec::new();
		for sink_config in &config.sinks {
			match registry.build(sink_config) {
				Ok(sink) => {
					info!(sink = sink.name(), "initialized sink");
					sinks.push(Arc::new(sink));
				}
				Err(e) => error!(kind = %sink_config.kind, error = %e, "sink load error (skipping)"),
			}
		}

		if sinks.is_empty() {
			warn!("no sinks configured");
		}

		Self {
			store,
			sinks,
			purge_delay: Duration::from_secs(config.purge_delay_secs),
			omit_details: config.omit_detailed_recording,
		}
	}

	/// Runs the drain loop until shutdown. The tick in progress finishes
	/// before the loop exits.
	pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
		let start = tokio::time::Instant::now() + self.purge_delay;
		let mut ticker = tokio::time::interval_at(start, self.purge_delay);

		info!(purge_delay = ?self.purge_delay, "pump loop started");
		loop {
			tokio::select! {
				_ = ticker.tick() => self.pump().await,
				_ = shutdown.recv() => {
					info!("stopping purge loop");
					return;
				}
			}
		}
	}

	/// One drain tick.
	#[instrument(level = "debug", skip(self))]
	pub async fn pump(&self) {
		let lease = match self.store.acquire_lease(PUMP_LEASE_NAME, LEASE_TTL).await {
			Ok(Some(lease)) => lease,
			Ok(None) => {
				debug!("another pump replica holds the lease, skipping tick");
				return;
			}
			Err(e) => {
				error!(error = %e, "failed to acquire pump lease");
				return;
			}
		};

		let values = match self.store.get_and_delete_set(ANALYTICS_QUEUE_KEY).await {
			Ok(values) => values,
			Err(e) => {
				error!(error = %e, "failed to drain audit queue");
				self.release(&lease).await;
				return;
			}
		};

		if !values.is_empty() {
			let records = self.decode(values);
			self.write_to_sinks(records).await;
		}

		self.release(&lease).await;
	}

	fn decode(&self, values: Vec<Vec<u8>>) -> Vec<AuditRecord> {
		let mut records = Vec::with_capacity(values.len());
		for value in values {
			match AuditRecord::decode(&value) {
				Ok(mut record) => {
					if self.omit_details {
						record.policies.clear();
						record.deciders.clear();
					}
					records.push(record);
				}
				Err(e) => warn!(error = %e, "could not decode audit record, skipping"),
			}
		}
		records
	}

	async fn write_to_sinks(&self, records: Vec<AuditRecord>) {
		let records = Arc::new(records);
		let mut writers = JoinSet::new();

		for sink in &self.sinks {
			let sink = Arc::clone(sink);
			let records = Arc::clone(&records);
			writers.spawn(async move { write_one(sink, records).await });
		}

		while writers.join_next().await.is_some() {}
	}

	async fn release(&self, lease: &warden_storage::Lease) {
		if let Err(e) = self.store.release_lease(lease).await {
			error!(error = %e, "could not release pump lease");
		}
	}
}

async fn write_one(sink: Arc<ConfiguredSink>, records: Arc<Vec<AuditRecord>>) {
	let prepared = sink.prepare(&records);
	if prepared.is_empty() {
		return;
	}

	debug!(sink = sink.name(), count = prepared.len(), "writing to sink");

	match sink.timeout() {
		Some(timeout) => match tokio::time::timeout(timeout, sink.write_data(&prepared)).await {
			Ok(Ok(())) => debug!(sink = sink.name(), "sink write complete"),
			Ok(Err(e)) => warn!(sink = sink.name(), error = %e, "error writing to sink"),
			Err(_) => warn!(sink = sink.name(), "timeout writing to sink"),
		},
		None => {
			if let Err(e) = sink.write_data(&prepared).await {
				warn!(sink = sink.name(), error = %e, "error writing to sink");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use chrono::Utc;
	use std::collections::HashMap;
	use std::sync::Mutex;
	use warden_config::{SinkConfig, SinkFilterConfig};
	use warden_storage::MemoryStore;

	use crate::registry::register_default_sinks;
	use crate::sink::{Sink, SinkError};

	struct CapturingSink {
		written: Arc<Mutex<Vec<AuditRecord>>>,
	}

	#[async_trait]
	impl Sink for CapturingSink {
		fn name(&self) -> &'static str {
			"capturing"
		}

		async fn write_data(&self, records: &[AuditRecord]) -> Result<(), SinkError> {
			self.written.lock().unwrap().extend(records.iter().cloned());
			Ok(())
		}
	}

	struct StuckSink;

	#[async_trait]
	impl Sink for StuckSink {
		fn name(&self) -> &'static str {
			"stuck"
		}

		async fn write_data(&self, _records: &[AuditRecord]) -> Result<(), SinkError> {
			tokio::time::sleep(Duration::from_secs(3600)).await;
			Ok(())
		}
	}

	fn record(username: &str) -> AuditRecord {
		AuditRecord {
			timestamp: Utc::now().timestamp(),
			username: username.to_string(),
			effect: "allow".to_string(),
			conclusion: String::new(),
			request: String::new(),
			policies: r#"["p1"]"#.to_string(),
			deciders: r#"["p1"]"#.to_string(),
			expire_at: Utc::now(),
		}
	}

	fn sink_config() -> SinkConfig {
		SinkConfig {
			kind: "capturing".to_string(),
			meta: HashMap::new(),
			filters: SinkFilterConfig::default(),
			timeout_secs: 0,
			omit_detailed_recording: false,
		}
	}

	async fn seed_queue(store: &MemoryStore, records: &[AuditRecord]) {
		let encoded = records.iter().map(|r| r.encode().unwrap()).collect();
		store
			.append_to_list(ANALYTICS_QUEUE_KEY, encoded)
			.await
			.unwrap();
	}

	fn server_with_sinks(
		store: Arc<MemoryStore>,
		sinks: Vec<(Box<dyn Sink>, SinkConfig)>,
		omit_details: bool,
	) -> PumpServer {
		PumpServer {
			store,
			sinks: sinks
				.into_iter()
				.map(|(sink, config)| Arc::new(ConfiguredSink::new(sink, &config)))
				.collect(),
			purge_delay: Duration::from_secs(1),
			omit_details,
		}
	}

	#[tokio::test]
	async fn drained_records_reach_the_sink() {
		let store = Arc::new(MemoryStore::new());
		seed_queue(&store, &[record("alice"), record("bob")]).await;

		let written = Arc::new(Mutex::new(Vec::new()));
		let server = server_with_sinks(
			Arc::clone(&store),
			vec![(
				Box::new(CapturingSink {
					written: Arc::clone(&written),
				}),
				sink_config(),
			)],
			false,
		);

		server.pump().await;

		let written = written.lock().unwrap();
		assert_eq!(written.len(), 2);
		assert_eq!(store.list_len(ANALYTICS_QUEUE_KEY), 0);
	}

	#[tokio::test]
	async fn empty_queue_releases_the_lease() {
		let store = Arc::new(MemoryStore::new());
		let server = server_with_sinks(Arc::clone(&store), vec![], false);

		server.pump().await;

		// The lease must be free again after the tick.
		let lease = store
			.acquire_lease(PUMP_LEASE_NAME, Duration::from_secs(1))
			.await
			.unwrap();
		assert!(lease.is_some());
	}

	#[tokio::test]
	async fn held_lease_skips_the_tick() {
		let store = Arc::new(MemoryStore::new());
		seed_queue(&store, &[record("alice")]).await;

		let other_replica = store
			.acquire_lease(PUMP_LEASE_NAME, Duration::from_secs(60))
			.await
			.unwrap()
			.unwrap();

		let written = Arc::new(Mutex::new(Vec::new()));
		let server = server_with_sinks(
			Arc::clone(&store),
			vec![(
				Box::new(CapturingSink {
					written: Arc::clone(&written),
				}),
				sink_config(),
			)],
			false,
		);

		server.pump().await;

		// Nothing was drained; the other replica owns this batch window.
		assert!(written.lock().unwrap().is_empty());
		assert_eq!(store.list_len(ANALYTICS_QUEUE_KEY), 1);

		store.release_lease(&other_replica).await.unwrap();
	}

	#[tokio::test]
	async fn global_redaction_clears_details_for_every_sink() {
		let store = Arc::new(MemoryStore::new());
		seed_queue(&store, &[record("alice")]).await;

		let written = Arc::new(Mutex::new(Vec::new()));
		let server = server_with_sinks(
			Arc::clone(&store),
			vec![(
				Box::new(CapturingSink {
					written: Arc::clone(&written),
				}),
				sink_config(),
			)],
			true,
		);

		server.pump().await;

		let written = written.lock().unwrap();
		assert!(written[0].policies.is_empty());
		assert!(written[0].deciders.is_empty());
	}

	#[tokio::test]
	async fn undecodable_entries_are_skipped() {
		let store = Arc::new(MemoryStore::new());
		store
			.append_to_list(
				ANALYTICS_QUEUE_KEY,
				vec![b"garbage".to_vec(), record("alice").encode().unwrap()],
			)
			.await
			.unwrap();

		let written = Arc::new(Mutex::new(Vec::new()));
		let server = server_with_sinks(
			Arc::clone(&store),
			vec![(
				Box::new(CapturingSink {
					written: Arc::clone(&written),
				}),
				sink_config(),
			)],
			false,
		);

		server.pump().await;

		let written = written.lock().unwrap();
		assert_eq!(written.len(), 1);
		assert_eq!(written[0].username, "alice");
	}

	#[tokio::test]
	async fn stuck_sink_times_out_without_blocking_others() {
		let store = Arc::new(MemoryStore::new());
		seed_queue(&store, &[record("alice")]).await;

		let mut stuck_config = sink_config();
		stuck_config.kind = "stuck".to_string();
		stuck_config.timeout_secs = 1;

		let written = Arc::new(Mutex::new(Vec::new()));
		let server = server_with_sinks(
			Arc::clone(&store),
			vec![
				(Box::new(StuckSink), stuck_config),
				(
					Box::new(CapturingSink {
						written: Arc::clone(&written),
					}),
					sink_config(),
				),
			],
			false,
		);

		let started = std::time::Instant::now();
		server.pump().await;

		assert!(started.elapsed() < Duration::from_secs(10));
		assert_eq!(written.lock().unwrap().len(), 1);

		// Lease is free again despite the stuck sink.
		assert!(store
			.acquire_lease(PUMP_LEASE_NAME, Duration::from_secs(1))
			.await
			.unwrap()
			.is_some());
	}

	#[tokio::test]
	async fn per_sink_filters_apply_independently() {
		let store = Arc::new(MemoryStore::new());
		seed_queue(&store, &[record("alice"), record("bob")]).await;

		let mut filtered_config = sink_config();
		filtered_config.filters.usernames = vec!["alice".to_string()];

		let all = Arc::new(Mutex::new(Vec::new()));
		let only_alice = Arc::new(Mutex::new(Vec::new()));
		let server = server_with_sinks(
			Arc::clone(&store),
			vec![
				(
					Box::new(CapturingSink {
						written: Arc::clone(&all),
					}),
					sink_config(),
				),
				(
					Box::new(CapturingSink {
						written: Arc::clone(&only_alice),
					}),
					filtered_config,
				),
			],
			false,
		);

		server.pump().await;

		assert_eq!(all.lock().unwrap().len(), 2);
		let filtered = only_alice.lock().unwrap();
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].username, "alice");
	}

	#[tokio::test]
	async fn unknown_configured_sink_is_skipped_at_startup() {
		let mut registry = SinkRegistry::new();
		register_default_sinks(&mut registry);

		let config = PumpConfig {
			purge_delay_secs: 1,
			omit_detailed_recording: false,
			health_addr: "127.0.0.1:0".to_string(),
			sinks: vec![
				SinkConfig {
					kind: "mongo".to_string(),
					meta: HashMap::new(),
					filters: SinkFilterConfig::default(),
					timeout_secs: 0,
					omit_detailed_recording: false,
				},
				SinkConfig {
					kind: "tracing".to_string(),
					meta: HashMap::new(),
					filters: SinkFilterConfig::default(),
					timeout_secs: 0,
					omit_detailed_recording: false,
				},
			],
		};

		let server = PumpServer::new(&config, &registry, Arc::new(MemoryStore::new()));
		assert_eq!(server.sinks.len(), 1);
	}
}
