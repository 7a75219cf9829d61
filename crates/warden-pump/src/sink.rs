// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The sink capability and its per-instance configuration wrapper.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use warden_analytics::AuditRecord;
use warden_config::SinkConfig;

use crate::filter::RecordFilter;

#[derive(Error, Debug)]
pub enum SinkError {
	#[error("unknown sink type: {0}")]
	UnknownType(String),

	#[error("sink initialization failed: {0}")]
	Init(String),

	#[error("sink write failed: {0}")]
	Write(String),
}

/// A downstream destination for audit records.
///
/// Implementations should write batches, not single records; the pump
/// hands over everything a drain produced in one call.
#[async_trait]
pub trait Sink: Send + Sync {
	fn name(&self) -> &'static str;

	async fn write_data(&self, records: &[AuditRecord]) -> Result<(), SinkError>;
}

/// A sink plus its declared filters, timeout and redaction flag. Built
/// once at startup from a [`SinkConfig`] and reused across drain ticks.
pub struct ConfiguredSink {
	sink: Box<dyn Sink>,
	filter: RecordFilter,
	timeout: Option<Duration>,
	omit_details: bool,
}

impl std::fmt::Debug for ConfiguredSink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfiguredSink")
			.field("sink", &self.sink.name())
			.field("filter", &self.filter)
			.field("timeout", &self.timeout)
			.field("omit_details", &self.omit_details)
			.finish()
	}
}

impl ConfiguredSink {
	pub fn new(sink: Box<dyn Sink>, config: &SinkConfig) -> Self {
		Self {
			sink,
			filter: RecordFilter::new(config.filters.clone()),
			timeout: (config.timeout_secs > 0)
				.then(|| Duration::from_secs(config.timeout_secs)),
			omit_details: config.omit_detailed_recording,
		}
	}

	pub fn name(&self) -> &'static str {
		self.sink.name()
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Applies this sink's filter and redaction to a drained batch. The
	/// batch is shared between sinks, so redaction works on a copy.
	pub fn prepare(&self, records: &[AuditRecord]) -> Vec<AuditRecord> {
		if !self.filter.has_filter() && !self.omit_details {
			return records.to_vec();
		}

		records
			.iter()
			.filter(|r| !self.filter.should_filter(r))
			.map(|r| {
				let mut record = r.clone();
				if self.omit_details {
					record.policies.clear();
					record.deciders.clear();
				}
				record
			})
			.collect()
	}

	pub async fn write_data(&self, records: &[AuditRecord]) -> Result<(), SinkError> {
		self.sink.write_data(records).await
	}
}
