// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink that emits records to the process log.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;
use warden_analytics::AuditRecord;

use crate::sink::{Sink, SinkError};

pub struct TracingSink;

pub fn construct(_meta: &HashMap<String, String>) -> Result<Box<dyn Sink>, SinkError> {
	Ok(Box::new(TracingSink))
}

#[async_trait]
impl Sink for TracingSink {
	fn name(&self) -> &'static str {
		"tracing"
	}

	async fn write_data(&self, records: &[AuditRecord]) -> Result<(), SinkError> {
		for record in records {
			info!(
				target: "warden::audit",
				username = %record.username,
				effect = %record.effect,
				conclusion = %record.conclusion,
				timestamp = record.timestamp,
				"audit record"
			);
		}
		Ok(())
	}
}
