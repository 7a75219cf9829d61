// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink appending records to a local file as JSON lines.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use warden_analytics::AuditRecord;

use crate::sink::{Sink, SinkError};

pub struct FileSink {
	path: String,
	file: Mutex<Option<tokio::fs::File>>,
}

pub fn construct(meta: &HashMap<String, String>) -> Result<Box<dyn Sink>, SinkError> {
	let path = meta
		.get("path")
		.ok_or_else(|| SinkError::Init("file sink requires meta.path".to_string()))?;

	Ok(Box::new(FileSink {
		path: path.clone(),
		file: Mutex::new(None),
	}))
}

impl FileSink {
	async fn write_lines(&self, lines: String) -> Result<(), SinkError> {
		let mut guard = self.file.lock().await;

		if guard.is_none() {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(&self.path)
				.await
				.map_err(|e| SinkError::Write(format!("failed to open {}: {e}", self.path)))?;
			*guard = Some(file);
		}

		let file = guard
			.as_mut()
			.ok_or_else(|| SinkError::Write("file handle not initialized".to_string()))?;
		file.write_all(lines.as_bytes())
			.await
			.map_err(|e| SinkError::Write(format!("failed to write {}: {e}", self.path)))?;
		file.flush()
			.await
			.map_err(|e| SinkError::Write(format!("failed to flush {}: {e}", self.path)))
	}
}

#[async_trait]
impl Sink for FileSink {
	fn name(&self) -> &'static str {
		"file"
	}

	async fn write_data(&self, records: &[AuditRecord]) -> Result<(), SinkError> {
		let mut lines = String::new();
		for record in records {
			let json = serde_json::to_string(record)
				.map_err(|e| SinkError::Write(format!("serialization failed: {e}")))?;
			lines.push_str(&json);
			lines.push('\n');
		}

		self.write_lines(lines).await
	}
}
