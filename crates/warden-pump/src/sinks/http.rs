// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink shipping record batches to an HTTP collector.
//!
//! Batches are POSTed as a JSON array. Slow collectors are handled by the
//! pump's per-sink timeout, not here.

use std::collections::HashMap;

use async_trait::async_trait;
use warden_analytics::AuditRecord;

use crate::sink::{Sink, SinkError};

pub struct HttpSink {
	endpoint: String,
	authorization: Option<String>,
	client: reqwest::Client,
}

pub fn construct(meta: &HashMap<String, String>) -> Result<Box<dyn Sink>, SinkError> {
	let endpoint = meta
		.get("endpoint")
		.ok_or_else(|| SinkError::Init("http sink requires meta.endpoint".to_string()))?;

	Ok(Box::new(HttpSink {
		endpoint: endpoint.clone(),
		authorization: meta.get("authorization").cloned(),
		client: reqwest::Client::new(),
	}))
}

#[async_trait]
impl Sink for HttpSink {
	fn name(&self) -> &'static str {
		"http"
	}

	async fn write_data(&self, records: &[AuditRecord]) -> Result<(), SinkError> {
		let mut request = self.client.post(&self.endpoint).json(records);
		if let Some(authorization) = &self.authorization {
			request = request.header(reqwest::header::AUTHORIZATION, authorization);
		}

		let response = request
			.send()
			.await
			.map_err(|e| SinkError::Write(format!("POST {} failed: {e}", self.endpoint)))?;

		if !response.status().is_success() {
			return Err(SinkError::Write(format!(
				"collector returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_endpoint_fails_construction() {
		assert!(construct(&HashMap::new()).is_err());
	}

	#[test]
	fn endpoint_and_authorization_come_from_meta() {
		let mut meta = HashMap::new();
		meta.insert("endpoint".to_string(), "http://collector:9000/audit".to_string());
		meta.insert("authorization".to_string(), "Bearer tok".to_string());

		let sink = construct(&meta).unwrap();
		assert_eq!(sink.name(), "http");
	}
}
