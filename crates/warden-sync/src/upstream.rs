// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Snapshot client against the control plane.
//!
//! [`SnapshotSource`] is the seam the cache reloads through; the production
//! implementation wraps the generated gRPC client with mutual TLS. Both
//! calls return complete snapshots, keyed the way the cache stores them.

use std::collections::HashMap;

use async_trait::async_trait;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};
use tracing::{instrument, warn};
use warden_config::UpstreamConfig;
use warden_core::{Policy, Secret};
use warden_proto::v1::snapshot_client::SnapshotClient;
use warden_proto::v1::{ListPoliciesRequest, ListSecretsRequest};

use crate::error::SyncError;

#[async_trait]
pub trait SnapshotSource: Send + Sync {
	async fn list_secrets(&self) -> Result<HashMap<String, Secret>, SyncError>;
	async fn list_policies(&self) -> Result<HashMap<String, Vec<Policy>>, SyncError>;
}

/// gRPC snapshot source. Transport errors are surfaced verbatim; the
/// loader decides what to do with them.
pub struct ControlPlaneClient {
	inner: SnapshotClient<Channel>,
}

impl ControlPlaneClient {
	/// Builds the client. The connection itself is established lazily, so
	/// a down control plane surfaces on the first snapshot call (the
	/// warm-up reload) rather than here.
	pub fn connect(config: &UpstreamConfig) -> Result<Self, SyncError> {
		let mut endpoint = Endpoint::from_shared(config.endpoint.clone())?;

		if config.ca.is_some() || config.cert.is_some() {
			let mut tls = ClientTlsConfig::new();

			if let Some(ca) = &config.ca {
				tls = tls.ca_certificate(Certificate::from_pem(std::fs::read(ca)?));
			}
			if let (Some(cert), Some(key)) = (&config.cert, &config.key) {
				tls = tls.identity(Identity::from_pem(
					std::fs::read(cert)?,
					std::fs::read(key)?,
				));
			}
			if let Some(domain) = &config.tls_domain {
				tls = tls.domain_name(domain.clone());
			}

			endpoint = endpoint.tls_config(tls)?;
		}

		let channel = endpoint.connect_lazy();
		Ok(Self {
			inner: SnapshotClient::new(channel),
		})
	}
}

#[async_trait]
impl SnapshotSource for ControlPlaneClient {
	#[instrument(level = "debug", skip(self))]
	async fn list_secrets(&self) -> Result<HashMap<String, Secret>, SyncError> {
		let mut client = self.inner.clone();
		let response = client.list_secrets(ListSecretsRequest {}).await?;

		let secrets = response
			.into_inner()
			.items
			.into_iter()
			.map(|item| {
				(
					item.secret_id.clone(),
					Secret {
						secret_id: item.secret_id,
						username: item.username,
						secret_key: item.secret_key,
						expires: item.expires,
					},
				)
			})
			.collect();

		Ok(secrets)
	}

	#[instrument(level = "debug", skip(self))]
	async fn list_policies(&self) -> Result<HashMap<String, Vec<Policy>>, SyncError> {
		let mut client = self.inner.clone();
		let response = client.list_policies(ListPoliciesRequest {}).await?;

		let mut policies: HashMap<String, Vec<Policy>> = HashMap::new();
		for item in response.into_inner().items {
			match serde_json::from_str::<Policy>(&item.policy_shadow) {
				Ok(policy) => policies.entry(item.username).or_default().push(policy),
				// A malformed document must not poison the whole snapshot.
				Err(e) => warn!(
					username = %item.username,
					error = %e,
					"skipping undecodable policy document"
				),
			}
		}

		Ok(policies)
	}
}
