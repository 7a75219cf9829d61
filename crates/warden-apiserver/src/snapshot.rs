// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Snapshot RPC service for the data plane.
//!
//! Serves complete secret and policy snapshots over the
//! `warden.api.v1.Snapshot` service. Authorization replicas call this on
//! every cache reload; the listener runs next to the REST API on its own
//! address, mutually TLS-authenticated when certificates are configured.

use std::time::Duration;

use tonic::transport::{Certificate, Identity, ServerTlsConfig};
use tonic::{Request, Response, Status};
use tracing::{info, instrument};
use warden_config::RpcConfig;
use warden_proto::v1::snapshot_server::{Snapshot, SnapshotServer};
use warden_proto::v1::{
	ListPoliciesRequest, ListPoliciesResponse, ListSecretsRequest, ListSecretsResponse,
	PolicyInfo, SecretInfo,
};

use crate::store::{PolicyStore, SecretStore};

pub struct SnapshotService {
	secrets: SecretStore,
	policies: PolicyStore,
}

impl SnapshotService {
	pub fn new(secrets: SecretStore, policies: PolicyStore) -> Self {
		Self { secrets, policies }
	}
}

#[tonic::async_trait]
impl Snapshot for SnapshotService {
	#[instrument(level = "debug", skip_all)]
	async fn list_secrets(
		&self,
		_request: Request<ListSecretsRequest>,
	) -> Result<Response<ListSecretsResponse>, Status> {
		let records = self
			.secrets
			.list_all()
			.await
			.map_err(|e| Status::internal(format!("secret listing failed: {e}")))?;

		let items = records
			.into_iter()
			.map(|record| SecretInfo {
				secret_id: record.secret_id,
				username: record.username,
				secret_key: record.secret_key,
				expires: record.expires,
			})
			.collect();

		Ok(Response::new(ListSecretsResponse { items }))
	}

	#[instrument(level = "debug", skip_all)]
	async fn list_policies(
		&self,
		_request: Request<ListPoliciesRequest>,
	) -> Result<Response<ListPoliciesResponse>, Status> {
		let records = self
			.policies
			.list_all()
			.await
			.map_err(|e| Status::internal(format!("policy listing failed: {e}")))?;

		let items = records
			.into_iter()
			.map(|record| PolicyInfo {
				username: record.username,
				policy_shadow: record.policy_shadow,
			})
			.collect();

		Ok(Response::new(ListPoliciesResponse { items }))
	}
}

/// Serves the snapshot RPC until the shutdown future resolves.
pub async fn serve(
	service: SnapshotService,
	config: &RpcConfig,
	shutdown: impl std::future::Future<Output = ()> + Send,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let addr: std::net::SocketAddr = config.addr.parse()?;

	let mut builder = tonic::transport::Server::builder()
		.timeout(Duration::from_secs(30));

	if let (Some(cert), Some(key)) = (&config.cert, &config.key) {
		let mut tls = ServerTlsConfig::new()
			.identity(Identity::from_pem(std::fs::read(cert)?, std::fs::read(key)?));
		if let Some(ca) = &config.client_ca {
			tls = tls.client_ca_root(Certificate::from_pem(std::fs::read(ca)?));
		}
		builder = builder.tls_config(tls)?;
	}

	info!(addr = %config.addr, "snapshot RPC listening");
	builder
		.add_service(SnapshotServer::new(service))
		.serve_with_shutdown(addr, shutdown)
		.await?;

	Ok(())
}
