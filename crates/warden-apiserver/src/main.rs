// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden control-plane server binary.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_apiserver::{create_app_state, create_router, SnapshotService};
use warden_storage::RedisStore;

/// Warden API server - users, secrets and policies.
#[derive(Parser, Debug)]
#[command(name = "warden-apiserver", about = "Warden control-plane server", version)]
struct Args {
	/// Path to the config file (defaults to WARDEN_CONFIG or
	/// /etc/warden/config.toml).
	#[arg(long)]
	config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => warden_config::load_config_with_file(path)?,
		None => warden_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		addr = %config.http.socket_addr(),
		rpc_addr = %config.rpc.addr,
		database = %config.database.url,
		"starting warden-apiserver"
	);

	let pool = warden_apiserver::db::create_pool(&config.database.url).await?;
	warden_apiserver::db::run_migrations(&pool).await?;

	let shared = Arc::new(RedisStore::connect(&config.redis).await?);
	let state = create_app_state(pool, shared);

	// Snapshot RPC for the data plane, on its own listener.
	let snapshot_service = SnapshotService::new(state.secrets.clone(), state.policies.clone());
	let rpc_config = config.rpc.clone();
	let rpc_handle = tokio::spawn(async move {
		if let Err(e) = warden_apiserver::snapshot::serve(snapshot_service, &rpc_config, async {
			let _ = tokio::signal::ctrl_c().await;
		})
		.await
		{
			tracing::error!(error = %e, "snapshot RPC server failed");
		}
	});

	let router = create_router(state);
	let listener = tokio::net::TcpListener::bind(config.http.socket_addr()).await?;
	axum::serve(listener, router)
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			tracing::info!("shutdown signal received");
		})
		.await?;

	let _ = rpc_handle.await;
	Ok(())
}
