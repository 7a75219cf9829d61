// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden audit pump binary.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_pump::{register_default_sinks, PumpServer, SinkRegistry};
use warden_storage::RedisStore;

/// Warden pump - drains authorization audit records to configured sinks.
#[derive(Parser, Debug)]
#[command(name = "warden-pump", about = "Warden audit pump", version)]
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
		purge_delay_secs = config.pump.purge_delay_secs,
		sinks = config.pump.sinks.len(),
		"starting warden-pump"
	);

	let store = Arc::new(RedisStore::connect(&config.redis).await?);

	let mut registry = SinkRegistry::new();
	register_default_sinks(&mut registry);

	let server = PumpServer::new(&config.pump, &registry, store);

	// Liveness endpoint on its own listener.
	let health_listener = tokio::net::TcpListener::bind(&config.pump.health_addr).await?;
	tokio::spawn(async move {
		let router = Router::new().route(
			"/healthz",
			get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
		);
		if let Err(e) = axum::serve(health_listener, router).await {
			tracing::error!(error = %e, "health listener failed");
		}
	});

	let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
	tokio::spawn(async move {
		let _ = tokio::signal::ctrl_c().await;
		tracing::info!("shutdown signal received");
		let _ = shutdown_tx.send(());
	});

	server.run(shutdown_rx).await;
	Ok(())
}
