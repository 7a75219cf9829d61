// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden authorization server binary.
//!
//! Startup order matters: the cache is warmed synchronously before the
//! listener binds, so the first request never races an empty cache.
//! Shutdown order matters more: the HTTP listener drains first (no new
//! audit submissions), then the recorder (flush everything accepted), then
//! the loader.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_analytics::Recorder;
use warden_authn::{AuthStrategy, BearerStrategy};
use warden_authz::Authorizer;
use warden_authz_server::{create_router, health_router, AppState};
use warden_storage::RedisStore;
use warden_sync::{Cache, ControlPlaneClient, Loader};

/// Warden authorization server - policy decisions on the hot path.
#[derive(Parser, Debug)]
#[command(
	name = "warden-authz-server",
	about = "Warden authorization server",
	version
)]
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
		upstream = %config.upstream.endpoint,
		analytics = config.analytics.enabled,
		"starting warden-authz-server"
	);

	let store = Arc::new(RedisStore::connect(&config.redis).await?);
	let upstream = Arc::new(ControlPlaneClient::connect(&config.upstream)?);
	let cache = Arc::new(Cache::new(upstream));

	let loader = Loader::new(Arc::clone(&cache), Arc::clone(&store) as _);
	// Warm the cache before accepting traffic; an unreachable control
	// plane is a startup failure.
	loader.warm().await?;
	loader.start().await;

	let recorder = config
		.analytics
		.enabled
		.then(|| Arc::new(Recorder::start(&config.analytics, Arc::clone(&store) as _)));

	let mut authorizer = Authorizer::new(Arc::clone(&cache) as _);
	if let Some(recorder) = &recorder {
		authorizer = authorizer.with_recorder(Arc::clone(recorder));
	}

	let strategy: Arc<dyn AuthStrategy> = Arc::new(BearerStrategy::new(Arc::clone(&cache) as _));
	let state = AppState {
		strategy,
		authorizer: Arc::new(authorizer),
	};

	// Liveness on a separate address.
	let health_listener = tokio::net::TcpListener::bind(&config.http.health_addr).await?;
	tokio::spawn(async move {
		if let Err(e) = axum::serve(health_listener, health_router()).await {
			tracing::error!(error = %e, "health listener failed");
		}
	});

	let listener = tokio::net::TcpListener::bind(config.http.socket_addr()).await?;
	axum::serve(listener, create_router(state))
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			tracing::info!("shutdown signal received");
		})
		.await?;

	// The listener has drained: no handler can submit new records, so the
	// recorder can flush and close without racing sends.
	if let Some(recorder) = recorder {
		recorder.stop().await;
	}
	loader.stop().await;

	Ok(())
}
