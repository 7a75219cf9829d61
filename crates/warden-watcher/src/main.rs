// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden maintenance watcher binary.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_apiserver::store::PolicyAuditStore;
use warden_storage::RedisStore;
use warden_watcher::{register_default_watchers, WatcherRegistry, WatcherRunner};

/// Warden watcher - periodic maintenance jobs under distributed leases.
#[derive(Parser, Debug)]
#[command(name = "warden-watcher", about = "Warden maintenance watcher", version)]
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
		max_reserve_days = config.watcher.clean.max_reserve_days,
		"starting warden-watcher"
	);

	let pool = warden_apiserver::db::create_pool(&config.database.url).await?;
	warden_apiserver::db::run_migrations(&pool).await?;

	let store = Arc::new(RedisStore::connect(&config.redis).await?);

	let mut registry = WatcherRegistry::new();
	register_default_watchers(&mut registry, PolicyAuditStore::new(pool), &config.watcher);

	let runner = WatcherRunner::new(registry, store);
	runner.start().await;

	let _ = tokio::signal::ctrl_c().await;
	tracing::info!("shutdown signal received");
	runner.stop().await;

	Ok(())
}
