// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration for the Warden services.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file,
//!   environment)
//! - Type-safe sections with validation at finalization
//! - Consistent environment variable naming (`WARDEN_*`)
//!
//! All four binaries (`warden-apiserver`, `warden-authz-server`,
//! `warden-pump`, `warden-watcher`) share one schema; each reads the
//! sections it cares about.
//!
//! # Usage
//!
//! ```ignore
//! let config = warden_config::load_config()?;
//! println!("authz listening on {}", config.http.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{env_layer, toml_layer, SYSTEM_CONFIG_PATH};

use tracing::debug;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub redis: RedisConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub rpc: RpcConfig,
	pub upstream: UpstreamConfig,
	pub analytics: AnalyticsConfig,
	pub pump: PumpConfig,
	pub watcher: WatcherConfig,
}

fn finalize(layer: ServerConfigLayer) -> ServerConfig {
	ServerConfig {
		http: layer.http.finalize(),
		redis: layer.redis.finalize(),
		database: layer.database.finalize(),
		logging: layer.logging.finalize(),
		rpc: layer.rpc.finalize(),
		upstream: layer.upstream.finalize(),
		analytics: layer.analytics.finalize(),
		pump: layer.pump.finalize(),
		watcher: layer.watcher.finalize(),
	}
}

/// Loads configuration with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_*`)
/// 2. Config file (`WARDEN_CONFIG` path, else `/etc/warden/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let path = std::env::var("WARDEN_CONFIG").unwrap_or_else(|_| SYSTEM_CONFIG_PATH.to_string());
	load_config_with_file(path)
}

/// Loads configuration with a caller-supplied config file path.
pub fn load_config_with_file(
	path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	let path = path.into();
	debug!(path = %path.display(), "loading configuration");

	let mut merged = ServerConfigLayer::default();
	merged.merge(toml_layer(&path)?);
	merged.merge(env_layer());

	Ok(finalize(merged))
}

/// Loads configuration from the environment only (tests, simple deployments).
pub fn load_config_from_env() -> ServerConfig {
	let mut merged = ServerConfigLayer::default();
	merged.merge(env_layer());
	finalize(merged)
}
