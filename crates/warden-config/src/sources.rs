// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: TOML file and `WARDEN_*` environment variables.

use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::*;

/// Default system config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/warden/config.toml";

/// Loads a layer from a TOML file. A missing file yields an empty layer so
/// deployments can run on defaults plus environment.
pub fn toml_layer(path: impl AsRef<Path>) -> Result<ServerConfigLayer, ConfigError> {
	let path = path.as_ref();
	let raw = match std::fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			return Ok(ServerConfigLayer::default());
		}
		Err(e) => {
			return Err(ConfigError::Read {
				path: path.display().to_string(),
				source: e,
			});
		}
	};

	toml::from_str(&raw).map_err(|e| ConfigError::Parse {
		path: path.display().to_string(),
		source: e,
	})
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
	env_var(name).and_then(|v| v.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Builds a layer from `WARDEN_*` environment variables.
///
/// Only scalar settings are addressable through the environment; structured
/// settings (pump sinks) come from the config file.
pub fn env_layer() -> ServerConfigLayer {
	ServerConfigLayer {
		http: HttpConfigLayer {
			host: env_var("WARDEN_HTTP_HOST"),
			port: env_parsed("WARDEN_HTTP_PORT"),
			health_addr: env_var("WARDEN_HTTP_HEALTH_ADDR"),
		},
		redis: RedisConfigLayer {
			url: env_var("WARDEN_REDIS_URL"),
			key_prefix: env_var("WARDEN_REDIS_KEY_PREFIX"),
		},
		database: DatabaseConfigLayer {
			url: env_var("WARDEN_DATABASE_URL"),
		},
		logging: LoggingConfigLayer {
			level: env_var("WARDEN_LOG_LEVEL"),
		},
		rpc: RpcConfigLayer {
			addr: env_var("WARDEN_RPC_ADDR"),
			cert: env_var("WARDEN_RPC_CERT"),
			key: env_var("WARDEN_RPC_KEY"),
			client_ca: env_var("WARDEN_RPC_CLIENT_CA"),
		},
		upstream: UpstreamConfigLayer {
			endpoint: env_var("WARDEN_UPSTREAM_ENDPOINT"),
			ca: env_var("WARDEN_UPSTREAM_CA"),
			cert: env_var("WARDEN_UPSTREAM_CERT"),
			key: env_var("WARDEN_UPSTREAM_KEY"),
			tls_domain: env_var("WARDEN_UPSTREAM_TLS_DOMAIN"),
		},
		analytics: AnalyticsConfigLayer {
			enabled: env_bool("WARDEN_ANALYTICS_ENABLED"),
			pool_size: env_parsed("WARDEN_ANALYTICS_POOL_SIZE"),
			records_buffer_size: env_parsed("WARDEN_ANALYTICS_RECORDS_BUFFER_SIZE"),
			flush_interval_ms: env_parsed("WARDEN_ANALYTICS_FLUSH_INTERVAL_MS"),
		},
		pump: PumpConfigLayer {
			purge_delay_secs: env_parsed("WARDEN_PUMP_PURGE_DELAY_SECS"),
			omit_detailed_recording: env_bool("WARDEN_PUMP_OMIT_DETAILED_RECORDING"),
			health_addr: env_var("WARDEN_PUMP_HEALTH_ADDR"),
			sinks: None,
		},
		watcher: WatcherConfigLayer {
			clean: env_parsed("WARDEN_CLEAN_MAX_RESERVE_DAYS")
				.map(|days| CleanConfigLayer {
					max_reserve_days: Some(days),
				}),
		},
	}
}
