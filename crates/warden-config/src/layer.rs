// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The mergeable top-level configuration layer.
//!
//! Every configuration source (defaults, TOML file, environment) produces a
//! [`ServerConfigLayer`]; layers merge left-to-right with later sources
//! winning field-by-field, and the merged layer finalizes into the resolved
//! [`ServerConfig`](crate::ServerConfig).

use serde::{Deserialize, Serialize};

use crate::sections::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: HttpConfigLayer,
	#[serde(default)]
	pub redis: RedisConfigLayer,
	#[serde(default)]
	pub database: DatabaseConfigLayer,
	#[serde(default)]
	pub logging: LoggingConfigLayer,
	#[serde(default)]
	pub rpc: RpcConfigLayer,
	#[serde(default)]
	pub upstream: UpstreamConfigLayer,
	#[serde(default)]
	pub analytics: AnalyticsConfigLayer,
	#[serde(default)]
	pub pump: PumpConfigLayer,
	#[serde(default)]
	pub watcher: WatcherConfigLayer,
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		self.http.merge(other.http);
		self.redis.merge(other.redis);
		self.database.merge(other.database);
		self.logging.merge(other.logging);
		self.rpc.merge(other.rpc);
		self.upstream.merge(other.upstream);
		self.analytics.merge(other.analytics);
		self.pump.merge(other.pump);
		self.watcher.merge(other.watcher);
	}
}
