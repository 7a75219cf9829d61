// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections, one module per concern.

pub mod analytics;
pub mod database;
pub mod http;
pub mod logging;
pub mod pump;
pub mod redis;
pub mod rpc;
pub mod watcher;

pub use analytics::{AnalyticsConfig, AnalyticsConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use pump::{PumpConfig, PumpConfigLayer, SinkConfig, SinkFilterConfig};
pub use redis::{RedisConfig, RedisConfigLayer};
pub use rpc::{RpcConfig, RpcConfigLayer, UpstreamConfig, UpstreamConfigLayer};
pub use watcher::{CleanConfig, CleanConfigLayer, WatcherConfig, WatcherConfigLayer};
