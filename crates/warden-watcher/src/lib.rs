// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cron-style maintenance jobs.
//!
//! Each [`Watcher`] is an interval job guarded by its own long-TTL
//! distributed lease, so horizontally scaled watcher deployments run every
//! job at most once per schedule cluster-wide. Ticks that fall behind are
//! skipped, never queued; a failed lease acquisition is a no-op.

pub mod jobs;
pub mod runner;

pub use runner::{register_default_watchers, WatcherRegistry, WatcherRunner};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
	#[error("watcher configuration unavailable")]
	ConfigUnavailable,

	#[error("watcher run failed: {0}")]
	Failed(String),
}

/// A named maintenance job.
#[async_trait]
pub trait Watcher: Send + Sync {
	fn name(&self) -> &'static str;

	/// Interval between runs.
	fn schedule(&self) -> Duration;

	async fn run(&self) -> Result<(), WatcherError>;
}
