// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control-plane to data-plane synchronization.
//!
//! The authorization servers never read the control-plane database. They
//! serve from an in-memory [`Cache`] of secrets and policies, reloaded
//! wholesale from the control plane's snapshot RPC and kept fresh by the
//! [`Loader`], which subscribes to the cluster invalidation channel and
//! coalesces notification bursts into at most one reload per second.
//!
//! Mutation visibility is eventually consistent: publish latency plus at
//! most one loader tick plus the reload itself, typically under two
//! seconds end-to-end.

pub mod cache;
pub mod error;
pub mod loader;
pub mod testutil;
pub mod upstream;

pub use cache::Cache;
pub use error::SyncError;
pub use loader::{Loader, ReloadCallback, DEFAULT_TICK_INTERVAL};
pub use upstream::{ControlPlaneClient, SnapshotSource};
