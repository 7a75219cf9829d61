// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden control plane.
//!
//! The API server owns the source of truth: users, secrets and policies in
//! SQL. It exposes:
//!
//! - a REST API for management (Basic or Bearer auth, auto-detected)
//! - the snapshot RPC the authorization servers reload from
//! - the invalidation publish hook that tells the data plane a reload is
//!   due

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod snapshot;
pub mod store;

pub use api::{create_app_state, create_router, AppState};
pub use error::ApiError;
pub use snapshot::SnapshotService;
