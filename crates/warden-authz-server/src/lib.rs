// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden authorization server.
//!
//! The data-plane hot path: bearer-JWT authentication against the secret
//! cache, policy evaluation with deny-overrides, and asynchronous audit
//! recording. The cache is warmed before the listener accepts traffic and
//! kept fresh by the loader's subscription to the cluster invalidation
//! channel.

pub mod api;
pub mod error;

pub use api::{create_router, health_router, AppState};
pub use error::AuthzApiError;
