// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core domain types shared across the Warden services.
//!
//! This crate holds the entities that cross service boundaries:
//!
//! - [`Secret`] - a signing secret addressed by key id (`kid`)
//! - [`Policy`] - an access policy with subject/resource/action patterns,
//!   an allow/deny effect and optional condition predicates
//! - [`Notification`] - the cache-invalidation message published on the
//!   cluster notification channel

pub mod notification;
pub mod policy;
pub mod secret;

pub use notification::{Notification, NotificationCommand, NOTIFICATIONS_CHANNEL};
pub use policy::{ConditionSpec, Effect, Policy};
pub use secret::Secret;
