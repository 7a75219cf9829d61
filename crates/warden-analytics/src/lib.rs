// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization audit telemetry.
//!
//! The data plane records every authorization decision as an
//! [`AuditRecord`] and ships it to a shared queue through the [`Recorder`],
//! a lock-free, worker-pooled batch-and-flush pipeline. The pump service
//! drains the queue on the other side.

pub mod record;
pub mod recorder;

pub use record::AuditRecord;
pub use recorder::{Recorder, ANALYTICS_QUEUE_KEY};
