// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! gRPC protocol definitions for control-plane to data-plane sync.
//!
//! This crate contains the message and service definitions for the
//! `warden.api.v1.Snapshot` service: two unary calls that return complete
//! point-in-time snapshots of all secrets and all policies. The
//! authorization servers call these on every cache reload; the control
//! plane hosts the service next to its REST API.
//!
//! The source definition lives in `proto/warden/api/v1/snapshot.proto`. The
//! Rust code in [`v1`] is the checked-in prost/tonic output (trimmed to the
//! surface we use) so builds do not need `protoc`; regenerate and re-vendor
//! when the proto changes.
//!
//! # Example
//!
//! ```ignore
//! use warden_proto::v1::snapshot_client::SnapshotClient;
//! use warden_proto::v1::ListSecretsRequest;
//!
//! let mut client = SnapshotClient::connect("http://127.0.0.1:8071").await?;
//! let snapshot = client.list_secrets(ListSecretsRequest {}).await?.into_inner();
//! for secret in snapshot.items {
//!     println!("{} -> {}", secret.secret_id, secret.username);
//! }
//! ```

/// Version 1 of the snapshot protocol.
pub mod v1;
