// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors raised by the control-plane sync machinery.
#[derive(Error, Debug)]
pub enum SyncError {
	#[error("secret not found")]
	SecretNotFound,

	#[error("policy not found")]
	PolicyNotFound,

	#[error("upstream call failed: {0}")]
	Upstream(#[from] tonic::Status),

	#[error("upstream transport error: {0}")]
	Transport(#[from] tonic::transport::Error),

	#[error("failed to read TLS material: {0}")]
	Tls(#[from] std::io::Error),
}
