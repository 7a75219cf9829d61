// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors raised by the shared key/value service.
///
/// [`StorageError::Down`] marks the transport as unreachable, which callers
/// treat differently from protocol errors: subscription loops back off and
/// reconnect, while protocol errors are surfaced.
#[derive(Error, Debug)]
pub enum StorageError {
	#[error("shared store is unreachable: {0}")]
	Down(String),

	#[error("shared store protocol error: {0}")]
	Protocol(String),
}

impl StorageError {
	/// Returns true for transport-level unavailability.
	pub fn is_down(&self) -> bool {
		matches!(self, StorageError::Down(_))
	}
}

impl From<redis::RedisError> for StorageError {
	fn from(err: redis::RedisError) -> Self {
		if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
			StorageError::Down(err.to_string())
		} else {
			StorageError::Protocol(err.to_string())
		}
	}
}
