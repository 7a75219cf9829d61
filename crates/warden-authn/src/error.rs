// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Authentication failures.
///
/// All variants surface to the caller as HTTP 401 and are never retried.
/// [`AuthnError::code`] provides the machine-readable code rendered in the
/// error envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthnError {
	#[error("Authorization header cannot be empty")]
	MissingHeader,

	#[error("invalid Authorization header: {0}")]
	InvalidAuthHeader(String),

	#[error("invalid token format: missing kid field in header")]
	MissingKid,

	#[error("cannot obtain secret information from cache")]
	MissingSecret,

	#[error("token signature is invalid: {0}")]
	SignatureInvalid(String),

	#[error("secret expired at: {at}")]
	Expired { at: String },

	#[error("invalid username or password")]
	InvalidCredentials,
}

impl AuthnError {
	pub fn code(&self) -> &'static str {
		match self {
			AuthnError::MissingHeader => "MissingHeader",
			AuthnError::InvalidAuthHeader(_) => "InvalidAuthHeader",
			AuthnError::MissingKid => "MissingKid",
			AuthnError::MissingSecret => "MissingSecret",
			AuthnError::SignatureInvalid(_) => "SignatureInvalid",
			AuthnError::Expired { .. } => "Expired",
			AuthnError::InvalidCredentials => "InvalidCredentials",
		}
	}
}
