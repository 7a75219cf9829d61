// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Basic authentication against stored credentials.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::HeaderMap;

use crate::error::AuthnError;
use crate::{authorization_header, AuthStrategy, Identity};

/// Checks a username/password pair against the credential store.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
	async fn verify(&self, username: &str, password: &str) -> Result<bool, AuthnError>;
}

pub struct BasicStrategy {
	verifier: Arc<dyn CredentialVerifier>,
}

impl BasicStrategy {
	pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
		Self { verifier }
	}
}

#[async_trait]
impl AuthStrategy for BasicStrategy {
	async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthnError> {
		let header = authorization_header(headers)?;
		let encoded = header.strip_prefix("Basic ").ok_or_else(|| {
			AuthnError::InvalidAuthHeader("expected Basic credentials".to_string())
		})?;

		let decoded = STANDARD
			.decode(encoded)
			.map_err(|_| AuthnError::InvalidAuthHeader("credentials are not base64".to_string()))?;
		let decoded = String::from_utf8(decoded).map_err(|_| {
			AuthnError::InvalidAuthHeader("credentials are not valid UTF-8".to_string())
		})?;

		let (username, password) = decoded
			.split_once(':')
			.ok_or_else(|| AuthnError::InvalidAuthHeader("malformed credentials".to_string()))?;

		if !self.verifier.verify(username, password).await? {
			return Err(AuthnError::InvalidCredentials);
		}

		Ok(Identity {
			username: username.to_string(),
		})
	}
}
