// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication strategies.
//!
//! Every Warden HTTP surface authenticates through the [`AuthStrategy`]
//! capability. Three strategies exist:
//!
//! - [`BasicStrategy`] - `Authorization: Basic` against a credential
//!   verifier (control plane)
//! - [`BearerStrategy`] - `Authorization: Bearer <jwt>` resolving the `kid`
//!   header against a secret source (data plane hot path)
//! - [`AutoStrategy`] - inspects the scheme prefix and delegates
//!
//! Strategies work on plain [`http::HeaderMap`]s; the axum wiring lives in
//! the server crates.

pub mod basic;
pub mod bearer;
pub mod error;

pub use basic::{BasicStrategy, CredentialVerifier};
pub use bearer::{BearerStrategy, SecretGetter, DEFAULT_AUDIENCE, TOKEN_ISSUER};
pub use error::AuthnError;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub username: String,
}

#[async_trait]
pub trait AuthStrategy: Send + Sync {
	async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthnError>;
}

/// Reads the raw `Authorization` header value.
pub(crate) fn authorization_header(headers: &HeaderMap) -> Result<&str, AuthnError> {
	let value = headers.get(AUTHORIZATION).ok_or(AuthnError::MissingHeader)?;
	value
		.to_str()
		.map_err(|_| AuthnError::InvalidAuthHeader("header is not valid UTF-8".to_string()))
}

/// Scheme-switching strategy.
///
/// Looks at the first word of the `Authorization` header and delegates to
/// the matching strategy. No shared base type is needed; both arms are
/// plain [`AuthStrategy`] values.
pub struct AutoStrategy {
	basic: Arc<dyn AuthStrategy>,
	bearer: Arc<dyn AuthStrategy>,
}

impl AutoStrategy {
	pub fn new(basic: Arc<dyn AuthStrategy>, bearer: Arc<dyn AuthStrategy>) -> Self {
		Self { basic, bearer }
	}
}

#[async_trait]
impl AuthStrategy for AutoStrategy {
	async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthnError> {
		let header = authorization_header(headers)?;

		match header.split_whitespace().next() {
			Some("Basic") => self.basic.authenticate(headers).await,
			Some("Bearer") => self.bearer.authenticate(headers).await,
			_ => Err(AuthnError::InvalidAuthHeader(
				"unsupported authorization scheme".to_string(),
			)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::header::HeaderValue;

	struct FixedStrategy(&'static str);

	#[async_trait]
	impl AuthStrategy for FixedStrategy {
		async fn authenticate(&self, _headers: &HeaderMap) -> Result<Identity, AuthnError> {
			Ok(Identity {
				username: self.0.to_string(),
			})
		}
	}

	fn auto() -> AutoStrategy {
		AutoStrategy::new(
			Arc::new(FixedStrategy("via-basic")),
			Arc::new(FixedStrategy("via-bearer")),
		)
	}

	#[tokio::test]
	async fn dispatches_basic_scheme() {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));

		let identity = auto().authenticate(&headers).await.unwrap();
		assert_eq!(identity.username, "via-basic");
	}

	#[tokio::test]
	async fn dispatches_bearer_scheme() {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer some.jwt.here"));

		let identity = auto().authenticate(&headers).await.unwrap();
		assert_eq!(identity.username, "via-bearer");
	}

	#[tokio::test]
	async fn missing_header_is_reported() {
		let err = auto().authenticate(&HeaderMap::new()).await.unwrap_err();
		assert_eq!(err, AuthnError::MissingHeader);
	}

	#[tokio::test]
	async fn unknown_scheme_is_rejected() {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Digest abc"));

		let err = auto().authenticate(&headers).await.unwrap_err();
		assert!(matches!(err, AuthnError::InvalidAuthHeader(_)));
	}
}
