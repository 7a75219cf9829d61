// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer-JWT authentication against cached signing secrets.
//!
//! Tokens are HS256-signed with a per-user secret issued by the control
//! plane. The token's `kid` header selects the secret; the strategy
//! resolves it through a [`SecretGetter`] (the in-memory cache on the
//! authorization servers), verifies the signature and standard claims, and
//! finally rejects secrets past their own expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::instrument;
use warden_core::Secret;

use crate::error::AuthnError;
use crate::{authorization_header, AuthStrategy, Identity};

/// Audience claim every token must carry. Deployment constant.
pub const DEFAULT_AUDIENCE: &str = "warden.example.com";

/// Issuer claim stamped by the control plane's token endpoint.
pub const TOKEN_ISSUER: &str = "warden-apiserver";

/// Resolves a `kid` to a signing secret. The data-plane implementation is
/// an in-memory cache lookup; the control plane reads its own store.
#[async_trait]
pub trait SecretGetter: Send + Sync {
	async fn get_secret(&self, kid: &str) -> Option<Arc<Secret>>;
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Claims {
	iss: String,
	aud: String,
	sub: String,
	exp: i64,
}

pub struct BearerStrategy {
	secrets: Arc<dyn SecretGetter>,
	audience: String,
}

impl BearerStrategy {
	pub fn new(secrets: Arc<dyn SecretGetter>) -> Self {
		Self {
			secrets,
			audience: DEFAULT_AUDIENCE.to_string(),
		}
	}

	pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = audience.into();
		self
	}

	fn validation(&self) -> Validation {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.set_audience(&[&self.audience]);
		validation.set_issuer(&[TOKEN_ISSUER]);
		validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
		validation
	}
}

#[async_trait]
impl AuthStrategy for BearerStrategy {
	#[instrument(level = "debug", skip_all)]
	async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthnError> {
		let header = authorization_header(headers)?;
		let token = header.strip_prefix("Bearer ").ok_or_else(|| {
			AuthnError::InvalidAuthHeader("expected a Bearer token".to_string())
		})?;

		let jwt_header =
			decode_header(token).map_err(|e| AuthnError::SignatureInvalid(e.to_string()))?;
		let kid = jwt_header.kid.ok_or(AuthnError::MissingKid)?;

		let secret = self
			.secrets
			.get_secret(&kid)
			.await
			.ok_or(AuthnError::MissingSecret)?;

		decode::<Claims>(
			token,
			&DecodingKey::from_secret(secret.secret_key.as_bytes()),
			&self.validation(),
		)
		.map_err(|e| AuthnError::SignatureInvalid(e.to_string()))?;

		// The token checked out; the secret itself may still have lapsed.
		if secret.is_expired(Utc::now().timestamp()) {
			return Err(AuthnError::Expired {
				at: format_expiry(secret.expires),
			});
		}

		Ok(Identity {
			username: secret.username.clone(),
		})
	}
}

fn format_expiry(expires: i64) -> String {
	DateTime::<Utc>::from_timestamp(expires, 0)
		.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
		.unwrap_or_else(|| expires.to_string())
}
