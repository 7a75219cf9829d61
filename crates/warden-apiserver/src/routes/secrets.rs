// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret management handlers.
//!
//! Secrets are issued, never chosen: both the id (the JWT `kid`) and the
//! key material are generated server-side and returned once on creation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_authn::Identity;

use crate::api::AppState;
use crate::error::ApiError;
use crate::store::SecretRecord;

#[derive(Debug, Deserialize, Default)]
pub struct CreateSecretRequest {
	#[serde(default)]
	pub description: Option<String>,
	/// Unix seconds; zero (the default) never expires.
	#[serde(default)]
	pub expires: i64,
}

#[derive(Debug, Serialize)]
pub struct SecretResponse {
	pub secret_id: String,
	pub username: String,
	pub secret_key: String,
	pub expires: i64,
	pub description: Option<String>,
	pub created_at: String,
}

impl From<SecretRecord> for SecretResponse {
	fn from(record: SecretRecord) -> Self {
		Self {
			secret_id: record.secret_id,
			username: record.username,
			secret_key: record.secret_key,
			expires: record.expires,
			description: record.description,
			created_at: record.created_at,
		}
	}
}

/// POST /v1/secrets
pub async fn create_secret(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Json(body): Json<CreateSecretRequest>,
) -> Result<(StatusCode, Json<SecretResponse>), ApiError> {
	if body.expires < 0 {
		return Err(ApiError::BadRequest(
			"InvalidExpiry",
			"expires must be zero or a future unix timestamp".to_string(),
		));
	}

	let record = SecretRecord {
		secret_id: Uuid::new_v4().simple().to_string(),
		username: identity.username.clone(),
		secret_key: Uuid::new_v4().simple().to_string(),
		expires: body.expires,
		description: body.description,
		created_at: Utc::now().to_rfc3339(),
	};

	state.secrets.create(&record).await?;
	Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /v1/secrets
pub async fn list_secrets(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<SecretResponse>>, ApiError> {
	let records = state.secrets.list_for_user(&identity.username).await?;
	Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// DELETE /v1/secrets/:secret_id
pub async fn delete_secret(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Path(secret_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	if !state.secrets.delete(&identity.username, &secret_id).await? {
		return Err(ApiError::NotFound("secret"));
	}
	Ok(StatusCode::NO_CONTENT)
}
