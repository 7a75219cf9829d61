// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User management handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use warden_authn::Identity;

use crate::api::AppState;
use crate::auth::hash_password;
use crate::error::ApiError;
use crate::store::UserRecord;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
	pub username: String,
	pub password: String,
	#[serde(default)]
	pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
	pub username: String,
	pub email: Option<String>,
	pub created_at: String,
}

impl From<UserRecord> for UserResponse {
	fn from(record: UserRecord) -> Self {
		Self {
			username: record.username,
			email: record.email,
			created_at: record.created_at,
		}
	}
}

/// POST /v1/users
pub async fn create_user(
	State(state): State<AppState>,
	Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
	if body.username.is_empty() || body.username.len() > 64 {
		return Err(ApiError::BadRequest(
			"InvalidUsername",
			"username must be between 1 and 64 characters".to_string(),
		));
	}
	if body.password.len() < 8 {
		return Err(ApiError::BadRequest(
			"WeakPassword",
			"password must be at least 8 characters".to_string(),
		));
	}

	let hash = hash_password(&body.password)
		.map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

	if !state
		.users
		.create(&body.username, &hash, body.email.as_deref())
		.await?
	{
		return Err(ApiError::AlreadyExists("user"));
	}

	let record = state
		.users
		.get(&body.username)
		.await?
		.ok_or(ApiError::NotFound("user"))?;

	Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /v1/users
pub async fn list_users(
	State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
	let users = state.users.list().await?;
	Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// DELETE /v1/users/:username
pub async fn delete_user(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
	if identity.username != username {
		return Err(ApiError::Forbidden("users can only delete themselves"));
	}

	if !state.users.delete(&username).await? {
		return Err(ApiError::NotFound("user"));
	}

	Ok(StatusCode::NO_CONTENT)
}
