// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy management handlers.
//!
//! The full policy document is accepted as-is and stored verbatim next to
//! the indexed columns. Validation happens here: by the time a document is
//! in the store, every authorization replica must be able to evaluate it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use warden_authn::Identity;
use warden_core::Policy;

use crate::api::AppState;
use crate::error::ApiError;
use crate::store::PolicyRecord;

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
	pub name: String,
	pub username: String,
	pub policy: serde_json::Value,
	pub created_at: String,
	pub updated_at: String,
}

impl TryFrom<PolicyRecord> for PolicyResponse {
	type Error = ApiError;

	fn try_from(record: PolicyRecord) -> Result<Self, ApiError> {
		let policy = serde_json::from_str(&record.policy_shadow)
			.map_err(|e| ApiError::Internal(format!("stored policy is unreadable: {e}")))?;
		Ok(Self {
			name: record.name,
			username: record.username,
			policy,
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}
}

/// POST /v1/policies (create or replace by policy id)
pub async fn put_policy(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Json(policy): Json<Policy>,
) -> Result<(StatusCode, Json<PolicyResponse>), ApiError> {
	if policy.id.is_empty() {
		return Err(ApiError::BadRequest(
			"InvalidPolicy",
			"policy id must not be empty".to_string(),
		));
	}
	if policy.subjects.is_empty() || policy.resources.is_empty() || policy.actions.is_empty() {
		return Err(ApiError::BadRequest(
			"InvalidPolicy",
			"subjects, resources and actions must not be empty".to_string(),
		));
	}

	let shadow = serde_json::to_string(&policy)
		.map_err(|e| ApiError::Internal(format!("policy serialization failed: {e}")))?;

	state
		.policies
		.upsert(&identity.username, &policy.id, &shadow)
		.await?;

	let record = state
		.policies
		.get(&identity.username, &policy.id)
		.await?
		.ok_or(ApiError::NotFound("policy"))?;

	Ok((StatusCode::CREATED, Json(record.try_into()?)))
}

/// GET /v1/policies
pub async fn list_policies(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<PolicyResponse>>, ApiError> {
	let records = state.policies.list_for_user(&identity.username).await?;
	let mut responses = Vec::with_capacity(records.len());
	for record in records {
		responses.push(record.try_into()?);
	}
	Ok(Json(responses))
}

/// DELETE /v1/policies/:name
pub async fn delete_policy(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
	if !state.policies.delete(&identity.username, &name).await? {
		return Err(ApiError::NotFound("policy"));
	}
	Ok(StatusCode::NO_CONTENT)
}
