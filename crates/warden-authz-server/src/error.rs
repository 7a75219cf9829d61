// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error envelope for the authorization API.
//!
//! Authentication failures are 401 with a human-readable reason.
//! Policy-based denials are NOT errors; they return 200 with
//! `{ allowed: false, denied: true }` from the handler itself.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use warden_authn::AuthnError;

#[derive(Error, Debug)]
pub enum AuthzApiError {
	#[error("{0}")]
	Unauthorized(#[from] AuthnError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	code: String,
	message: String,
}

impl IntoResponse for AuthzApiError {
	fn into_response(self) -> Response {
		match self {
			AuthzApiError::Unauthorized(e) => (
				StatusCode::UNAUTHORIZED,
				Json(ErrorBody {
					code: e.code().to_string(),
					message: e.to_string(),
				}),
			)
				.into_response(),
		}
	}
}
