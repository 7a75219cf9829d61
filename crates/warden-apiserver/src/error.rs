// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Uniform API error envelope.
//!
//! Handler errors render as `{ "code": ..., "message": ... }` with a
//! matching HTTP status. The machine-readable code is stable; the message
//! is for humans.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use warden_authn::AuthnError;

#[derive(Error, Debug)]
pub enum ApiError {
	#[error("{1}")]
	BadRequest(&'static str, String),

	#[error("{0}")]
	Unauthorized(AuthnError),

	#[error("{0}")]
	Forbidden(&'static str),

	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("{0} already exists")]
	AlreadyExists(&'static str),

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("internal error: {0}")]
	Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	code: String,
	message: String,
}

impl ApiError {
	fn status(&self) -> StatusCode {
		match self {
			ApiError::BadRequest(..) => StatusCode::BAD_REQUEST,
			ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
			ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn code(&self) -> String {
		match self {
			ApiError::BadRequest(code, _) => (*code).to_string(),
			ApiError::Unauthorized(e) => e.code().to_string(),
			ApiError::Forbidden(_) => "Forbidden".to_string(),
			ApiError::NotFound(_) => "NotFound".to_string(),
			ApiError::AlreadyExists(_) => "AlreadyExists".to_string(),
			ApiError::Database(_) | ApiError::Internal(_) => "Internal".to_string(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		// Internal detail stays in the log, not in the response body.
		let message = match &self {
			ApiError::Database(e) => {
				tracing::error!(error = %e, "database error");
				"internal error".to_string()
			}
			ApiError::Internal(e) => {
				tracing::error!(error = %e, "internal error");
				"internal error".to_string()
			}
			other => other.to_string(),
		};

		(
			status,
			Json(ErrorBody {
				code: self.code(),
				message,
			}),
		)
			.into_response()
	}
}

impl From<AuthnError> for ApiError {
	fn from(err: AuthnError) -> Self {
		ApiError::Unauthorized(err)
	}
}
