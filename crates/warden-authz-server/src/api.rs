// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router assembly for the authorization API.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;
use warden_authn::{AuthStrategy, Identity};
use warden_authz::{Authorizer, AuthzRequest, AuthzResponse};

use crate::error::AuthzApiError;

#[derive(Clone)]
pub struct AppState {
	pub strategy: Arc<dyn AuthStrategy>,
	pub authorizer: Arc<Authorizer>,
}

async fn require_auth(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Result<Response, AuthzApiError> {
	let identity = state.strategy.authenticate(request.headers()).await?;
	request.extensions_mut().insert(identity);
	Ok(next.run(request).await)
}

/// POST /v1/authz
async fn authorize(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Json(request): Json<AuthzRequest>,
) -> Json<AuthzResponse> {
	Json(state.authorizer.authorize(&identity.username, &request).await)
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/authz", post(authorize))
		.route_layer(from_fn_with_state(state.clone(), require_auth))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

/// Liveness router, bound to its own insecure address.
pub fn health_router() -> Router {
	Router::new().route("/healthz", get(healthz))
}
