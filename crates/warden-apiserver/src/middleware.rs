// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request middleware: authentication and the invalidation publish hook.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, error};
use warden_core::{Notification, NotificationCommand, NOTIFICATIONS_CHANNEL};

use crate::api::AppState;
use crate::error::ApiError;

/// Endpoints reachable without credentials. User signup has to be open or
/// nobody could ever obtain credentials.
fn is_public(method: &Method, path: &str) -> bool {
	*method == Method::POST && path == "/v1/users"
}

/// Authenticates the request and stashes the caller identity in request
/// extensions.
pub async fn require_auth(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Result<Response, ApiError> {
	if !is_public(request.method(), request.uri().path()) {
		let identity = state.strategy.authenticate(request.headers()).await?;
		request.extensions_mut().insert(identity);
	}

	Ok(next.run(request).await)
}

/// Publishes a cache invalidation notification after successful mutations.
///
/// Runs after the handler: a 2xx response to a mutating method on a
/// secrets or policies route notifies every authorization replica that its
/// cache is stale. Publish failures are logged; the HTTP response is
/// unaffected.
pub async fn publish_hook(State(state): State<AppState>, request: Request, next: Next) -> Response {
	let method = request.method().clone();
	let path = request.uri().path().to_string();

	let response = next.run(request).await;

	if !response.status().is_success() {
		debug!(status = %response.status(), "mutation failed, skipping notification");
		return response;
	}

	let mutating = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(&method);
	if !mutating {
		return response;
	}

	// "/v1/secrets/abc" -> "secrets"
	let resource = path.split('/').nth(2).unwrap_or_default();
	let command = match resource {
		"policies" => NotificationCommand::PolicyChanged,
		"secrets" => NotificationCommand::SecretChanged,
		_ => return response,
	};

	let payload = match serde_json::to_vec(&Notification::new(command)) {
		Ok(payload) => payload,
		Err(e) => {
			error!(error = %e, "failed to encode notification");
			return response;
		}
	};

	if let Err(e) = state.shared.publish(NOTIFICATIONS_CHANNEL, &payload).await {
		error!(error = %e, "failed to publish invalidation notification");
	} else {
		debug!(%method, resource, ?command, "published invalidation notification");
	}

	response
}
