// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use async_trait::async_trait;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use warden_authn::{
	AuthStrategy, AutoStrategy, BasicStrategy, BearerStrategy, SecretGetter,
};
use warden_core::Secret;
use warden_storage::SharedStore;

use crate::auth::StoredCredentialVerifier;
use crate::middleware::{publish_hook, require_auth};
use crate::routes;
use crate::store::{PolicyAuditStore, PolicyStore, SecretStore, UserStore};

#[derive(Clone)]
pub struct AppState {
	pub users: UserStore,
	pub secrets: SecretStore,
	pub policies: PolicyStore,
	pub policy_audits: PolicyAuditStore,
	pub shared: Arc<dyn SharedStore>,
	pub strategy: Arc<dyn AuthStrategy>,
}

/// Bearer tokens on the control plane resolve their `kid` straight from
/// the secrets table; there is no cache tier here.
struct DbSecretGetter {
	secrets: SecretStore,
}

#[async_trait]
impl SecretGetter for DbSecretGetter {
	async fn get_secret(&self, kid: &str) -> Option<Arc<Secret>> {
		self.secrets
			.get(kid)
			.await
			.ok()
			.flatten()
			.map(|record| Arc::new(record.as_secret()))
	}
}

pub fn create_app_state(pool: SqlitePool, shared: Arc<dyn SharedStore>) -> AppState {
	let users = UserStore::new(pool.clone());
	let secrets = SecretStore::new(pool.clone());

	let basic = Arc::new(BasicStrategy::new(Arc::new(StoredCredentialVerifier::new(
		users.clone(),
	))));
	let bearer = Arc::new(BearerStrategy::new(Arc::new(DbSecretGetter {
		secrets: secrets.clone(),
	})));
	let strategy: Arc<dyn AuthStrategy> = Arc::new(AutoStrategy::new(basic, bearer));

	AppState {
		users,
		secrets,
		policies: PolicyStore::new(pool.clone()),
		policy_audits: PolicyAuditStore::new(pool),
		shared,
		strategy,
	}
}

async fn healthz() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

pub fn create_router(state: AppState) -> Router {
	let api = Router::new()
		.route("/v1/users", post(routes::users::create_user).get(routes::users::list_users))
		.route("/v1/users/:username", delete(routes::users::delete_user))
		.route(
			"/v1/secrets",
			post(routes::secrets::create_secret).get(routes::secrets::list_secrets),
		)
		.route("/v1/secrets/:secret_id", delete(routes::secrets::delete_secret))
		.route(
			"/v1/policies",
			post(routes::policies::put_policy).get(routes::policies::list_policies),
		)
		.route("/v1/policies/:name", delete(routes::policies::delete_policy))
		.route_layer(from_fn_with_state(state.clone(), require_auth))
		.layer(from_fn_with_state(state.clone(), publish_hook));

	Router::new()
		.route("/healthz", get(healthz))
		.merge(api)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
