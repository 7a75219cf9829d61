// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control-plane API tests: CRUD, auth strategies and the invalidation
//! publish hook, against in-memory SQLite and an in-memory shared store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use futures::StreamExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use warden_apiserver::{create_app_state, create_router, AppState};
use warden_authn::{DEFAULT_AUDIENCE, TOKEN_ISSUER};
use warden_core::{Notification, NotificationCommand, NOTIFICATIONS_CHANNEL};
use warden_storage::{MemoryStore, SharedStore};

async fn harness() -> (Router, AppState, Arc<MemoryStore>) {
	let pool = warden_apiserver::db::memory_pool().await;
	let shared = Arc::new(MemoryStore::new());
	let state = create_app_state(pool, Arc::clone(&shared) as _);
	(create_router(state.clone()), state, shared)
}

fn basic(username: &str, password: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn send(
	router: &Router,
	method: Method,
	uri: &str,
	authorization: Option<&str>,
	body: Option<Value>,
) -> (StatusCode, Value) {
	let mut request = Request::builder().method(method).uri(uri);
	if let Some(authorization) = authorization {
		request = request.header(header::AUTHORIZATION, authorization);
	}

	let request = match body {
		Some(body) => request
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => request.body(Body::empty()).unwrap(),
	};

	let response = router.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
	(status, value)
}

async fn signup(router: &Router, username: &str, password: &str) {
	let (status, _) = send(
		router,
		Method::POST,
		"/v1/users",
		None,
		Some(json!({ "username": username, "password": password })),
	)
	.await;
	assert_eq!(status, StatusCode::CREATED);
}

async fn next_notification(store: &MemoryStore) -> Option<Notification> {
	let mut stream = store.subscribe(NOTIFICATIONS_CHANNEL).await.unwrap();
	tokio::time::timeout(Duration::from_millis(500), stream.next())
		.await
		.ok()
		.flatten()
		.and_then(|payload| serde_json::from_slice(&payload).ok())
}

#[tokio::test]
async fn healthz_needs_no_credentials() {
	let (router, _, _) = harness().await;
	let (status, body) = send(&router, Method::GET, "/healthz", None, None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn signup_then_basic_auth_works() {
	let (router, _, _) = harness().await;
	signup(&router, "alice", "correct-horse").await;

	let (status, body) = send(
		&router,
		Method::GET,
		"/v1/users",
		Some(&basic("alice", "correct-horse")),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body.as_array().unwrap().len(), 1);

	let (status, body) = send(
		&router,
		Method::GET,
		"/v1/users",
		Some(&basic("alice", "wrong-password")),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["code"], json!("InvalidCredentials"));
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
	let (router, _, _) = harness().await;
	signup(&router, "alice", "correct-horse").await;

	let (status, body) = send(
		&router,
		Method::POST,
		"/v1/users",
		None,
		Some(json!({ "username": "alice", "password": "correct-horse" })),
	)
	.await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["code"], json!("AlreadyExists"));
}

#[tokio::test]
async fn protected_routes_require_auth() {
	let (router, _, _) = harness().await;
	let (status, _) = send(&router, Method::GET, "/v1/secrets", None, None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn secret_creation_issues_key_material_and_publishes() {
	let (router, _, shared) = harness().await;
	signup(&router, "alice", "correct-horse").await;

	let notification = {
		let shared = Arc::clone(&shared);
		tokio::spawn(async move { next_notification(&shared).await })
	};
	// Let the subscriber attach before the mutation fires.
	tokio::time::sleep(Duration::from_millis(20)).await;

	let (status, body) = send(
		&router,
		Method::POST,
		"/v1/secrets",
		Some(&basic("alice", "correct-horse")),
		Some(json!({ "description": "ci token" })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["username"], json!("alice"));
	assert!(!body["secret_id"].as_str().unwrap().is_empty());
	assert!(!body["secret_key"].as_str().unwrap().is_empty());
	assert_eq!(body["expires"], json!(0));

	let notification = notification.await.unwrap().expect("notification published");
	assert_eq!(notification.command, NotificationCommand::SecretChanged);
}

#[tokio::test]
async fn policy_lifecycle_publishes_and_audits() {
	let (router, state, shared) = harness().await;
	signup(&router, "alice", "correct-horse").await;
	let auth = basic("alice", "correct-horse");

	let policy = json!({
		"id": "p1",
		"subjects": ["alice"],
		"resources": ["doc:1"],
		"actions": ["read"],
		"effect": "allow"
	});

	let notification = {
		let shared = Arc::clone(&shared);
		tokio::spawn(async move { next_notification(&shared).await })
	};
	tokio::time::sleep(Duration::from_millis(20)).await;

	let (status, body) = send(
		&router,
		Method::POST,
		"/v1/policies",
		Some(&auth),
		Some(policy),
	)
	.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["name"], json!("p1"));

	let notification = notification.await.unwrap().expect("notification published");
	assert_eq!(notification.command, NotificationCommand::PolicyChanged);

	let (status, _) = send(
		&router,
		Method::DELETE,
		"/v1/policies/p1",
		Some(&auth),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	// Deletion snapshots into the audit trail.
	assert_eq!(state.policy_audits.count().await.unwrap(), 1);

	let (status, _) = send(
		&router,
		Method::DELETE,
		"/v1/policies/p1",
		Some(&auth),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_policy_documents_are_rejected_and_not_published() {
	let (router, _, shared) = harness().await;
	signup(&router, "alice", "correct-horse").await;

	let notification = {
		let shared = Arc::clone(&shared);
		tokio::spawn(async move { next_notification(&shared).await })
	};
	tokio::time::sleep(Duration::from_millis(20)).await;

	let (status, _) = send(
		&router,
		Method::POST,
		"/v1/policies",
		Some(&basic("alice", "correct-horse")),
		Some(json!({
			"id": "",
			"subjects": ["alice"],
			"resources": ["doc:1"],
			"actions": ["read"],
			"effect": "allow"
		})),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	// Failed mutations must not invalidate data-plane caches.
	assert!(notification.await.unwrap().is_none());
}

#[tokio::test]
async fn bearer_tokens_work_through_the_auto_strategy() {
	let (router, _, _) = harness().await;
	signup(&router, "alice", "correct-horse").await;

	let (status, body) = send(
		&router,
		Method::POST,
		"/v1/secrets",
		Some(&basic("alice", "correct-horse")),
		Some(json!({})),
	)
	.await;
	assert_eq!(status, StatusCode::CREATED);

	let kid = body["secret_id"].as_str().unwrap();
	let key = body["secret_key"].as_str().unwrap();

	let mut header = Header::new(Algorithm::HS256);
	header.kid = Some(kid.to_string());
	let claims = json!({
		"iss": TOKEN_ISSUER,
		"aud": DEFAULT_AUDIENCE,
		"sub": "alice",
		"exp": Utc::now().timestamp() + 3600,
	});
	let token = encode(&header, &claims, &EncodingKey::from_secret(key.as_bytes())).unwrap();

	let (status, body) = send(
		&router,
		Method::GET,
		"/v1/secrets",
		Some(&format!("Bearer {token}")),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_cannot_delete_each_other() {
	let (router, _, _) = harness().await;
	signup(&router, "alice", "correct-horse").await;
	signup(&router, "bob", "battery-staple").await;

	let (status, _) = send(
		&router,
		Method::DELETE,
		"/v1/users/alice",
		Some(&basic("bob", "battery-staple")),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = send(
		&router,
		Method::DELETE,
		"/v1/users/bob",
		Some(&basic("bob", "battery-staple")),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);
}
