// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization decisions over cached policies.
//!
//! The decision procedure is deliberately small:
//!
//! 1. Fetch the subject's policies through [`PolicyGetter`].
//! 2. Collect candidates whose subject/resource/action patterns and
//!    condition predicates all match.
//! 3. No candidate: deny. Any candidate with deny effect: deny (explicit
//!    deny always wins). Otherwise: allow.
//!
//! Deny-overrides-allow is fixed, not configurable. A policy-based denial
//! is an ordinary response, not an error.
//!
//! Every decision produces an [`AuditRecord`] carrying the matched policy
//! ids and the deciding policy ids, submitted to the recorder when one is
//! attached.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use warden_analytics::{AuditRecord, Recorder};
use warden_core::{Effect, Policy};

use crate::matcher::match_any;

/// Conclusion when no policy matched the request.
pub const CONCLUSION_NO_POLICY: &str = "no policy allowing access";

/// Conclusion when a matching deny policy decided the outcome.
pub const CONCLUSION_DENIED: &str = "Requests denied by policy";

/// Resolves the policies indexed under a subject. Implemented by the
/// data-plane cache.
pub trait PolicyGetter: Send + Sync {
	fn get_policies(&self, username: &str) -> Option<Arc<Vec<Policy>>>;
}

/// An authorization question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthzRequest {
	pub subject: String,
	pub action: String,
	pub resource: String,
	#[serde(default)]
	pub context: HashMap<String, serde_json::Value>,
}

/// The answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzResponse {
	pub allowed: bool,
	pub denied: bool,
	pub conclusion: String,
}

impl AuthzResponse {
	fn allow() -> Self {
		Self {
			allowed: true,
			denied: false,
			conclusion: String::new(),
		}
	}

	fn deny(conclusion: &str) -> Self {
		Self {
			allowed: false,
			denied: true,
			conclusion: conclusion.to_string(),
		}
	}
}

struct Evaluation {
	response: AuthzResponse,
	matched: Vec<String>,
	deciders: Vec<String>,
}

pub struct Authorizer {
	policies: Arc<dyn PolicyGetter>,
	recorder: Option<Arc<Recorder>>,
}

impl Authorizer {
	pub fn new(policies: Arc<dyn PolicyGetter>) -> Self {
		Self {
			policies,
			recorder: None,
		}
	}

	pub fn with_recorder(mut self, recorder: Arc<Recorder>) -> Self {
		self.recorder = Some(recorder);
		self
	}

	/// Decides the request on behalf of `username` (the authenticated
	/// caller, which enriches the condition context).
	#[instrument(level = "debug", skip(self, request), fields(subject = %request.subject, action = %request.action, resource = %request.resource))]
	pub async fn authorize(&self, username: &str, request: &AuthzRequest) -> AuthzResponse {
		let mut context = request.context.clone();
		context.insert("username".to_string(), json!(username));

		let candidates = self.policies.get_policies(&request.subject);
		let evaluation = evaluate(
			candidates.as_deref().map(Vec::as_slice).unwrap_or(&[]),
			request,
			&context,
		);

		if let Some(recorder) = &self.recorder {
			let record = build_record(username, request, &evaluation);
			recorder.record(record).await;
		}

		evaluation.response
	}
}

fn evaluate(
	policies: &[Policy],
	request: &AuthzRequest,
	context: &HashMap<String, serde_json::Value>,
) -> Evaluation {
	let mut matched = Vec::new();
	let mut allowers = Vec::new();
	let mut deniers = Vec::new();

	for policy in policies {
		if !match_any(&policy.subjects, &request.subject)
			|| !match_any(&policy.actions, &request.action)
			|| !match_any(&policy.resources, &request.resource)
		{
			continue;
		}

		if !policy
			.conditions
			.iter()
			.all(|(field, condition)| condition.fulfills(context.get(field)))
		{
			continue;
		}

		matched.push(policy.id.clone());
		match policy.effect {
			Effect::Allow => allowers.push(policy.id.clone()),
			Effect::Deny => deniers.push(policy.id.clone()),
		}
	}

	if matched.is_empty() {
		return Evaluation {
			response: AuthzResponse::deny(CONCLUSION_NO_POLICY),
			matched,
			deciders: Vec::new(),
		};
	}

	if !deniers.is_empty() {
		return Evaluation {
			response: AuthzResponse::deny(CONCLUSION_DENIED),
			matched,
			deciders: deniers,
		};
	}

	Evaluation {
		response: AuthzResponse::allow(),
		matched,
		deciders: allowers,
	}
}

fn build_record(username: &str, request: &AuthzRequest, evaluation: &Evaluation) -> AuditRecord {
	let effect = if evaluation.response.allowed {
		"allow"
	} else {
		"deny"
	};

	let mut record = AuditRecord {
		timestamp: Utc::now().timestamp(),
		username: username.to_string(),
		effect: effect.to_string(),
		conclusion: evaluation.response.conclusion.clone(),
		request: serde_json::to_string(request).unwrap_or_default(),
		policies: serde_json::to_string(&evaluation.matched).unwrap_or_default(),
		deciders: serde_json::to_string(&evaluation.deciders).unwrap_or_default(),
		expire_at: Utc::now(),
	};
	record.set_expiry(0);
	record
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap as Map;
	use warden_core::ConditionSpec;

	struct MapGetter(Map<String, Arc<Vec<Policy>>>);

	impl PolicyGetter for MapGetter {
		fn get_policies(&self, username: &str) -> Option<Arc<Vec<Policy>>> {
			self.0.get(username).cloned()
		}
	}

	fn policy(id: &str, effect: Effect) -> Policy {
		Policy {
			id: id.to_string(),
			description: String::new(),
			subjects: vec!["alice".to_string()],
			resources: vec!["doc:1".to_string()],
			actions: vec!["read".to_string()],
			effect,
			conditions: Map::new(),
		}
	}

	fn request() -> AuthzRequest {
		AuthzRequest {
			subject: "alice".to_string(),
			action: "read".to_string(),
			resource: "doc:1".to_string(),
			context: Map::new(),
		}
	}

	fn authorizer(policies: Vec<Policy>) -> Authorizer {
		let mut map = Map::new();
		map.insert("alice".to_string(), Arc::new(policies));
		Authorizer::new(Arc::new(MapGetter(map)))
	}

	#[tokio::test]
	async fn allow_policy_allows() {
		let response = authorizer(vec![policy("p1", Effect::Allow)])
			.authorize("alice", &request())
			.await;

		assert!(response.allowed);
		assert!(!response.denied);
	}

	#[tokio::test]
	async fn no_policies_denies_with_conclusion() {
		let response = authorizer(vec![]).authorize("alice", &request()).await;

		assert!(response.denied);
		assert_eq!(response.conclusion, CONCLUSION_NO_POLICY);
	}

	#[tokio::test]
	async fn unknown_subject_denies() {
		let response = authorizer(vec![policy("p1", Effect::Allow)])
			.authorize("alice", &AuthzRequest {
				subject: "mallory".to_string(),
				..request()
			})
			.await;

		assert!(response.denied);
		assert_eq!(response.conclusion, CONCLUSION_NO_POLICY);
	}

	#[tokio::test]
	async fn explicit_deny_overrides_allow() {
		let response = authorizer(vec![policy("p1", Effect::Allow), policy("p2", Effect::Deny)])
			.authorize("alice", &request())
			.await;

		assert!(response.denied);
		assert_eq!(response.conclusion, CONCLUSION_DENIED);
	}

	#[tokio::test]
	async fn deny_wins_regardless_of_order() {
		let response = authorizer(vec![policy("p2", Effect::Deny), policy("p1", Effect::Allow)])
			.authorize("alice", &request())
			.await;

		assert!(response.denied);
	}

	#[tokio::test]
	async fn non_matching_action_is_not_a_candidate() {
		let response = authorizer(vec![policy("p1", Effect::Allow)])
			.authorize("alice", &AuthzRequest {
				action: "delete".to_string(),
				..request()
			})
			.await;

		assert!(response.denied);
		assert_eq!(response.conclusion, CONCLUSION_NO_POLICY);
	}

	#[tokio::test]
	async fn failed_condition_removes_candidate() {
		let mut p = policy("p1", Effect::Allow);
		p.conditions.insert(
			"username".to_string(),
			ConditionSpec {
				kind: "StringEqualCondition".to_string(),
				options: serde_json::json!({ "equals": "bob" }),
			},
		);

		let response = authorizer(vec![p]).authorize("alice", &request()).await;
		assert!(response.denied);
	}

	#[tokio::test]
	async fn context_is_enriched_with_caller_username() {
		let mut p = policy("p1", Effect::Allow);
		p.conditions.insert(
			"username".to_string(),
			ConditionSpec {
				kind: "StringEqualCondition".to_string(),
				options: serde_json::json!({ "equals": "alice" }),
			},
		);

		let response = authorizer(vec![p]).authorize("alice", &request()).await;
		assert!(response.allowed);
	}

	#[tokio::test]
	async fn unknown_condition_kind_fails_closed() {
		let mut p = policy("p1", Effect::Allow);
		p.conditions.insert(
			"username".to_string(),
			ConditionSpec {
				kind: "TimeOfDayCondition".to_string(),
				options: serde_json::json!({ "after": "09:00" }),
			},
		);

		let response = authorizer(vec![p]).authorize("alice", &request()).await;
		assert!(response.denied);
	}

	#[tokio::test]
	async fn regex_patterns_match_resources() {
		let mut p = policy("p1", Effect::Allow);
		p.resources = vec!["doc:<[0-9]+>".to_string()];

		let auth = authorizer(vec![p]);
		let ok = auth
			.authorize("alice", &AuthzRequest {
				resource: "doc:99".to_string(),
				..request()
			})
			.await;
		assert!(ok.allowed);

		let nope = auth
			.authorize("alice", &AuthzRequest {
				resource: "doc:abc".to_string(),
				..request()
			})
			.await;
		assert!(nope.denied);
	}

	mod audit {
		use super::*;
		use std::sync::Arc;
		use warden_analytics::{AuditRecord, ANALYTICS_QUEUE_KEY};
		use warden_config::AnalyticsConfig;
		use warden_storage::{MemoryStore, SharedStore};

		async fn decide_and_drain(policies: Vec<Policy>) -> AuditRecord {
			let store = Arc::new(MemoryStore::new());
			let recorder = Arc::new(Recorder::start(
				&AnalyticsConfig {
					enabled: true,
					pool_size: 1,
					records_buffer_size: 8,
					flush_interval_ms: 10,
				},
				Arc::clone(&store) as _,
			));

			let auth = authorizer(policies).with_recorder(Arc::clone(&recorder));
			auth.authorize("alice", &request()).await;
			recorder.stop().await;

			let drained = store.get_and_delete_set(ANALYTICS_QUEUE_KEY).await.unwrap();
			assert_eq!(drained.len(), 1);
			AuditRecord::decode(&drained[0]).unwrap()
		}

		#[tokio::test]
		async fn allow_decisions_are_recorded() {
			let record = decide_and_drain(vec![policy("p1", Effect::Allow)]).await;
			assert_eq!(record.effect, "allow");
			assert_eq!(record.username, "alice");
			assert!(record.policies.contains("p1"));
			assert!(record.deciders.contains("p1"));
		}

		#[tokio::test]
		async fn deny_decisions_carry_the_deciding_policies() {
			let record =
				decide_and_drain(vec![policy("p1", Effect::Allow), policy("p2", Effect::Deny)])
					.await;
			assert_eq!(record.effect, "deny");
			assert_eq!(record.conclusion, CONCLUSION_DENIED);
			assert!(record.policies.contains("p1"));
			assert!(record.policies.contains("p2"));
			assert!(record.deciders.contains("p2"));
			assert!(!record.deciders.contains("p1"));
		}
	}
}
