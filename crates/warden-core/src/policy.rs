// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access policy documents.
//!
//! A [`Policy`] grants or denies a set of actions on a set of resources to a
//! set of subjects. Subjects, resources and actions are pattern lists: each
//! entry is either a literal string or a `<regex>` segment delimited by angle
//! brackets. Policies may additionally carry condition predicates that are
//! evaluated against the request context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Whether a matching policy grants or denies access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
	Allow,
	Deny,
}

impl Effect {
	pub fn as_str(&self) -> &'static str {
		match self {
			Effect::Allow => "allow",
			Effect::Deny => "deny",
		}
	}
}

/// A single condition attached to a policy field.
///
/// Conditions are stored as an open `{ type, options }` pair rather than a
/// closed enum so that policy documents written for a newer server version
/// still deserialize on an older one. An unrecognized `type` never fulfills:
/// evaluation fails closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub options: serde_json::Value,
}

impl ConditionSpec {
	/// Evaluates the condition against the context value for its field.
	///
	/// A missing context value fails every condition kind.
	pub fn fulfills(&self, value: Option<&serde_json::Value>) -> bool {
		let Some(value) = value else {
			return false;
		};

		match self.kind.as_str() {
			"StringEqualCondition" => {
				matches!(
					(value.as_str(), self.options.get("equals").and_then(|v| v.as_str())),
					(Some(have), Some(want)) if have == want
				)
			}
			"StringMatchCondition" => {
				let (Some(have), Some(pattern)) = (
					value.as_str(),
					self.options.get("matches").and_then(|v| v.as_str()),
				) else {
					return false;
				};
				match regex::Regex::new(pattern) {
					Ok(re) => re.is_match(have),
					Err(_) => false,
				}
			}
			"BooleanCondition" => {
				matches!(
					(value.as_bool(), self.options.get("value").and_then(|v| v.as_bool())),
					(Some(have), Some(want)) if have == want
				)
			}
			_ => false,
		}
	}
}

/// An ordered access policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
	pub id: String,
	#[serde(default)]
	pub description: String,
	pub subjects: Vec<String>,
	pub resources: Vec<String>,
	pub actions: Vec<String>,
	pub effect: Effect,
	#[serde(default)]
	pub conditions: HashMap<String, ConditionSpec>,
}

impl Policy {
	pub fn allows(&self) -> bool {
		self.effect == Effect::Allow
	}
}
