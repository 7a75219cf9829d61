// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy-based authorization.
//!
//! Evaluates [`AuthzRequest`]s against the subject's cached policies with
//! deny-overrides semantics and submits an audit record for every decision.

pub mod authorizer;
pub mod matcher;

pub use authorizer::{
	Authorizer, AuthzRequest, AuthzResponse, PolicyGetter, CONCLUSION_DENIED,
	CONCLUSION_NO_POLICY,
};
pub use matcher::{match_any, pattern_matches};
