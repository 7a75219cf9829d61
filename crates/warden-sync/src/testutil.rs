// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test doubles for the sync machinery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use warden_core::{Policy, Secret};

use crate::error::SyncError;
use crate::upstream::SnapshotSource;

#[derive(Default)]
struct State {
	secrets: HashMap<String, Secret>,
	policies: HashMap<String, Vec<Policy>>,
}

/// In-memory [`SnapshotSource`] with call counting and fault injection.
#[derive(Default)]
pub struct FakeSource {
	state: Mutex<State>,
	secret_calls: AtomicUsize,
	policy_calls: AtomicUsize,
	fail_next: AtomicBool,
}

impl FakeSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn put_secret(&self, secret: Secret) {
		let mut state = self.state.lock();
		state.secrets.insert(secret.secret_id.clone(), secret);
	}

	pub fn put_policies(&self, username: &str, policies: Vec<Policy>) {
		let mut state = self.state.lock();
		state.policies.insert(username.to_string(), policies);
	}

	pub fn clear(&self) {
		let mut state = self.state.lock();
		state.secrets.clear();
		state.policies.clear();
	}

	/// Makes the next snapshot fetch fail with an unavailable status.
	pub fn fail_next(&self) {
		self.fail_next.store(true, Ordering::SeqCst);
	}

	/// Number of `list_secrets` calls served so far.
	pub fn secret_list_calls(&self) -> usize {
		self.secret_calls.load(Ordering::SeqCst)
	}

	/// Number of `list_policies` calls served so far.
	pub fn policy_list_calls(&self) -> usize {
		self.policy_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl SnapshotSource for FakeSource {
	async fn list_secrets(&self) -> Result<HashMap<String, Secret>, SyncError> {
		if self.fail_next.swap(false, Ordering::SeqCst) {
			return Err(SyncError::Upstream(tonic::Status::unavailable(
				"control plane unavailable",
			)));
		}
		self.secret_calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.state.lock().secrets.clone())
	}

	async fn list_policies(&self) -> Result<HashMap<String, Vec<Policy>>, SyncError> {
		self.policy_calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.state.lock().policies.clone())
	}
}
