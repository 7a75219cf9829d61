// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Password hashing and the control plane's credential verifier.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier as _};
use async_trait::async_trait;
use warden_authn::{AuthnError, CredentialVerifier};

use crate::store::UserStore;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);
	Ok(Argon2::default()
		.hash_password(password.as_bytes(), &salt)?
		.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
	let Ok(parsed) = PasswordHash::new(hash) else {
		return false;
	};
	Argon2::default()
		.verify_password(password.as_bytes(), &parsed)
		.is_ok()
}

/// Verifies Basic credentials against the user store.
pub struct StoredCredentialVerifier {
	users: UserStore,
}

impl StoredCredentialVerifier {
	pub fn new(users: UserStore) -> Self {
		Self { users }
	}
}

#[async_trait]
impl CredentialVerifier for StoredCredentialVerifier {
	async fn verify(&self, username: &str, password: &str) -> Result<bool, AuthnError> {
		let user = self
			.users
			.get(username)
			.await
			.map_err(|_| AuthnError::InvalidCredentials)?;

		Ok(user
			.map(|u| verify_password(password, &u.password_hash))
			.unwrap_or(false))
	}
}
