// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control-plane persistence.
//!
//! Thin repositories over the SQL pool. Policies are stored with the full
//! JSON document (`policy_shadow`) next to the indexed columns so the
//! snapshot RPC can ship them verbatim.

use chrono::{Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use warden_core::Secret;

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
	pub username: String,
	pub password_hash: String,
	pub email: Option<String>,
	pub created_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct SecretRecord {
	pub secret_id: String,
	pub username: String,
	pub secret_key: String,
	pub expires: i64,
	pub description: Option<String>,
	pub created_at: String,
}

impl SecretRecord {
	pub fn as_secret(&self) -> Secret {
		Secret {
			secret_id: self.secret_id.clone(),
			username: self.username.clone(),
			secret_key: self.secret_key.clone(),
			expires: self.expires,
		}
	}
}

#[derive(Debug, Clone, FromRow)]
pub struct PolicyRecord {
	pub name: String,
	pub username: String,
	pub policy_shadow: String,
	pub created_at: String,
	pub updated_at: String,
}

#[derive(Clone)]
pub struct UserStore {
	pool: SqlitePool,
}

impl UserStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn create(
		&self,
		username: &str,
		password_hash: &str,
		email: Option<&str>,
	) -> Result<bool, sqlx::Error> {
		let result = sqlx::query(
			"INSERT OR IGNORE INTO users (username, password_hash, email, created_at) VALUES (?, ?, ?, ?)",
		)
		.bind(username)
		.bind(password_hash)
		.bind(email)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() == 1)
	}

	pub async fn get(&self, username: &str) -> Result<Option<UserRecord>, sqlx::Error> {
		sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE username = ?")
			.bind(username)
			.fetch_optional(&self.pool)
			.await
	}

	pub async fn list(&self) -> Result<Vec<UserRecord>, sqlx::Error> {
		sqlx::query_as::<_, UserRecord>("SELECT * FROM users ORDER BY username")
			.fetch_all(&self.pool)
			.await
	}

	pub async fn delete(&self, username: &str) -> Result<bool, sqlx::Error> {
		let result = sqlx::query("DELETE FROM users WHERE username = ?")
			.bind(username)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() == 1)
	}
}

#[derive(Clone)]
pub struct SecretStore {
	pool: SqlitePool,
}

impl SecretStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn create(&self, record: &SecretRecord) -> Result<(), sqlx::Error> {
		sqlx::query(
			"INSERT INTO secrets (secret_id, username, secret_key, expires, description, created_at) VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(&record.secret_id)
		.bind(&record.username)
		.bind(&record.secret_key)
		.bind(record.expires)
		.bind(&record.description)
		.bind(&record.created_at)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	pub async fn get(&self, secret_id: &str) -> Result<Option<SecretRecord>, sqlx::Error> {
		sqlx::query_as::<_, SecretRecord>("SELECT * FROM secrets WHERE secret_id = ?")
			.bind(secret_id)
			.fetch_optional(&self.pool)
			.await
	}

	pub async fn list_for_user(&self, username: &str) -> Result<Vec<SecretRecord>, sqlx::Error> {
		sqlx::query_as::<_, SecretRecord>(
			"SELECT * FROM secrets WHERE username = ? ORDER BY created_at",
		)
		.bind(username)
		.fetch_all(&self.pool)
		.await
	}

	pub async fn list_all(&self) -> Result<Vec<SecretRecord>, sqlx::Error> {
		sqlx::query_as::<_, SecretRecord>("SELECT * FROM secrets")
			.fetch_all(&self.pool)
			.await
	}

	pub async fn delete(&self, username: &str, secret_id: &str) -> Result<bool, sqlx::Error> {
		let result = sqlx::query("DELETE FROM secrets WHERE secret_id = ? AND username = ?")
			.bind(secret_id)
			.bind(username)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() == 1)
	}
}

#[derive(Clone)]
pub struct PolicyStore {
	pool: SqlitePool,
}

impl PolicyStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn upsert(
		&self,
		username: &str,
		name: &str,
		policy_shadow: &str,
	) -> Result<(), sqlx::Error> {
		let now = Utc::now().to_rfc3339();
		sqlx::query(
			r#"
			INSERT INTO policies (name, username, policy_shadow, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT (username, name)
			DO UPDATE SET policy_shadow = excluded.policy_shadow, updated_at = excluded.updated_at
			"#,
		)
		.bind(name)
		.bind(username)
		.bind(policy_shadow)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	pub async fn get(
		&self,
		username: &str,
		name: &str,
	) -> Result<Option<PolicyRecord>, sqlx::Error> {
		sqlx::query_as::<_, PolicyRecord>(
			"SELECT * FROM policies WHERE username = ? AND name = ?",
		)
		.bind(username)
		.bind(name)
		.fetch_optional(&self.pool)
		.await
	}

	pub async fn list_for_user(&self, username: &str) -> Result<Vec<PolicyRecord>, sqlx::Error> {
		sqlx::query_as::<_, PolicyRecord>(
			"SELECT * FROM policies WHERE username = ? ORDER BY name",
		)
		.bind(username)
		.fetch_all(&self.pool)
		.await
	}

	pub async fn list_all(&self) -> Result<Vec<PolicyRecord>, sqlx::Error> {
		sqlx::query_as::<_, PolicyRecord>("SELECT * FROM policies")
			.fetch_all(&self.pool)
			.await
	}

	/// Deletes a policy, snapshotting it into the audit trail first.
	pub async fn delete(&self, username: &str, name: &str) -> Result<bool, sqlx::Error> {
		let Some(existing) = self.get(username, name).await? else {
			return Ok(false);
		};

		let mut tx = self.pool.begin().await?;
		sqlx::query(
			"INSERT INTO policy_audit (name, username, policy_shadow, deleted_at) VALUES (?, ?, ?, ?)",
		)
		.bind(&existing.name)
		.bind(&existing.username)
		.bind(&existing.policy_shadow)
		.bind(Utc::now().to_rfc3339())
		.execute(&mut *tx)
		.await?;

		sqlx::query("DELETE FROM policies WHERE username = ? AND name = ?")
			.bind(username)
			.bind(name)
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;

		Ok(true)
	}
}

#[derive(Clone)]
pub struct PolicyAuditStore {
	pool: SqlitePool,
}

impl PolicyAuditStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn count(&self) -> Result<i64, sqlx::Error> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM policy_audit")
			.fetch_one(&self.pool)
			.await?;
		Ok(count)
	}

	/// Deletes audit rows older than the retention window. Returns the
	/// number of rows removed.
	pub async fn clear_outdated(&self, max_reserve_days: i64) -> Result<u64, sqlx::Error> {
		let horizon = (Utc::now() - Duration::days(max_reserve_days)).to_rfc3339();
		let result = sqlx::query("DELETE FROM policy_audit WHERE deleted_at < ?")
			.bind(&horizon)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::memory_pool;

	fn secret_record(id: &str, username: &str) -> SecretRecord {
		SecretRecord {
			secret_id: id.to_string(),
			username: username.to_string(),
			secret_key: "sek".to_string(),
			expires: 0,
			description: None,
			created_at: Utc::now().to_rfc3339(),
		}
	}

	#[tokio::test]
	async fn users_round_trip() {
		let pool = memory_pool().await;
		let store = UserStore::new(pool);

		assert!(store.create("alice", "hash", Some("a@example.com")).await.unwrap());
		// Second create with the same name is a conflict.
		assert!(!store.create("alice", "other", None).await.unwrap());

		let user = store.get("alice").await.unwrap().unwrap();
		assert_eq!(user.password_hash, "hash");

		assert!(store.delete("alice").await.unwrap());
		assert!(store.get("alice").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn secrets_are_scoped_to_their_owner() {
		let pool = memory_pool().await;
		let store = SecretStore::new(pool);

		store.create(&secret_record("k1", "alice")).await.unwrap();
		store.create(&secret_record("k2", "bob")).await.unwrap();

		assert_eq!(store.list_for_user("alice").await.unwrap().len(), 1);
		assert_eq!(store.list_all().await.unwrap().len(), 2);

		// bob cannot delete alice's secret
		assert!(!store.delete("bob", "k1").await.unwrap());
		assert!(store.delete("alice", "k1").await.unwrap());
	}

	#[tokio::test]
	async fn policy_upsert_replaces_document() {
		let pool = memory_pool().await;
		let store = PolicyStore::new(pool);

		store.upsert("alice", "p1", r#"{"v":1}"#).await.unwrap();
		store.upsert("alice", "p1", r#"{"v":2}"#).await.unwrap();

		let record = store.get("alice", "p1").await.unwrap().unwrap();
		assert_eq!(record.policy_shadow, r#"{"v":2}"#);
		assert_eq!(store.list_all().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn policy_delete_snapshots_into_audit() {
		let pool = memory_pool().await;
		let store = PolicyStore::new(pool.clone());
		let audit = PolicyAuditStore::new(pool);

		store.upsert("alice", "p1", r#"{"v":1}"#).await.unwrap();
		assert!(store.delete("alice", "p1").await.unwrap());
		assert!(!store.delete("alice", "p1").await.unwrap());

		assert_eq!(audit.count().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn clear_outdated_respects_retention() {
		let pool = memory_pool().await;
		let audit = PolicyAuditStore::new(pool.clone());

		let old = (Utc::now() - Duration::days(120)).to_rfc3339();
		let recent = Utc::now().to_rfc3339();
		for (name, deleted_at) in [("old", &old), ("recent", &recent)] {
			sqlx::query(
				"INSERT INTO policy_audit (name, username, policy_shadow, deleted_at) VALUES (?, 'alice', '{}', ?)",
			)
			.bind(name)
			.bind(deleted_at)
			.execute(&pool)
			.await
			.unwrap();
		}

		let removed = audit.clear_outdated(90).await.unwrap();
		assert_eq!(removed, 1);
		assert_eq!(audit.count().await.unwrap(), 1);
	}
}
