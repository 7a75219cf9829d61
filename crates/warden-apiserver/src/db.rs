// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database pool and schema bootstrap.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub async fn create_pool(url: &str) -> Result<SqlitePool, sqlx::Error> {
	SqlitePoolOptions::new().max_connections(16).connect(url).await
}

/// Creates the schema when missing. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS users (
			username TEXT PRIMARY KEY,
			password_hash TEXT NOT NULL,
			email TEXT,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS secrets (
			secret_id TEXT PRIMARY KEY,
			username TEXT NOT NULL,
			secret_key TEXT NOT NULL,
			expires INTEGER NOT NULL DEFAULT 0,
			description TEXT,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS policies (
			name TEXT NOT NULL,
			username TEXT NOT NULL,
			policy_shadow TEXT NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			PRIMARY KEY (username, name)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS policy_audit (
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			name TEXT NOT NULL,
			username TEXT NOT NULL,
			policy_shadow TEXT NOT NULL,
			deleted_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	Ok(())
}

/// Pool on an in-memory database, for tests.
pub async fn memory_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.expect("in-memory sqlite");
	run_migrations(&pool).await.expect("migrations");
	pool
}
