//! # Database Migrations
//!
//! Schema migrations, embedded at compile time so the server binary carries
//! its own schema and never reads SQL off disk at runtime.
//!
//! ## Adding a Migration
//!
//! 1. Add `migrations/sqlite/NNN_description.sql` with the next number
//!    (e.g. `002_add_approval_requests.sql`)
//! 2. Use `IF NOT EXISTS` where possible
//! 3. Never edit an applied migration; sqlx checksums them and will refuse
//!    to start against a database whose history no longer matches

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// All migrations under `migrations/sqlite/`, embedded by `sqlx::migrate!`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded in `_sqlx_migrations`.
///
/// Idempotent, ordered by filename, one transaction per migration.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;

    info!(
        migrations = MIGRATOR.migrations.len(),
        "Schema is up to date"
    );
    Ok(())
}

/// Migration bookkeeping for diagnostics: `(embedded, applied)` counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
