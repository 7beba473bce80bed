//! Tenant database provisioning.
//!
//! Creates a company's database file and applies the fixed tenant schema.
//! Called from tenant registration only; the routing layer never creates
//! database files.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::time::Duration;

const TENANT_SCHEMA: &str = include_str!("../../tenant_migrations/tenant_schema.sql");

/// Creates and schema-initializes the database file at `path`. Returns
/// `true` when the file was newly created, `false` when it already existed
/// (the schema script is idempotent, so re-running it is harmless). The
/// caller uses the flag to decide whether a failed registration may remove
/// the file again.
pub async fn provision_tenant_database(path: &Path) -> anyhow::Result<bool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let created = !path.exists();
    tracing::info!(path = %path.display(), created, "provisioning tenant database");

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let mut conn = options.connect().await?;
    sqlx::raw_sql(TENANT_SCHEMA).execute(&mut conn).await?;
    conn.close().await?;

    Ok(created)
}
