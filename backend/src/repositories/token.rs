//! Outstanding and blacklisted refresh-token state in the shared database.
//!
//! An outstanding row is written for every issued refresh token; a
//! blacklist row makes logout effective before natural expiry. Both are
//! garbage-collected once their token would have expired anyway.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub async fn insert_outstanding(
    pool: &SqlitePool,
    jti: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO outstanding_tokens (jti, user_id, expires_at, created_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(jti)
    .bind(user_id)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn outstanding_exists(pool: &SqlitePool, jti: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM outstanding_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Idempotent: re-revoking the same jti is a no-op.
pub async fn blacklist(
    pool: &SqlitePool,
    jti: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO blacklisted_tokens (jti, expires_at, blacklisted_at) \
         VALUES ($1, $2, $3) ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn is_blacklisted(pool: &SqlitePool, jti: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM blacklisted_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn delete_expired_outstanding(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM outstanding_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_expired_blacklisted(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
