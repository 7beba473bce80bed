//! Company records in the shared database.

use sqlx::SqlitePool;

use crate::models::company::Company;

const TABLE_NAME: &str = "companies";
const SELECT_COLUMNS: &str = "id, name, slug, email, db_name, is_active, created_at, updated_at";

pub async fn insert_company(pool: &SqlitePool, company: &Company) -> Result<(), sqlx::Error> {
    let query = format!(
        "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query(&query)
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.email)
        .bind(&company.db_name)
        .bind(company.is_active)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(pool)
        .await
        .map(|_| ())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Company>, sqlx::Error> {
    let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
    sqlx::query_as::<_, Company>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Company>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE slug = $1",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, Company>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Company>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE is_active = TRUE ORDER BY created_at DESC",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, Company>(&query).fetch_all(pool).await
}

pub async fn slug_or_db_name_exists(
    pool: &SqlitePool,
    slug: &str,
    db_name: &str,
) -> Result<bool, sqlx::Error> {
    let query = format!(
        "SELECT COUNT(*) FROM {} WHERE slug = $1 OR db_name = $2",
        TABLE_NAME
    );
    let count: i64 = sqlx::query_scalar(&query)
        .bind(slug)
        .bind(db_name)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn set_active(pool: &SqlitePool, id: &str, active: bool) -> Result<u64, sqlx::Error> {
    let query = format!(
        "UPDATE {} SET is_active = $2, updated_at = $3 WHERE id = $1",
        TABLE_NAME
    );
    let result = sqlx::query(&query)
        .bind(id)
        .bind(active)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_company(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
    sqlx::query(&query).bind(id).execute(pool).await.map(|_| ())
}
