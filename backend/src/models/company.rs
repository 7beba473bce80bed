//! Company (tenant) records stored in the shared database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// A tenant. Each active company owns one isolated database file named by
/// `db_name`; that descriptor is unique across all companies.
pub struct Company {
    pub id: String,
    pub name: String,
    /// URL-safe unique identifier derived from the name at registration.
    pub slug: String,
    pub email: String,
    /// File name of the company's database inside the tenant directory.
    pub db_name: String,
    /// Soft-deactivation flag. Inactive companies are rejected at tenant
    /// resolution; their data stays on disk.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: String, slug: String, email: String) -> Self {
        let now = Utc::now();
        let db_name = format!("{}_db.sqlite3", slug);
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            email,
            db_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing company representation (listed during registration).
pub struct CompanyResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        CompanyResponse {
            id: company.id,
            name: company.name,
            slug: company.slug,
            is_active: company.is_active,
        }
    }
}
