//! Tenant directory backed by the shared `companies` table.
//!
//! Every authenticated request resolves its tenant through `lookup`, so
//! active records are cached in memory and invalidated on register and
//! deactivate. Inactive or unknown companies are never served from cache.

use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::company::Company;
use crate::repositories::company as company_repo;
use crate::services::provision::provision_tenant_database;
use crate::utils::slug::slugify;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("unknown or inactive tenant")]
    UnknownTenant,
    #[error("a company with a similar name already exists")]
    SlugTaken,
    #[error("company name does not yield a usable slug")]
    InvalidName,
    #[error("tenant database provisioning failed")]
    Provisioning(#[source] anyhow::Error),
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UnknownTenant => AppError::NotFound("Company not found".to_string()),
            DirectoryError::SlugTaken => {
                AppError::Conflict("A company with a similar name already exists".to_string())
            }
            DirectoryError::InvalidName => {
                AppError::BadRequest("Company name is not usable".to_string())
            }
            DirectoryError::Provisioning(err) => AppError::InternalServerError(err),
            DirectoryError::Backend(err) => AppError::InternalServerError(err.into()),
        }
    }
}

pub struct TenantDirectory {
    pool: SqlitePool,
    tenant_db_dir: PathBuf,
    cache: RwLock<HashMap<String, Company>>,
}

impl TenantDirectory {
    pub fn new(pool: SqlitePool, tenant_db_dir: PathBuf) -> Self {
        Self {
            pool,
            tenant_db_dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Absolute location of a company's database file.
    pub fn db_path(&self, company: &Company) -> PathBuf {
        self.tenant_db_dir.join(&company.db_name)
    }

    /// Resolves a tenant id to its active record. Hot path: served from the
    /// in-memory cache when possible. Missing and deactivated companies
    /// both come back as `UnknownTenant`.
    pub async fn lookup(&self, tenant_id: &str) -> Result<Company, DirectoryError> {
        {
            let cache = self.cache.read().await;
            if let Some(company) = cache.get(tenant_id) {
                return Ok(company.clone());
            }
        }

        let company = company_repo::find_by_id(&self.pool, tenant_id).await?;
        match company {
            Some(company) if company.is_active => {
                let mut cache = self.cache.write().await;
                cache.insert(company.id.clone(), company.clone());
                Ok(company)
            }
            _ => {
                // A stale cache entry for a record deactivated elsewhere
                // must not outlive this negative lookup.
                self.cache.write().await.remove(tenant_id);
                Err(DirectoryError::UnknownTenant)
            }
        }
    }

    /// Off the hot path: used at registration and company listings.
    pub async fn lookup_by_slug(&self, slug: &str) -> Result<Company, DirectoryError> {
        let company = company_repo::find_by_slug(&self.pool, slug).await?;
        match company {
            Some(company) if company.is_active => {
                let mut cache = self.cache.write().await;
                cache.insert(company.id.clone(), company.clone());
                Ok(company)
            }
            _ => Err(DirectoryError::UnknownTenant),
        }
    }

    pub async fn list_active(&self) -> Result<Vec<Company>, DirectoryError> {
        Ok(company_repo::list_active(&self.pool).await?)
    }

    /// Registers a new tenant: derives slug and database descriptor from
    /// the name, provisions the database, then creates the record.
    /// All-or-nothing: a provisioning failure leaves no record, and an
    /// insert failure removes a database file this call created.
    pub async fn register(&self, name: &str, email: &str) -> Result<Company, DirectoryError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(DirectoryError::InvalidName);
        }

        let company = Company::new(name.to_string(), slug, email.to_string());
        if company_repo::slug_or_db_name_exists(&self.pool, &company.slug, &company.db_name).await?
        {
            return Err(DirectoryError::SlugTaken);
        }

        let db_path = self.db_path(&company);
        let created = provision_tenant_database(&db_path)
            .await
            .map_err(DirectoryError::Provisioning)?;

        if let Err(err) = company_repo::insert_company(&self.pool, &company).await {
            if created {
                remove_database_file(&db_path);
            }
            // Two racing registrations can both pass the pre-check; the
            // unique constraints on slug/db_name decide the winner.
            return Err(match &err {
                sqlx::Error::Database(db) if db.is_unique_violation() => DirectoryError::SlugTaken,
                _ => DirectoryError::Backend(err),
            });
        }

        let mut cache = self.cache.write().await;
        cache.insert(company.id.clone(), company.clone());
        tracing::info!(company_id = %company.id, slug = %company.slug, "registered tenant");
        Ok(company)
    }

    /// Soft-deactivates a tenant. New resolutions see the change
    /// immediately; connections already bound to in-flight requests are
    /// left to finish.
    pub async fn deactivate(&self, tenant_id: &str) -> Result<(), DirectoryError> {
        let affected = company_repo::set_active(&self.pool, tenant_id, false).await?;
        if affected == 0 {
            return Err(DirectoryError::UnknownTenant);
        }
        self.cache.write().await.remove(tenant_id);
        tracing::info!(company_id = %tenant_id, "deactivated tenant");
        Ok(())
    }
}

fn remove_database_file(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "failed to remove tenant database after aborted registration"
        );
    }
}
