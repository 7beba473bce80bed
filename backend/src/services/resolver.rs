//! Per-request tenant resolution.
//!
//! Walks a request from bearer token to a fully bound routing context:
//! verify the token, look the tenant up in the directory, check a
//! connection out of that tenant's pool. The resulting `RequestContext`
//! travels with the request only; there is no ambient "current tenant"
//! anywhere in the process.

use sqlx::{SqliteConnection, SqlitePool};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::tenant_pools::{TenantConnection, TenantPools};
use crate::error::AppError;
use crate::models::company::Company;
use crate::models::user::User;
use crate::repositories::user as user_repo;
use crate::services::directory::{DirectoryError, TenantDirectory};
use crate::services::token::{TokenService, TokenServiceTrait};

/// Exclusive use of the request's bound tenant connection. Handlers hold at
/// most one of these at a time; it unlocks on drop.
pub struct TenantConn(OwnedMutexGuard<TenantConnection>);

impl TenantConn {
    pub fn company_id(&self) -> &str {
        self.0.company_id()
    }
}

impl Deref for TenantConn {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TenantConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The only two database targets a handler can reach: the connection bound
/// to the request's tenant, and the process-wide shared database. Handlers
/// never select a database by name.
#[derive(Clone)]
pub struct RoutedDb {
    tenant: Option<Arc<Mutex<TenantConnection>>>,
    shared: SqlitePool,
}

impl RoutedDb {
    pub fn shared(&self) -> &SqlitePool {
        &self.shared
    }

    /// The connection bound at resolution. Fails for requests that resolved
    /// to the shared database only (tokens without a tenant claim).
    pub async fn tenant(&self) -> Result<TenantConn, AppError> {
        match &self.tenant {
            Some(handle) => Ok(TenantConn(handle.clone().lock_owned().await)),
            None => Err(AppError::Forbidden(
                "No tenant bound to this request".to_string(),
            )),
        }
    }

    pub fn has_tenant(&self) -> bool {
        self.tenant.is_some()
    }
}

/// Request-scoped routing context. Built once per request by the resolver,
/// immutable afterwards; the bound connection returns to its pool when the
/// last clone drops at the end of the request, on every exit path.
#[derive(Clone)]
pub struct RequestContext {
    pub user: User,
    pub company: Option<Company>,
    db: RoutedDb,
}

impl RequestContext {
    pub fn db(&self) -> &RoutedDb {
        &self.db
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.company.as_ref().map(|company| company.id.as_str())
    }
}

pub struct TenantResolver {
    tokens: Arc<TokenService>,
    directory: Arc<TenantDirectory>,
    pools: Arc<TenantPools>,
    shared: SqlitePool,
}

impl TenantResolver {
    pub fn new(
        tokens: Arc<TokenService>,
        directory: Arc<TenantDirectory>,
        pools: Arc<TenantPools>,
        shared: SqlitePool,
    ) -> Self {
        Self {
            tokens,
            directory,
            pools,
            shared,
        }
    }

    /// Verifies the access token, resolves its tenant claim against the
    /// directory (on every request, so deactivation takes effect on the
    /// next call), and binds a connection from the tenant's pool. Tokens
    /// without a tenant claim resolve to the shared database.
    pub async fn resolve(&self, token: &str) -> Result<RequestContext, AppError> {
        let claims = self
            .tokens
            .verify_access(token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        let user = user_repo::find_by_id(&self.shared, &claims.sub)
            .await
            .map_err(|err| AppError::InternalServerError(err.into()))?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        let Some(tenant_id) = claims.tenant_id.as_deref() else {
            return Ok(RequestContext {
                user,
                company: None,
                db: RoutedDb {
                    tenant: None,
                    shared: self.shared.clone(),
                },
            });
        };

        // Unknown and inactive tenants fold into 401 so responses cannot be
        // used to enumerate tenants.
        let company = self.directory.lookup(tenant_id).await.map_err(|err| match err {
            DirectoryError::UnknownTenant => {
                tracing::warn!(tenant_id, "token references unknown or inactive tenant");
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            other => other.into(),
        })?;

        let conn = self.pools.acquire(&company).await?;
        debug_assert_eq!(conn.company_id(), company.id);

        Ok(RequestContext {
            user,
            company: Some(company),
            db: RoutedDb {
                tenant: Some(Arc::new(Mutex::new(conn))),
                shared: self.shared.clone(),
            },
        })
    }
}
