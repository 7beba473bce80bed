//! Per-tenant connection pools.
//!
//! Every company owns a physically separate SQLite database. This module
//! keeps one bounded sqlx pool per company, created lazily on first access
//! and evicted again once a tenant has been idle long enough. Pools are
//! keyed strictly by company id: a handle checked out here can only ever
//! reach the database of the company it was acquired for.

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Sqlite;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;
use crate::models::company::Company;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The directory record points at a database file that does not exist.
    #[error("tenant database has not been provisioned")]
    Unprovisioned,
    /// All connections for this tenant were busy past the acquire timeout.
    #[error("tenant connection pool exhausted")]
    Exhausted,
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted => {
                AppError::ServiceUnavailable("Tenant database is busy, retry later".to_string())
            }
            PoolError::Unprovisioned => {
                tracing::error!("active tenant record without a provisioned database");
                AppError::ServiceUnavailable("Tenant database unavailable".to_string())
            }
            PoolError::Backend(err) => AppError::InternalServerError(err.into()),
        }
    }
}

/// A live handle to one tenant's database, checked out of that tenant's
/// pool. Returns to the pool when dropped, on every exit path.
pub struct TenantConnection {
    company_id: String,
    conn: PoolConnection<Sqlite>,
}

impl TenantConnection {
    /// Id of the company whose pool this handle was acquired from.
    pub fn company_id(&self) -> &str {
        &self.company_id
    }
}

impl Deref for TenantConnection {
    type Target = sqlx::SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for TenantConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

struct PoolEntry {
    pool: SqlitePool,
    last_used: StdMutex<Instant>,
}

impl PoolEntry {
    fn touch(&self) {
        if let Ok(mut stamp) = self.last_used.lock() {
            *stamp = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .map(|stamp| stamp.elapsed())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub tenant_db_dir: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_ttl: Duration,
}

impl From<&Config> for PoolSettings {
    fn from(config: &Config) -> Self {
        Self {
            tenant_db_dir: config.tenant_db_dir.clone(),
            max_connections: config.tenant_pool_max_connections,
            acquire_timeout: Duration::from_secs(config.tenant_pool_acquire_timeout_secs),
            idle_ttl: Duration::from_secs(config.tenant_pool_idle_secs),
        }
    }
}

pub struct TenantPools {
    settings: PoolSettings,
    pools: RwLock<HashMap<String, PoolEntry>>,
}

impl TenantPools {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            settings,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Checks a connection out of the company's pool, creating the pool on
    /// first access. Creation is double-checked under the write lock so
    /// concurrent first requests for the same company share a single pool.
    pub async fn acquire(&self, company: &Company) -> Result<TenantConnection, PoolError> {
        let path = self.settings.tenant_db_dir.join(&company.db_name);
        if !path.exists() {
            return Err(PoolError::Unprovisioned);
        }

        // One retry in case an idle sweep closed the pool between the map
        // read and the checkout.
        for _ in 0..2 {
            let pool = self.pool_for(&company.id, &path).await?;
            match pool.acquire().await {
                Ok(conn) => {
                    return Ok(TenantConnection {
                        company_id: company.id.clone(),
                        conn,
                    })
                }
                Err(sqlx::Error::PoolTimedOut) => return Err(PoolError::Exhausted),
                Err(sqlx::Error::PoolClosed) => {
                    self.remove_closed(&company.id).await;
                    continue;
                }
                Err(err) => return Err(PoolError::Backend(err)),
            }
        }
        Err(PoolError::Exhausted)
    }

    async fn pool_for(&self, company_id: &str, path: &Path) -> Result<SqlitePool, PoolError> {
        {
            let pools = self.pools.read().await;
            if let Some(entry) = pools.get(company_id) {
                entry.touch();
                return Ok(entry.pool.clone());
            }
        }

        let mut pools = self.pools.write().await;
        if let Some(entry) = pools.get(company_id) {
            entry.touch();
            return Ok(entry.pool.clone());
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // connect_lazy keeps the critical section free of awaits; the first
        // checkout pays the connect cost instead.
        let pool = SqlitePoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.acquire_timeout)
            .idle_timeout(self.settings.idle_ttl)
            .connect_lazy_with(options);

        tracing::debug!(company_id, "created tenant connection pool");
        pools.insert(
            company_id.to_string(),
            PoolEntry {
                pool: pool.clone(),
                last_used: StdMutex::new(Instant::now()),
            },
        );

        Ok(pool)
    }

    async fn remove_closed(&self, company_id: &str) {
        let mut pools = self.pools.write().await;
        if let Some(entry) = pools.get(company_id) {
            if entry.pool.is_closed() {
                pools.remove(company_id);
            }
        }
    }

    /// Number of live per-tenant pools.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    /// (total, idle) connection counts for one tenant's pool, if it exists.
    pub async fn pool_stats(&self, company_id: &str) -> Option<(u32, usize)> {
        let pools = self.pools.read().await;
        pools
            .get(company_id)
            .map(|entry| (entry.pool.size(), entry.pool.num_idle()))
    }

    /// Closes and removes pools that have been idle past the configured TTL
    /// and have no checked-out handles. Bounds open file descriptors when
    /// the tenant population is large. Returns how many pools were evicted.
    pub async fn evict_idle(&self) -> usize {
        let mut evicted = Vec::new();
        {
            let mut pools = self.pools.write().await;
            let idle_ttl = self.settings.idle_ttl;
            let expired: Vec<String> = pools
                .iter()
                .filter(|(_, entry)| {
                    entry.idle_for() >= idle_ttl
                        && entry.pool.num_idle() == entry.pool.size() as usize
                })
                .map(|(id, _)| id.clone())
                .collect();
            for id in expired {
                if let Some(entry) = pools.remove(&id) {
                    tracing::debug!(company_id = %id, "evicting idle tenant pool");
                    evicted.push(entry.pool);
                }
            }
        }
        let count = evicted.len();
        for pool in evicted {
            pool.close().await;
        }
        count
    }

    /// Closes every pool. Used on shutdown.
    pub async fn close_all(&self) {
        let entries: Vec<SqlitePool> = {
            let mut pools = self.pools.write().await;
            pools.drain().map(|(_, entry)| entry.pool).collect()
        };
        for pool in entries {
            pool.close().await;
        }
    }
}
