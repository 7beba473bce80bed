use std::sync::Arc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::db::tenant_pools::{PoolSettings, TenantPools};
use crate::services::directory::TenantDirectory;
use crate::services::resolver::TenantResolver;
use crate::services::token::TokenService;

/// Process-wide singletons. Everything request-scoped lives in
/// `RequestContext`, never here.
#[derive(Clone)]
pub struct AppState {
    pub shared_pool: DbPool,
    pub config: Config,
    pub tokens: Arc<TokenService>,
    pub directory: Arc<TenantDirectory>,
    pub pools: Arc<TenantPools>,
    pub resolver: Arc<TenantResolver>,
}

impl AppState {
    pub fn new(shared_pool: DbPool, config: Config) -> Self {
        let tokens = Arc::new(TokenService::new(shared_pool.clone(), &config));
        let directory = Arc::new(TenantDirectory::new(
            shared_pool.clone(),
            config.tenant_db_dir.clone(),
        ));
        let pools = Arc::new(TenantPools::new(PoolSettings::from(&config)));
        let resolver = Arc::new(TenantResolver::new(
            tokens.clone(),
            directory.clone(),
            pools.clone(),
            shared_pool.clone(),
        ));

        Self {
            shared_pool,
            config,
            tokens,
            directory,
            pools,
            resolver,
        }
    }
}
