use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub tenant_db_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: u64,
    pub refresh_token_expiration_days: u64,
    pub tenant_pool_max_connections: u32,
    pub tenant_pool_acquire_timeout_secs: u64,
    pub tenant_pool_idle_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./catalog.db".to_string());

        let tenant_db_dir = env::var("TENANT_DB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./tenant_databases"));

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        let jwt_expiration_minutes = env::var("JWT_EXPIRATION_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let refresh_token_expiration_days = env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7);

        let tenant_pool_max_connections = env::var("TENANT_POOL_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let tenant_pool_acquire_timeout_secs = env::var("TENANT_POOL_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let tenant_pool_idle_secs = env::var("TENANT_POOL_IDLE_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        Ok(Config {
            database_url,
            tenant_db_dir,
            jwt_secret,
            jwt_expiration_minutes,
            refresh_token_expiration_days,
            tenant_pool_max_connections,
            tenant_pool_acquire_timeout_secs,
            tenant_pool_idle_secs,
        })
    }
}
