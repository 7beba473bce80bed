use catalog_backend::{
    config::Config, db::connection::create_pool, services::token::TokenService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let tokens = TokenService::new(pool.clone(), &config);
    let (outstanding, blacklisted) = tokens
        .purge_expired()
        .await
        .expect("cleanup expired tokens");

    if outstanding > 0 {
        tracing::info!("Deleted {} expired outstanding tokens", outstanding);
    }
    if blacklisted > 0 {
        tracing::info!("Deleted {} expired blacklist entries", blacklisted);
    }

    sqlx::query("VACUUM").execute(&pool).await?;

    Ok(())
}
