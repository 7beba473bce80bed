use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_backend::config::Config;
use catalog_backend::db::connection::create_pool;
use catalog_backend::routes::app;
use catalog_backend::state::AppState;

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        tenant_db_dir = %config.tenant_db_dir.display(),
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_minutes = config.jwt_expiration_minutes,
        refresh_token_expiration_days = config.refresh_token_expiration_days,
        tenant_pool_max_connections = config.tenant_pool_max_connections,
        "Loaded configuration from environment/.env"
    );

    // Initialize the shared database
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::new(pool, config);

    // Periodically release pools for tenants that have gone quiet, so the
    // number of open database files stays bounded.
    let pools = state.pools.clone();
    let idle_sweep = Duration::from_secs(state.config.tenant_pool_idle_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(idle_sweep);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = pools.evict_idle().await;
            if evicted > 0 {
                tracing::debug!(evicted, "evicted idle tenant pools");
            }
        }
    });

    let app = app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
