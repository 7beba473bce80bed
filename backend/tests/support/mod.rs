#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use catalog_backend::{
    config::Config,
    db::connection::create_pool,
    models::{company::Company, user::{User, UserRole}},
    repositories::user as user_repo,
    routes::app,
    services::token::{TokenPair, TokenServiceTrait},
    state::AppState,
    utils::password::hash_password,
};

pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// One isolated backend per test: its own shared database and tenant
/// directory inside a temp dir that lives as long as the env.
pub struct TestEnv {
    pub state: AppState,
    dir: TempDir,
}

impl TestEnv {
    pub fn app(&self) -> Router {
        app(self.state.clone())
    }

    pub fn tenant_db_dir(&self) -> &Path {
        &self.state.config.tenant_db_dir
    }
}

pub async fn test_env() -> TestEnv {
    test_env_with(|_| {}).await
}

/// Builds an env after letting the caller tweak the config (pool bounds,
/// timeouts) before anything is constructed from it.
pub async fn test_env_with(adjust: impl FnOnce(&mut Config)) -> TestEnv {
    let dir = tempfile::tempdir().expect("create temp dir");
    let shared_db = dir.path().join("shared.db");

    let mut config = Config {
        database_url: format!("sqlite:{}", shared_db.display()),
        tenant_db_dir: dir.path().join("tenant_databases"),
        jwt_secret: "a_secure_token_that_is_long_enough_123".into(),
        jwt_expiration_minutes: 30,
        refresh_token_expiration_days: 7,
        tenant_pool_max_connections: 5,
        tenant_pool_acquire_timeout_secs: 5,
        tenant_pool_idle_secs: 300,
    };
    adjust(&mut config);

    let pool = create_pool(&config.database_url).await.expect("shared pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run shared migrations");

    TestEnv {
        state: AppState::new(pool, config),
        dir,
    }
}

pub async fn register_company(env: &TestEnv, name: &str) -> Company {
    env.state
        .directory
        .register(name, &format!("ops@{}.test", Uuid::new_v4()))
        .await
        .expect("register company")
}

pub async fn seed_user(env: &TestEnv, company: Option<&Company>, role: UserRole) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hash password");
    let user = User::new(
        format!("user_{}@example.com", Uuid::new_v4()),
        password_hash,
        "Test".into(),
        "User".into(),
        company.map(|c| c.id.clone()),
        role,
    );
    user_repo::insert_user(&env.state.shared_pool, &user)
        .await
        .expect("insert user");
    user
}

pub async fn seed_superuser(env: &TestEnv) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hash password");
    let mut user = User::new(
        format!("root_{}@example.com", Uuid::new_v4()),
        password_hash,
        "Platform".into(),
        "Operator".into(),
        None,
        UserRole::Admin,
    );
    user.is_superuser = true;
    user_repo::insert_user(&env.state.shared_pool, &user)
        .await
        .expect("insert superuser");
    user
}

pub async fn issue_tokens(env: &TestEnv, user: &User) -> TokenPair {
    env.state.tokens.issue(user).await.expect("issue tokens")
}

pub async fn access_token_for(env: &TestEnv, user: &User) -> String {
    issue_tokens(env, user).await.access_token
}

/// Sends one request through the full router and returns status + parsed
/// JSON body (`null` for empty bodies).
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse json body")
    };
    (status, json)
}

/// Connections return to their pool asynchronously after a context drops;
/// polls until the tenant pool reports every connection idle.
pub async fn wait_until_all_idle(env: &TestEnv, company_id: &str) -> (u32, usize) {
    for _ in 0..100 {
        if let Some((size, idle)) = env.state.pools.pool_stats(company_id).await {
            if size as usize == idle {
                return (size, idle);
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    env.state
        .pools
        .pool_stats(company_id)
        .await
        .unwrap_or((0, 0))
}
