mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use catalog_backend::models::user::UserRole;
use support::{register_company, seed_user, send_json, test_env, TEST_PASSWORD};

#[tokio::test]
async fn register_with_new_company_provisions_tenant_and_returns_tokens() {
    let env = test_env().await;

    let (status, body) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "founder@acme.test",
            "password": "a-long-password",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "company_name": "Acme Inc",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["company"]["slug"], "acme-inc");
    assert!(env.tenant_db_dir().join("acme-inc_db.sqlite3").exists());
}

#[tokio::test]
async fn register_joining_existing_company_gets_member_role() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;

    let (status, body) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "member@acme.test",
            "password": "a-long-password",
            "first_name": "Max",
            "last_name": "Member",
            "company_id": company.id,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn register_with_duplicate_company_name_conflicts() {
    let env = test_env().await;
    register_company(&env, "Acme").await;

    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "other@acme.test",
            "password": "a-long-password",
            "first_name": "Oda",
            "last_name": "Other",
            "company_name": "Acme",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_without_company_reference_is_rejected() {
    let env = test_env().await;

    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "nobody@example.test",
            "password": "a-long-password",
            "first_name": "No",
            "last_name": "Body",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_validates_payload() {
    let env = test_env().await;

    let (status, body) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "not-an-email",
            "password": "short",
            "first_name": "A",
            "last_name": "B",
            "company_name": "Acme",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn login_refresh_logout_flow() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let user = seed_user(&env, Some(&company), UserRole::User).await;

    let (status, body) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": user.email, "password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().expect("access token").to_string();
    let refresh = body["refresh_token"].as_str().expect("refresh token").to_string();

    let (status, body) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some());

    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/logout",
        Some(&access),
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The revoked refresh token is dead from now on.
    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let user = seed_user(&env, Some(&company), UserRole::User).await;

    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": user.email, "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_against_deactivated_company_is_rejected() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let user = seed_user(&env, Some(&company), UserRole::Admin).await;
    env.state
        .directory
        .deactivate(&company.id)
        .await
        .expect("deactivate");

    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": user.email, "password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_returns_current_user_with_company() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let user = seed_user(&env, Some(&company), UserRole::Manager).await;
    let token = support::access_token_for(&env, &user).await;

    let (status, body) = send_json(
        env.app(),
        Method::GET,
        "/api/auth/profile",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["role"], "manager");
    assert_eq!(body["company"]["id"], company.id.as_str());
}

#[tokio::test]
async fn companies_listing_is_public_and_active_only() {
    let env = test_env().await;
    let acme = register_company(&env, "Acme").await;
    let globex = register_company(&env, "Globex").await;
    env.state
        .directory
        .deactivate(&globex.id)
        .await
        .expect("deactivate");

    let (status, body) = send_json(env.app(), Method::GET, "/api/companies", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let listed: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|c| c["id"].as_str().expect("id"))
        .collect();
    assert!(listed.contains(&acme.id.as_str()));
    assert!(!listed.contains(&globex.id.as_str()));
}
