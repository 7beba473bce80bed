mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use catalog_backend::models::user::UserRole;
use support::{
    access_token_for, register_company, seed_superuser, seed_user, send_json, test_env,
    wait_until_all_idle,
};

#[tokio::test]
async fn product_lives_only_in_its_tenant_catalog() {
    let env = test_env().await;
    let acme = register_company(&env, "Acme").await;
    let globex = register_company(&env, "Globex").await;
    let acme_manager = seed_user(&env, Some(&acme), UserRole::Manager).await;
    let globex_member = seed_user(&env, Some(&globex), UserRole::User).await;

    let acme_token = access_token_for(&env, &acme_manager).await;
    let (status, created) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&acme_token),
        Some(json!({"name": "Rocket Skates", "price": 49.5, "status": "active"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "rocket-skates");

    // Acme sees it.
    let (status, body) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&acme_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);

    // Globex does not.
    let globex_token = access_token_for(&env, &globex_member).await;
    let (status, body) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&globex_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn product_writes_require_manager_role() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let member = seed_user(&env, Some(&company), UserRole::User).await;
    let token = access_token_for(&env, &member).await;

    let (status, body) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({"name": "Nope"})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Reads still work for plain members.
    let (status, _) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn requests_without_token_are_unauthenticated() {
    let env = test_env().await;
    let (status, body) = send_json(env.app(), Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn deactivation_is_honored_on_the_next_request() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let admin = seed_user(&env, Some(&company), UserRole::Admin).await;
    let superuser = seed_superuser(&env).await;

    let member_token = access_token_for(&env, &admin).await;
    let (status, _) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let super_token = access_token_for(&env, &superuser).await;
    let (status, _) = send_json(
        env.app(),
        Method::POST,
        &format!("/api/companies/{}/deactivate", company.id),
        Some(&super_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Same still-valid token, next request: rejected at resolution.
    let (status, _) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivate_requires_platform_operator() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let admin = seed_user(&env, Some(&company), UserRole::Admin).await;
    let token = access_token_for(&env, &admin).await;

    let (status, _) = send_json(
        env.app(),
        Method::POST,
        &format!("/api/companies/{}/deactivate", company.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn connection_released_after_success_and_failure_alike() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let manager = seed_user(&env, Some(&company), UserRole::Manager).await;
    let token = access_token_for(&env, &manager).await;

    // Success path.
    let (status, _) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (size, idle) = wait_until_all_idle(&env, &company.id).await;
    assert_eq!(size as usize, idle);

    // Failure paths: validation error and missing resource. The handler
    // fails, the connection still goes back.
    let (status, _) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({"name": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        env.app(),
        Method::GET,
        "/api/products/no-such-id",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (size, idle) = wait_until_all_idle(&env, &company.id).await;
    assert_eq!(size as usize, idle);
}

#[tokio::test]
async fn product_update_and_delete_roundtrip() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let manager = seed_user(&env, Some(&company), UserRole::Manager).await;
    let token = access_token_for(&env, &manager).await;

    let (_, created) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({"name": "Widget", "price": 10.0})),
    )
    .await;
    let product_id = created["id"].as_str().expect("id").to_string();

    let (status, updated) = send_json(
        env.app(),
        Method::PUT,
        &format!("/api/products/{}", product_id),
        Some(&token),
        Some(json!({"price": 12.5, "status": "active", "quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 12.5);
    assert_eq!(updated["status"], "active");
    assert_eq!(updated["quantity"], 3);
    assert_eq!(updated["updated_by"], manager.id.as_str());

    let (status, _) = send_json(
        env.app(),
        Method::DELETE,
        &format!("/api/products/{}", product_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(
        env.app(),
        Method::GET,
        &format!("/api/products/{}", product_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_product_names_get_distinct_slugs() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let manager = seed_user(&env, Some(&company), UserRole::Manager).await;
    let token = access_token_for(&env, &manager).await;

    let (_, first) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({"name": "Widget"})),
    )
    .await;
    let (_, second) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({"name": "Widget"})),
    )
    .await;

    assert_eq!(first["slug"], "widget");
    assert_eq!(second["slug"], "widget-1");
}

#[tokio::test]
async fn first_image_becomes_primary_and_primary_can_move() {
    let env = test_env().await;
    let company = register_company(&env, "Acme").await;
    let manager = seed_user(&env, Some(&company), UserRole::Manager).await;
    let token = access_token_for(&env, &manager).await;

    let (_, product) = send_json(
        env.app(),
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({"name": "Widget"})),
    )
    .await;
    let product_id = product["id"].as_str().expect("id").to_string();

    let (status, first) = send_json(
        env.app(),
        Method::POST,
        &format!("/api/products/{}/images", product_id),
        Some(&token),
        Some(json!({"image": "products/widget/front.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["is_primary"], true);

    let (_, second) = send_json(
        env.app(),
        Method::POST,
        &format!("/api/products/{}/images", product_id),
        Some(&token),
        Some(json!({"image": "products/widget/back.jpg", "sort_order": 1})),
    )
    .await;
    assert_eq!(second["is_primary"], false);

    let second_id = second["id"].as_str().expect("id").to_string();
    let (status, promoted) = send_json(
        env.app(),
        Method::PUT,
        &format!("/api/products/{}/images/{}/primary", product_id, second_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["is_primary"], true);

    // Exactly one primary image remains.
    let (_, images) = send_json(
        env.app(),
        Method::GET,
        &format!("/api/products/{}/images", product_id),
        Some(&token),
        None,
    )
    .await;
    let primaries = images
        .as_array()
        .expect("array")
        .iter()
        .filter(|img| img["is_primary"] == true)
        .count();
    assert_eq!(primaries, 1);
}

#[tokio::test]
async fn superuser_without_tenant_cannot_reach_product_routes() {
    let env = test_env().await;
    let superuser = seed_superuser(&env).await;
    let token = access_token_for(&env, &superuser).await;

    let (status, _) = send_json(
        env.app(),
        Method::GET,
        "/api/products",
        Some(&token),
        None,
    )
    .await;
    // Resolves to the shared target; the tenant capability is absent.
    assert_eq!(status, StatusCode::FORBIDDEN);
}
