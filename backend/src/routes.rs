//! Router assembly. Route groups are layered by the access they need:
//! public, any authenticated member, product managers, and platform
//! operators. Tenant resolution happens in the route layers, so no
//! handler below runs without a fully bound routing context.

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::docs::ApiDoc;
use crate::handlers;
use crate::middleware as auth_middleware;
use crate::state::AppState;
use utoipa::OpenApi;

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/companies", get(handlers::companies::list_companies))
        .route(
            "/api/docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    let user_routes = Router::new()
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/products/{id}", get(handlers::products::get_product))
        .route(
            "/api/products/{id}/images",
            get(handlers::products::list_images),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    let manager_routes = Router::new()
        .route("/api/products", post(handlers::products::create_product))
        .route(
            "/api/products/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route(
            "/api/products/{id}/images",
            post(handlers::products::add_image),
        )
        .route(
            "/api/products/{id}/images/{image_id}",
            delete(handlers::products::delete_image),
        )
        .route(
            "/api/products/{id}/images/{image_id}/primary",
            put(handlers::products::set_primary_image),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_manager,
        ));

    let superuser_routes = Router::new()
        .route("/api/companies/{id}", get(handlers::companies::get_company))
        .route(
            "/api/companies/{id}/deactivate",
            post(handlers::companies::deactivate_company),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_superuser,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(manager_routes)
        .merge(superuser_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(auth_middleware::request_id))
                .layer(axum_middleware::from_fn(
                    auth_middleware::log_error_responses,
                ))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
