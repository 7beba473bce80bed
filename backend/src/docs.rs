#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::models::{
    company::CompanyResponse,
    product::{
        CreateProductImageRequest, CreateProductRequest, Product, ProductDetailResponse,
        ProductImage, ProductStatus, UpdateProductRequest,
    },
    user::{
        AccessTokenResponse, LoginRequest, LoginResponse, LogoutRequest, RefreshRequest,
        RegisterRequest, UserResponse,
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        register_doc,
        login_doc,
        refresh_doc,
        logout_doc,
        profile_doc,
        list_companies_doc,
        deactivate_company_doc,
        list_products_doc,
        create_product_doc,
        get_product_doc,
        update_product_doc,
        delete_product_doc,
        add_image_doc,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        RefreshRequest,
        AccessTokenResponse,
        LogoutRequest,
        UserResponse,
        CompanyResponse,
        Product,
        ProductStatus,
        ProductImage,
        ProductDetailResponse,
        CreateProductRequest,
        UpdateProductRequest,
        CreateProductImageRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, and token lifecycle"),
        (name = "companies", description = "Tenant directory"),
        (name = "products", description = "Per-tenant product catalog"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = LoginResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email or company name already taken"),
    )
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token invalid, expired, or revoked"),
    )
)]
fn refresh_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    request_body = LogoutRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Refresh token revoked"),
        (status = 401, description = "Not authenticated"),
    )
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
fn profile_doc() {}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "companies",
    responses(
        (status = 200, description = "Active companies", body = [CompanyResponse]),
    )
)]
fn list_companies_doc() {}

#[utoipa::path(
    post,
    path = "/api/companies/{id}/deactivate",
    tag = "companies",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deactivated"),
        (status = 403, description = "Platform operator access required"),
        (status = 404, description = "Company not found"),
    )
)]
fn deactivate_company_doc() {}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Products of the caller's company", body = [Product]),
        (status = 401, description = "Not authenticated or tenant inactive"),
        (status = 503, description = "Tenant database busy"),
    )
)]
fn list_products_doc() {}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 403, description = "Manager or admin role required"),
    )
)]
fn create_product_doc() {}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with images", body = ProductDetailResponse),
        (status = 404, description = "Product not found"),
    )
)]
fn get_product_doc() {}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Product not found"),
    )
)]
fn update_product_doc() {}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
    )
)]
fn delete_product_doc() {}

#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    tag = "products",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body = CreateProductImageRequest,
    responses(
        (status = 201, description = "Image attached", body = ProductImage),
        (status = 404, description = "Product not found"),
    )
)]
fn add_image_doc() {}
