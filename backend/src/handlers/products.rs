//! Product and product-image CRUD. Plain data access: every query runs on
//! the tenant connection bound to the request context, so these handlers
//! cannot reach any other company's catalog. Reads are open to all company
//! members; writes sit behind the manager guard in the router.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::error::AppError;
use crate::models::product::{
    CreateProductImageRequest, CreateProductRequest, Product, ProductDetailResponse, ProductImage,
    UpdateProductRequest,
};
use crate::repositories::product as product_repo;
use crate::services::resolver::RequestContext;
use crate::state::AppState;
use crate::utils::slug::slugify;

pub async fn list_products(
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<Product>>, AppError> {
    let mut conn = ctx.db().tenant().await?;
    let products = product_repo::list_products(&mut conn).await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(_state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload.validate()?;

    let mut conn = ctx.db().tenant().await?;
    let slug = unique_slug(&mut conn, &payload.name, None).await?;

    let mut product = Product::new(payload.name, slug, Some(ctx.user.id.clone()));
    product.description = payload.description;
    product.price = payload.price.unwrap_or(0.0);
    product.cost_price = payload.cost_price;
    product.sku = payload.sku;
    product.quantity = payload.quantity.unwrap_or(0);
    if let Some(status) = payload.status {
        product.status = status;
    }
    product.is_featured = payload.is_featured.unwrap_or(false);

    product_repo::insert_product(&mut conn, &product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    Extension(ctx): Extension<RequestContext>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let mut conn = ctx.db().tenant().await?;
    let product = product_repo::find_product(&mut conn, &product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    let images = product_repo::list_images(&mut conn, &product_id).await?;
    Ok(Json(ProductDetailResponse { product, images }))
}

pub async fn update_product(
    Extension(ctx): Extension<RequestContext>,
    Path(product_id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;

    let mut conn = ctx.db().tenant().await?;
    let mut product = product_repo::find_product(&mut conn, &product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if let Some(name) = payload.name {
        product.name = name;
    }
    if let Some(description) = payload.description {
        product.description = Some(description);
    }
    if let Some(price) = payload.price {
        product.price = price;
    }
    if let Some(cost_price) = payload.cost_price {
        product.cost_price = Some(cost_price);
    }
    if let Some(sku) = payload.sku {
        product.sku = Some(sku);
    }
    if let Some(quantity) = payload.quantity {
        product.quantity = quantity;
    }
    if let Some(status) = payload.status {
        product.status = status;
    }
    if let Some(is_featured) = payload.is_featured {
        product.is_featured = is_featured;
    }
    product.updated_by = Some(ctx.user.id.clone());
    product.updated_at = Utc::now();

    product_repo::update_product(&mut conn, &product).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    Extension(ctx): Extension<RequestContext>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut conn = ctx.db().tenant().await?;
    let deleted = product_repo::delete_product(&mut conn, &product_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_images(
    Extension(ctx): Extension<RequestContext>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<ProductImage>>, AppError> {
    let mut conn = ctx.db().tenant().await?;
    ensure_product_exists(&mut conn, &product_id).await?;
    let images = product_repo::list_images(&mut conn, &product_id).await?;
    Ok(Json(images))
}

pub async fn add_image(
    Extension(ctx): Extension<RequestContext>,
    Path(product_id): Path<String>,
    Json(payload): Json<CreateProductImageRequest>,
) -> Result<(StatusCode, Json<ProductImage>), AppError> {
    payload.validate()?;

    let mut conn = ctx.db().tenant().await?;
    ensure_product_exists(&mut conn, &product_id).await?;

    let first_image = !product_repo::has_images(&mut conn, &product_id).await?;
    let mut image = ProductImage::new(product_id.clone(), payload.image);
    image.alt_text = payload.alt_text;
    image.sort_order = payload.sort_order.unwrap_or(0);
    // The first image always becomes primary.
    image.is_primary = first_image || payload.is_primary.unwrap_or(false);

    product_repo::insert_image(&mut conn, &image).await?;
    if image.is_primary {
        product_repo::set_primary_image(&mut conn, &product_id, &image.id).await?;
    }

    Ok((StatusCode::CREATED, Json(image)))
}

pub async fn delete_image(
    Extension(ctx): Extension<RequestContext>,
    Path((product_id, image_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let mut conn = ctx.db().tenant().await?;
    let deleted = product_repo::delete_image(&mut conn, &product_id, &image_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Image not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_primary_image(
    Extension(ctx): Extension<RequestContext>,
    Path((product_id, image_id)): Path<(String, String)>,
) -> Result<Json<ProductImage>, AppError> {
    let mut conn = ctx.db().tenant().await?;
    product_repo::find_image(&mut conn, &product_id, &image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    product_repo::set_primary_image(&mut conn, &product_id, &image_id).await?;
    let image = product_repo::find_image(&mut conn, &product_id, &image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    Ok(Json(image))
}

async fn ensure_product_exists(
    conn: &mut sqlx::SqliteConnection,
    product_id: &str,
) -> Result<(), AppError> {
    product_repo::find_product(conn, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(())
}

/// Slugifies the name and appends a counter until the slug is free within
/// this tenant's catalog.
async fn unique_slug(
    conn: &mut sqlx::SqliteConnection,
    name: &str,
    exclude_id: Option<&str>,
) -> Result<String, AppError> {
    let base = {
        let slug = slugify(name);
        if slug.is_empty() {
            "product".to_string()
        } else {
            slug
        }
    };

    let mut candidate = base.clone();
    let mut counter = 1;
    while product_repo::slug_exists(conn, &candidate, exclude_id).await? {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
    Ok(candidate)
}
