//! Catalog queries. Every function runs on a tenant connection handed out
//! by the routing layer; none of them can name a database themselves.

use sqlx::SqliteConnection;

use crate::models::product::{Product, ProductImage};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, cost_price, sku, quantity, \
     status, is_featured, created_by, updated_by, created_at, updated_at";
const IMAGE_COLUMNS: &str = "id, product_id, image, alt_text, is_primary, sort_order, created_at";

pub async fn list_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM products ORDER BY created_at DESC",
        PRODUCT_COLUMNS
    );
    sqlx::query_as::<_, Product>(&query).fetch_all(conn).await
}

pub async fn find_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    sqlx::query_as::<_, Product>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn slug_exists(
    conn: &mut SqliteConnection,
    slug: &str,
    exclude_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = match exclude_id {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE slug = $1 AND id != $2")
                .bind(slug)
                .bind(id)
                .fetch_one(conn)
                .await?
        }
        None => sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE slug = $1")
            .bind(slug)
            .fetch_one(conn)
            .await?,
    };
    Ok(count > 0)
}

pub async fn insert_product(
    conn: &mut SqliteConnection,
    product: &Product,
) -> Result<(), sqlx::Error> {
    let query = format!(
        "INSERT INTO products ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        PRODUCT_COLUMNS
    );
    sqlx::query(&query)
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.cost_price)
        .bind(&product.sku)
        .bind(product.quantity)
        .bind(product.status)
        .bind(product.is_featured)
        .bind(&product.created_by)
        .bind(&product.updated_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(conn)
        .await
        .map(|_| ())
}

pub async fn update_product(
    conn: &mut SqliteConnection,
    product: &Product,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products SET name = $2, slug = $3, description = $4, price = $5, \
         cost_price = $6, sku = $7, quantity = $8, status = $9, is_featured = $10, \
         updated_by = $11, updated_at = $12 WHERE id = $1",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.cost_price)
    .bind(&product.sku)
    .bind(product.quantity)
    .bind(product.status)
    .bind(product.is_featured)
    .bind(&product.updated_by)
    .bind(product.updated_at)
    .execute(conn)
    .await
    .map(|_| ())
}

pub async fn delete_product(conn: &mut SqliteConnection, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_images(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> Result<Vec<ProductImage>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM product_images WHERE product_id = $1 \
         ORDER BY sort_order ASC, created_at DESC",
        IMAGE_COLUMNS
    );
    sqlx::query_as::<_, ProductImage>(&query)
        .bind(product_id)
        .fetch_all(conn)
        .await
}

pub async fn find_image(
    conn: &mut SqliteConnection,
    product_id: &str,
    image_id: &str,
) -> Result<Option<ProductImage>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM product_images WHERE product_id = $1 AND id = $2",
        IMAGE_COLUMNS
    );
    sqlx::query_as::<_, ProductImage>(&query)
        .bind(product_id)
        .bind(image_id)
        .fetch_optional(conn)
        .await
}

pub async fn has_images(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_images WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

pub async fn insert_image(
    conn: &mut SqliteConnection,
    image: &ProductImage,
) -> Result<(), sqlx::Error> {
    let query = format!(
        "INSERT INTO product_images ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        IMAGE_COLUMNS
    );
    sqlx::query(&query)
        .bind(&image.id)
        .bind(&image.product_id)
        .bind(&image.image)
        .bind(&image.alt_text)
        .bind(image.is_primary)
        .bind(image.sort_order)
        .bind(image.created_at)
        .execute(conn)
        .await
        .map(|_| ())
}

pub async fn delete_image(
    conn: &mut SqliteConnection,
    product_id: &str,
    image_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM product_images WHERE product_id = $1 AND id = $2")
        .bind(product_id)
        .bind(image_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Marks one image primary and clears the flag on its siblings.
pub async fn set_primary_image(
    conn: &mut SqliteConnection,
    product_id: &str,
    image_id: &str,
) -> Result<u64, sqlx::Error> {
    sqlx::query("UPDATE product_images SET is_primary = FALSE WHERE product_id = $1 AND id != $2")
        .bind(product_id)
        .bind(image_id)
        .execute(&mut *conn)
        .await?;
    let result =
        sqlx::query("UPDATE product_images SET is_primary = TRUE WHERE product_id = $1 AND id = $2")
            .bind(product_id)
            .bind(image_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}
