/// Product persistence and image-set reconciliation
use crate::db::now_epoch;
use crate::models::page::{fold_case, like_pattern, PageRequest};
use crate::models::product::{ProductEdit, ProductFields, ProductImage, ProductRow, ProductView};
use crate::services::upload_service::UploadStore;
use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

const SELECT_PRODUCT: &str = r#"
    SELECT
        p.id, p.name, p.price, p.description, p.stock, p.category_id, p.created_at, p.updated_at,
        c.name AS category_name,
        c.slug AS category_slug,
        c.icon_name AS category_icon_name,
        c.created_at AS category_created_at,
        c.updated_at AS category_updated_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

const SEARCH_FILTER: &str = r"(p.name_folded LIKE ? ESCAPE '\' OR p.description_folded LIKE ? ESCAPE '\')";

/// One page of products whose name or description contains `search`, with
/// the total number of matching products.
pub async fn list_products(
    pool: &SqlitePool,
    page: PageRequest,
    search: &str,
) -> Result<(Vec<ProductView>, i64)> {
    let pattern = like_pattern(search);
    let mut conn = pool.acquire().await?;

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p WHERE {SEARCH_FILTER}"))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&mut *conn)
        .await?;

    let sql = format!("{SELECT_PRODUCT} WHERE {SEARCH_FILTER} ORDER BY p.id LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(i64::from(page.per_page))
        .bind(i64::from(page.offset().unwrap_or(0)))
        .fetch_all(&mut *conn)
        .await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut images = load_images(&mut conn, &ids).await?;
    let products = rows
        .into_iter()
        .map(|row| {
            let imgs = images.remove(&row.id).unwrap_or_default();
            ProductView::from_row(row, imgs)
        })
        .collect();

    Ok((products, count))
}

pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<ProductView>> {
    let mut conn = pool.acquire().await?;
    fetch_view(&mut conn, id).await
}

/// Inserts the product and one image row per url in a single transaction.
pub async fn create_product(pool: &SqlitePool, fields: &ProductFields, image_urls: &[String]) -> Result<ProductView> {
    let now = now_epoch();
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products (name, name_folded, price, description, description_folded, stock, category_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&fields.name)
    .bind(fold_case(&fields.name))
    .bind(fields.price)
    .bind(&fields.description)
    .bind(fold_case(&fields.description))
    .bind(fields.stock)
    .bind(fields.category_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_images(&mut tx, id, image_urls).await?;
    let product = fetch_view(&mut tx, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} vanished during insert"))?;
    tx.commit().await?;

    tracing::info!(id, images = image_urls.len(), "product created");
    Ok(product)
}

/// Applies an edit submission. Order matters under partial failure:
/// deleted rows go first, then their files, then new files are written,
/// and finally scalars and new image rows are committed together. There is
/// no compensation if a later step fails.
pub async fn update_product(
    pool: &SqlitePool,
    store: &UploadStore,
    id: i64,
    edit: &ProductEdit,
) -> Result<ProductView> {
    tracing::debug!(
        id,
        kept = edit.existing_images.len(),
        deleted = edit.deleted_images.len(),
        added = edit.new_images.len(),
        "reconciling product images"
    );

    let removed = delete_image_rows(pool, id, &edit.deleted_images).await?;
    store.discard(&removed).await;

    store.ensure_dir().await?;
    let new_urls = store.save_all(&edit.new_images).await?;

    match commit_update(pool, id, &edit.fields, &new_urls).await {
        Ok(product) => {
            tracing::info!(id, images = product.images.len(), "product updated");
            Ok(product)
        }
        Err(e) => {
            if !new_urls.is_empty() {
                tracing::warn!(id, orphaned = ?new_urls, "uploads left without a product row");
            }
            Err(e)
        }
    }
}

/// Deletes the product (image rows cascade) and then its image files.
pub async fn delete_product(pool: &SqlitePool, store: &UploadStore, id: i64) -> Result<ProductView> {
    let product = {
        let mut conn = pool.acquire().await?;
        let product = fetch_view(&mut conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("product {id} not found"))?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("product {id} not found");
        }
        product
    };

    store.discard(&product.image_urls()).await;
    tracing::info!(id, "product deleted");
    Ok(product)
}

/// Removes the named image rows of one product and returns the urls that
/// were actually removed. Urls belonging to other products are untouched.
async fn delete_image_rows(pool: &SqlitePool, product_id: i64, urls: &[String]) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for url in urls {
        let mut gone: Vec<String> =
            sqlx::query_scalar("DELETE FROM product_images WHERE product_id = ? AND url = ? RETURNING url")
                .bind(product_id)
                .bind(url)
                .fetch_all(pool)
                .await?;
        if gone.is_empty() {
            tracing::warn!(product_id, %url, "deleted image not attached to product");
        }
        removed.append(&mut gone);
    }
    Ok(removed)
}

async fn commit_update(pool: &SqlitePool, id: i64, fields: &ProductFields, new_urls: &[String]) -> Result<ProductView> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE products SET name = ?, name_folded = ?, price = ?, description = ?, description_folded = ?, stock = ?, category_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&fields.name)
    .bind(fold_case(&fields.name))
    .bind(fields.price)
    .bind(&fields.description)
    .bind(fold_case(&fields.description))
    .bind(fields.stock)
    .bind(fields.category_id)
    .bind(now_epoch())
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        anyhow::bail!("product {id} not found");
    }

    insert_images(&mut tx, id, new_urls).await?;
    let product = fetch_view(&mut tx, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} not found"))?;
    tx.commit().await?;
    Ok(product)
}

async fn insert_images(conn: &mut SqliteConnection, product_id: i64, urls: &[String]) -> Result<()> {
    for url in urls {
        sqlx::query("INSERT INTO product_images (url, product_id) VALUES (?, ?)")
            .bind(url)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn fetch_view(conn: &mut SqliteConnection, id: i64) -> Result<Option<ProductView>> {
    let sql = format!("{SELECT_PRODUCT} WHERE p.id = ?");
    let Some(row) = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let images = load_images(conn, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(Some(ProductView::from_row(row, images)))
}

async fn load_images(conn: &mut SqliteConnection, product_ids: &[i64]) -> Result<HashMap<i64, Vec<ProductImage>>> {
    let mut by_product: HashMap<i64, Vec<ProductImage>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(by_product);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, url, product_id FROM product_images WHERE product_id IN (");
    let mut ids = qb.separated(", ");
    for id in product_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY id");

    let images = qb.build_query_as::<ProductImage>().fetch_all(&mut *conn).await?;
    for image in images {
        by_product.entry(image.product_id).or_default().push(image);
    }
    Ok(by_product)
}
