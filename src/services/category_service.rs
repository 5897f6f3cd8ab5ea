/// Category persistence
use crate::db::now_epoch;
use crate::models::category::{Category, CategoryFields};
use crate::models::page::{fold_case, like_pattern, PageRequest};
use anyhow::Result;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, slug, icon_name, created_at, updated_at";

/// One page of categories whose name contains `search`, plus the total match count.
pub async fn list_categories(
    pool: &SqlitePool,
    page: PageRequest,
    search: &str,
) -> Result<(Vec<Category>, i64)> {
    let pattern = like_pattern(search);

    let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM categories WHERE name_folded LIKE ? ESCAPE '\'")
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

    let sql = format!(
        r"SELECT {COLUMNS} FROM categories WHERE name_folded LIKE ? ESCAPE '\' ORDER BY id LIMIT ? OFFSET ?"
    );
    let categories = sqlx::query_as::<_, Category>(&sql)
        .bind(&pattern)
        .bind(i64::from(page.per_page))
        .bind(i64::from(page.offset().unwrap_or(0)))
        .fetch_all(pool)
        .await?;

    Ok((categories, count))
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM categories WHERE id = ?");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

pub async fn create_category(pool: &SqlitePool, fields: &CategoryFields) -> Result<Category> {
    let now = now_epoch();
    let sql = format!(
        "INSERT INTO categories (name, name_folded, slug, icon_name, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(&fields.name)
        .bind(fold_case(&fields.name))
        .bind(fields.slug())
        .bind(&fields.icon_name)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
    tracing::info!(id = category.id, slug = %category.slug, "category created");
    Ok(category)
}

pub async fn update_category(pool: &SqlitePool, id: i64, fields: &CategoryFields) -> Result<Category> {
    let sql = format!(
        "UPDATE categories SET name = ?, name_folded = ?, slug = ?, icon_name = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(&fields.name)
        .bind(fold_case(&fields.name))
        .bind(fields.slug())
        .bind(&fields.icon_name)
        .bind(now_epoch())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("category {id} not found"))?;
    Ok(category)
}

/// Deletes a category. Fails while products still reference it.
pub async fn delete_category(pool: &SqlitePool, id: i64) -> Result<Category> {
    let sql = format!("DELETE FROM categories WHERE id = ? RETURNING {COLUMNS}");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("category {id} not found"))?;
    tracing::info!(id, "category deleted");
    Ok(category)
}
