/// Category endpoints
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{ApiError, ApiResult, OrFail};
use crate::forms::validate_category;
use crate::models::category::{Category, CategoryFields};
use crate::models::page::ListQuery;
use crate::routes::form::FormData;
use crate::services::category_service;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    pub category: Vec<Category>,
    pub count: i64,
    pub page: u32,
    pub total_pages: i64,
}

/// GET /api/category?page&perPage&search
pub async fn list_categories(
    State(pool): State<SqlitePool>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<CategoryPage>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let page = query.page_request().map_err(ApiError::validation)?;

    let (category, count) = category_service::list_categories(&pool, page, query.search_term())
        .await
        .or_fail("Failed to fetch categories")?;

    Ok(Json(CategoryPage {
        category,
        count,
        page: page.page,
        total_pages: page.total_pages(count),
    }))
}

/// GET /api/category/:id
pub async fn get_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Category>> {
    let id = category_id(id)?;
    category_service::get_category(&pool, id)
        .await
        .and_then(|c| c.ok_or_else(|| anyhow::anyhow!("category {id} not found")))
        .or_fail("Failed to fetch category")
        .map(Json)
}

/// POST /api/category (multipart: name, iconName)
pub async fn create_category(
    State(pool): State<SqlitePool>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let fields = category_fields(FormData::read(multipart).await?)?;
    let category = category_service::create_category(&pool, &fields)
        .await
        .or_fail("Failed to create category")?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "category": category })),
    ))
}

/// PUT /api/category/:id (multipart: name, iconName)
pub async fn update_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Category>> {
    let id = category_id(id)?;
    let fields = category_fields(FormData::read(multipart).await?)?;
    category_service::update_category(&pool, id, &fields)
        .await
        .or_fail("Failed to update category")
        .map(Json)
}

/// DELETE /api/category/:id
pub async fn delete_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Category>> {
    let id = category_id(id)?;
    category_service::delete_category(&pool, id)
        .await
        .or_fail("Failed to delete category")
        .map(Json)
}

/// The slug is always derived from the name; a submitted `slug` is ignored.
fn category_fields(form: FormData) -> ApiResult<CategoryFields> {
    let name = form.text("name").unwrap_or_default().trim();
    let icon_name = form.text("iconName").unwrap_or_default().trim();
    validate_category(name, icon_name).map_err(ApiError::validation)?;
    Ok(CategoryFields { name: name.to_string(), icon_name: icon_name.to_string() })
}

fn category_id(id: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::validation("Invalid category ID"))
}
