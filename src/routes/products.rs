/// Product endpoints
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
use crate::models::page::ListQuery;
use crate::models::product::{ProductEdit, ProductView};
use crate::routes::form::FormData;
use crate::services::product_service;
use crate::services::upload_service::UploadStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub product: Vec<ProductView>,
    pub count: i64,
    pub page: u32,
    pub total_pages: i64,
}

/// GET /api/products?page&perPage&search
pub async fn list_products(
    State(pool): State<SqlitePool>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<ProductPage>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let page = query.page_request().map_err(ApiError::validation)?;

    let (product, count) = product_service::list_products(&pool, page, query.search_term())
        .await
        .or_fail("Failed to fetch products")?;

    Ok(Json(ProductPage {
        product,
        count,
        page: page.page,
        total_pages: page.total_pages(count),
    }))
}

/// GET /api/products/:id
pub async fn get_product(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProductView>> {
    let id = product_id(id)?;
    product_service::get_product(&pool, id)
        .await
        .and_then(|p| p.ok_or_else(|| anyhow::anyhow!("product {id} not found")))
        .or_fail("Failed to fetch product")
        .map(Json)
}

/// POST /api/products (multipart: name, price, description, stock, categoryId, files[])
pub async fn create_product(
    State(pool): State<SqlitePool>,
    State(store): State<UploadStore>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let fields = form.product_fields("categoryId")?;
    let files = form.take_files("files[]");

    let urls = store.save_all(&files).await.or_fail("Failed to create product")?;

    match product_service::create_product(&pool, &fields, &urls).await {
        Ok(product) => Ok((StatusCode::CREATED, Json(product))),
        Err(e) => {
            if !urls.is_empty() {
                tracing::warn!(orphaned = ?urls, "uploads left without a product row");
            }
            Err(ApiError::failed("Failed to create product", e))
        }
    }
}

/// PUT /api/products/:id (multipart: name, price, description, stock,
/// category, existingImages, deletedImages, newImages[])
pub async fn update_product(
    State(pool): State<SqlitePool>,
    State(store): State<UploadStore>,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ProductView>> {
    let id = product_id(id)?;
    let mut form = FormData::read(multipart).await?;
    let edit = ProductEdit {
        fields: form.product_fields("category")?,
        existing_images: form.url_list("existingImages")?,
        deleted_images: form.url_list("deletedImages")?,
        new_images: form.take_files("newImages[]"),
    };

    product_service::update_product(&pool, &store, id, &edit)
        .await
        .or_fail("Failed to update product")
        .map(Json)
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(pool): State<SqlitePool>,
    State(store): State<UploadStore>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProductView>> {
    let id = product_id(id)?;
    product_service::delete_product(&pool, &store, id)
        .await
        .or_fail("Failed to delete product")
        .map(Json)
}

fn product_id(id: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::validation("Invalid product ID"))
}
