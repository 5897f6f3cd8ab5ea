use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;

use crate::services::upload_service::UploadStore;

pub mod category;
pub mod form;
pub mod products;
pub mod register;

/// JSON api under `/api`.
pub fn api_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    SqlitePool: axum::extract::FromRef<S>,
    UploadStore: axum::extract::FromRef<S>,
{
    Router::new()
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/category",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/api/category/:id",
            get(category::get_category)
                .put(category::update_category)
                .delete(category::delete_category),
        )
        .route("/api/register", post(register::register))
}
