use serde::Serialize;
use sqlx::FromRow;

use super::category::Category;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: i64,
    pub url: String,
    pub product_id: i64,
}

/// Product row joined with its (optional) category columns.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
    pub category_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub category_icon_name: Option<String>,
    pub category_created_at: Option<i64>,
    pub category_updated_at: Option<i64>,
}

/// A product as returned by the API: scalars, category and images.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
    pub category_id: i64,
    pub category: Option<Category>,
    pub images: Vec<ProductImage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProductView {
    pub fn from_row(row: ProductRow, images: Vec<ProductImage>) -> Self {
        let category = match (row.category_name, row.category_slug, row.category_icon_name) {
            (Some(name), Some(slug), Some(icon_name)) => Some(Category {
                id: row.category_id,
                name,
                slug,
                icon_name,
                created_at: row.category_created_at.unwrap_or_default(),
                updated_at: row.category_updated_at.unwrap_or_default(),
            }),
            _ => None,
        };
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            stock: row.stock,
            category_id: row.category_id,
            category,
            images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|img| img.url.clone()).collect()
    }
}

/// Validated scalar fields shared by product create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
    pub category_id: i64,
}

/// One uploaded file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// An edit submission: new scalars plus the image-set delta.
#[derive(Debug, Clone)]
pub struct ProductEdit {
    pub fields: ProductFields,
    /// Urls the editor still shows; informational, the database is authoritative.
    pub existing_images: Vec<String>,
    pub deleted_images: Vec<String>,
    pub new_images: Vec<UploadedFile>,
}
