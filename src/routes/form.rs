/// Multipart form decoding shared by the product and category endpoints.
use axum::extract::{multipart::MultipartRejection, Multipart};
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};
use crate::models::product::{ProductFields, UploadedFile};

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(|e| ApiError::validation(format!("Invalid form data: {e}")))?;
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid form data: {e}")))?;

            match file_name {
                // An empty file input still submits a nameless, empty part.
                Some(file_name) if file_name.is_empty() && bytes.is_empty() => {}
                Some(file_name) => form.files.push((name, UploadedFile { file_name, bytes: bytes.to_vec() })),
                None => {
                    let value = String::from_utf8(bytes.to_vec())
                        .map_err(|_| ApiError::validation(format!("Field {name} is not valid text")))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Trimmed value, `None` when missing or blank.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        matching.into_iter().map(|(_, file)| file).collect()
    }

    /// A JSON array of strings; missing or blank means empty.
    pub fn url_list(&self, name: &str) -> ApiResult<Vec<String>> {
        match self.non_blank(name) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|_| ApiError::validation(format!("Invalid {name}"))),
        }
    }

    /// Scalar product fields; `category_key` names the category id field
    /// (`categoryId` on create, `category` on edit).
    pub fn product_fields(&self, category_key: &str) -> ApiResult<ProductFields> {
        let category_id = self
            .non_blank(category_key)
            .ok_or_else(|| ApiError::validation("Category ID is required"))?
            .parse::<i64>()
            .map_err(|_| ApiError::validation("Invalid Category ID"))?;

        let name = self
            .non_blank("name")
            .ok_or_else(|| ApiError::validation("Name is required"))?
            .to_string();

        let price = self
            .non_blank("price")
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| ApiError::validation("Invalid price"))?;

        let stock = self
            .non_blank("stock")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|s| *s >= 0)
            .ok_or_else(|| ApiError::validation("Invalid stock"))?;

        let description = self.text("description").unwrap_or_default().trim().to_string();

        Ok(ProductFields { name, price, description, stock, category_id })
    }
}
