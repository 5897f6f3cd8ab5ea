//! Admin form state for products and categories.
//!
//! Each form keeps the raw text inputs behind setters, tracks the image list
//! an editor sees (existing urls followed by newly attached files), and turns
//! itself into the multipart submission the product and category endpoints
//! accept.

use reqwest::{multipart, Method};

use crate::models::category::{slugify, Category};
use crate::models::product::{ProductView, UploadedFile};

/// Client-side cap on images per product (existing plus new).
pub const MAX_IMAGES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
enum PartValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

/// An ordered multipart/form-data submission. Encoding (boundary, header
/// escaping) is left to reqwest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<(String, PartValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push((name.to_string(), PartValue::Text(value.into())));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.parts.push((
            name.to_string(),
            PartValue::File { file_name: file_name.to_string(), bytes: bytes.into() },
        ));
        self
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|(n, v)| match v {
            PartValue::Text(t) if n == name => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn file_names(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|(n, v)| match v {
                PartValue::File { file_name, .. } if n == name => Some(file_name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn into_multipart(self) -> multipart::Form {
        self.parts.into_iter().fold(multipart::Form::new(), |form, (name, value)| match value {
            PartValue::Text(text) => form.text(name, text),
            PartValue::File { file_name, bytes } => {
                form.part(name, multipart::Part::bytes(bytes).file_name(file_name))
            }
        })
    }

    /// The request a browser submitting this form would send to `url`.
    pub fn into_request(self, client: &reqwest::Client, method: Method, url: &str) -> reqwest::Result<reqwest::Request> {
        client.request(method, url).multipart(self.into_multipart()).build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    name: String,
    price: String,
    description: String,
    stock: String,
    category: String,
    existing_images: Vec<String>,
    deleted_images: Vec<String>,
    new_files: Vec<UploadedFile>,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefills the form from a stored product.
    pub fn edit(product: &ProductView) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            stock: product.stock.to_string(),
            category: product.category_id.to_string(),
            existing_images: product.image_urls(),
            ..Self::default()
        }
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_price(&mut self, value: impl Into<String>) {
        self.price = value.into();
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }

    pub fn set_stock(&mut self, value: impl Into<String>) {
        self.stock = value.into();
    }

    pub fn set_category(&mut self, value: impl Into<String>) {
        self.category = value.into();
    }

    /// Attaches files until the form holds [`MAX_IMAGES`] images; returns
    /// how many were accepted.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = UploadedFile>) -> usize {
        let room = MAX_IMAGES.saturating_sub(self.image_count());
        let before = self.new_files.len();
        self.new_files.extend(files.into_iter().take(room));
        self.new_files.len() - before
    }

    /// Removes the image at `index` of [`Self::previews`]. Removing an
    /// existing image records its url for deletion.
    pub fn remove_image(&mut self, index: usize) -> bool {
        let existing = self.existing_images.len();
        if index < existing {
            let url = self.existing_images.remove(index);
            self.deleted_images.push(url);
            true
        } else if index - existing < self.new_files.len() {
            self.new_files.remove(index - existing);
            true
        } else {
            false
        }
    }

    pub fn image_count(&self) -> usize {
        self.existing_images.len() + self.new_files.len()
    }

    /// What the editor shows: kept urls, then the names of pending files.
    pub fn previews(&self) -> Vec<&str> {
        self.existing_images
            .iter()
            .map(String::as_str)
            .chain(self.new_files.iter().map(|f| f.file_name.as_str()))
            .collect()
    }

    pub fn deleted_images(&self) -> &[String] {
        &self.deleted_images
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [&self.name, &self.price, &self.stock, &self.category];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err("Please fill in all required fields");
        }
        Ok(())
    }

    /// Body for `POST /api/products`.
    pub fn create_submission(&self) -> Result<MultipartForm, &'static str> {
        self.validate()?;
        let form = self
            .scalar_parts()
            .text("categoryId", &self.category);
        Ok(self
            .new_files
            .iter()
            .fold(form, |form, f| form.file("files[]", &f.file_name, f.bytes.clone())))
    }

    /// Body for `PUT /api/products/:id`.
    pub fn edit_submission(&self) -> Result<MultipartForm, &'static str> {
        self.validate()?;
        let form = self
            .scalar_parts()
            .text("category", &self.category)
            .text("existingImages", json_list(&self.existing_images))
            .text("deletedImages", json_list(&self.deleted_images));
        Ok(self
            .new_files
            .iter()
            .fold(form, |form, f| form.file("newImages[]", &f.file_name, f.bytes.clone())))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn scalar_parts(&self) -> MultipartForm {
        MultipartForm::new()
            .text("name", &self.name)
            .text("price", &self.price)
            .text("description", &self.description)
            .text("stock", &self.stock)
    }
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    name: String,
    icon_name: String,
}

impl CategoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(category: &Category) -> Self {
        Self { name: category.name.clone(), icon_name: category.icon_name.clone() }
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_icon_name(&mut self, value: impl Into<String>) {
        self.icon_name = value.into();
    }

    pub fn slug_preview(&self) -> String {
        slugify(&self.name)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        validate_category(&self.name, &self.icon_name)
    }

    /// Body for `POST /api/category` and `PUT /api/category/:id`.
    pub fn submission(&self) -> Result<MultipartForm, &'static str> {
        self.validate()?;
        Ok(MultipartForm::new()
            .text("name", self.name.trim())
            .text("iconName", &self.icon_name)
            .text("slug", self.slug_preview()))
    }
}

/// Shared by the form and the category endpoints.
pub fn validate_category(name: &str, icon_name: &str) -> Result<(), &'static str> {
    if name.trim().chars().count() < 2 {
        return Err("Category name must be at least 2 characters");
    }
    if icon_name.trim().is_empty() {
        return Err("Please select an icon");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile { file_name: name.into(), bytes: name.as_bytes().to_vec() }
    }

    fn filled() -> ProductForm {
        let mut form = ProductForm::new();
        form.set_name("Desk Lamp");
        form.set_price("24.50");
        form.set_stock("3");
        form.set_category("1");
        form
    }

    #[test]
    fn images_are_capped() {
        let mut form = filled();
        let accepted = form.add_files(["a.png", "b.png", "c.png", "d.png", "e.png"].map(file));
        assert_eq!(accepted, MAX_IMAGES);
        assert_eq!(form.add_files([file("f.png")]), 0);
        assert_eq!(form.image_count(), MAX_IMAGES);
    }

    #[test]
    fn removing_existing_image_marks_it_deleted() {
        let mut form = filled();
        form.existing_images = vec!["/uploads/1-a.png".into(), "/uploads/2-b.png".into()];
        form.add_files([file("c.png")]);

        assert!(form.remove_image(0));
        assert_eq!(form.deleted_images(), ["/uploads/1-a.png".to_string()]);
        assert_eq!(form.previews(), vec!["/uploads/2-b.png", "c.png"]);

        assert!(form.remove_image(1));
        assert_eq!(form.previews(), vec!["/uploads/2-b.png"]);
        assert_eq!(form.deleted_images().len(), 1);
        assert!(!form.remove_image(5));
    }

    #[test]
    fn required_fields_block_submission() {
        let mut form = filled();
        form.set_stock(" ");
        assert_eq!(form.create_submission().unwrap_err(), "Please fill in all required fields");
    }

    #[test]
    fn edit_submission_carries_image_delta() {
        let mut form = filled();
        form.existing_images = vec!["/uploads/1-a.png".into(), "/uploads/2-b.png".into()];
        form.remove_image(1);
        form.add_files([file("new.png")]);

        let body = form.edit_submission().unwrap();
        assert_eq!(body.text_value("category"), Some("1"));
        assert_eq!(body.text_value("existingImages"), Some(r#"["/uploads/1-a.png"]"#));
        assert_eq!(body.text_value("deletedImages"), Some(r#"["/uploads/2-b.png"]"#));
        assert_eq!(body.file_names("newImages[]"), vec!["new.png"]);
    }

    #[test]
    fn create_submission_uses_category_id_and_files() {
        let mut form = filled();
        form.add_files([file("a.png")]);
        let body = form.create_submission().unwrap();
        assert_eq!(body.text_value("categoryId"), Some("1"));
        assert_eq!(body.file_names("files[]"), vec!["a.png"]);
    }

    #[test]
    fn requests_carry_a_per_form_boundary() {
        let client = reqwest::Client::new();
        let boundary = |form: MultipartForm| {
            let req = form.into_request(&client, Method::POST, "http://localhost/api/products").unwrap();
            let content_type = req.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_string();
            content_type.strip_prefix("multipart/form-data; boundary=").unwrap().to_string()
        };
        let first = boundary(filled().create_submission().unwrap());
        let second = boundary(filled().create_submission().unwrap());
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    #[test]
    fn category_form_validates_and_previews_slug() {
        let mut form = CategoryForm::new();
        form.set_name("H");
        assert_eq!(form.validate().unwrap_err(), "Category name must be at least 2 characters");
        form.set_name("Home & Garden!");
        assert_eq!(form.validate().unwrap_err(), "Please select an icon");
        form.set_icon_name("Sofa");
        assert_eq!(form.slug_preview(), "home-garden");
        assert_eq!(form.submission().unwrap().text_value("slug"), Some("home-garden"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut form = filled();
        form.add_files([file("a.png")]);
        form.reset();
        assert_eq!(form.image_count(), 0);
        assert!(form.validate().is_err());
    }
}
