mod common;

use axum::http::{Method, StatusCode};
use serde_json::Value;
use storefront::forms::{MultipartForm, ProductForm};
use storefront::models::product::UploadedFile;

use common::{spawn, urls, TestApp};

fn file(name: &str) -> UploadedFile {
    UploadedFile { file_name: name.into(), bytes: format!("bytes of {name}").into_bytes() }
}

async fn create_with_images(app: &TestApp, category_id: i64, names: &[&str]) -> Value {
    let mut form = ProductForm::new();
    form.set_name("Desk Lamp");
    form.set_price("24.5");
    form.set_description("Warm light");
    form.set_stock("3");
    form.set_category(category_id.to_string());
    form.add_files(names.iter().map(|n| file(n)));

    let (status, body) = app
        .submit(Method::POST, "/api/products", form.create_submission().unwrap())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn pagination_offsets_and_filtered_count() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    for i in 1..=5 {
        app.product(&format!("Lamp {i}"), "bright", cat).await;
    }
    app.product("Chair", "a lamp-free seat", cat).await;
    app.product("Table", "oak", cat).await;

    let (status, first) = app.get("/api/products?page=1&perPage=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], 7);
    assert_eq!(first["page"], 1);
    assert_eq!(first["totalPages"], 4);
    let names: Vec<&str> = first["product"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Lamp 1", "Lamp 2"]);

    let (_, second) = app.get("/api/products?page=2&perPage=2").await;
    let names: Vec<&str> = second["product"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Lamp 3", "Lamp 4"]);

    // name OR description, case-insensitive; count ignores page size
    let (_, search) = app.get("/api/products?page=1&perPage=2&search=LAMP").await;
    assert_eq!(search["count"], 6);
    assert_eq!(search["product"].as_array().unwrap().len(), 2);

    let (_, last) = app.get("/api/products?page=3&perPage=2&search=lamp").await;
    assert_eq!(last["count"], 6);
    assert_eq!(last["product"].as_array().unwrap().len(), 2);

    let (_, beyond) = app.get("/api/products?page=9&perPage=2&search=lamp").await;
    assert_eq!(beyond["count"], 6);
    assert!(beyond["product"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_wildcards_are_literal() {
    let app = spawn().await;
    let cat = app.category("Sale").await;
    app.product("50% off mug", "", cat).await;
    app.product("500 mugs", "", cat).await;

    let (_, body) = app.get("/api/products?search=50%25").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["product"][0]["name"], "50% off mug");
}

#[tokio::test]
async fn bad_pagination_is_rejected() {
    let app = spawn().await;
    let (status, body) = app.get("/api/products?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid page");

    let (status, _) = app.get("/api/products?perPage=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_stores_files_and_embeds_category() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let product = create_with_images(&app, cat, &["a.png", "b.png"]).await;

    assert_eq!(product["name"], "Desk Lamp");
    assert_eq!(product["price"], 24.5);
    assert_eq!(product["stock"], 3);
    assert_eq!(product["categoryId"], cat);
    assert_eq!(product["category"]["slug"], "lighting");

    let images = urls(&product);
    assert_eq!(images.len(), 2);
    assert!(images[0].starts_with("/uploads/") && images[0].ends_with("-a.png"));
    assert_eq!(std::fs::read(app.upload_path(&images[1])).unwrap(), b"bytes of b.png");

    // uploads are served from the public directory
    let resp = app.get(&images[0]).await;
    assert_eq!(resp.0, StatusCode::OK);

    let (status, fetched) = app.get(&format!("/api/products/{}", product["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(urls(&fetched), images);
}

#[tokio::test]
async fn create_validates_category_id() {
    let app = spawn().await;
    let base = MultipartForm::new()
        .text("name", "Lamp")
        .text("price", "1")
        .text("stock", "1");

    let (status, body) = app.submit(Method::POST, "/api/products", base.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Category ID is required");

    let (status, body) = app
        .submit(Method::POST, "/api/products", base.clone().text("categoryId", "x1"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Category ID");

    // numeric but dangling: the foreign key rejects it
    let (status, body) = app
        .submit(Method::POST, "/api/products", base.text("categoryId", "999"))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create product");

    let (_, list) = app.get("/api/products").await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn edit_reconciles_image_set() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let other = app.category("Outdoor").await;
    let created = create_with_images(&app, cat, &["keep.png", "drop.png"]).await;
    let id = created["id"].as_i64().unwrap();
    let original = urls(&created);

    let view = storefront::services::product_service::get_product(&app.pool, id)
        .await
        .unwrap()
        .unwrap();
    let mut form = ProductForm::edit(&view);
    form.set_name("Desk Lamp XL");
    form.set_category(other.to_string());
    assert!(form.remove_image(1));
    form.add_files([file("new.png")]);

    let (status, updated) = app
        .submit(Method::PUT, &format!("/api/products/{id}"), form.edit_submission().unwrap())
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["name"], "Desk Lamp XL");
    assert_eq!(updated["category"]["slug"], "outdoor");

    let images = urls(&updated);
    assert_eq!(images.len(), 2);
    assert_eq!(images[0], original[0]);
    assert!(images[1].ends_with("-new.png"));
    assert!(!images.contains(&original[1]));

    assert!(app.upload_path(&original[0]).exists());
    assert!(!app.upload_path(&original[1]).exists());
    assert!(app.upload_path(&images[1]).exists());
}

#[tokio::test]
async fn edit_ignores_images_of_other_products() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let victim = create_with_images(&app, cat, &["victim.png"]).await;
    let target = create_with_images(&app, cat, &[]).await;
    let victim_url = urls(&victim).remove(0);

    let form = MultipartForm::new()
        .text("name", "Renamed")
        .text("price", "5")
        .text("stock", "1")
        .text("category", cat.to_string())
        .text("deletedImages", serde_json::json!([victim_url]).to_string());
    let (status, _) = app
        .submit(Method::PUT, &format!("/api/products/{}", target["id"]), form)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(app.upload_path(&victim_url).exists());
    let (_, victim_now) = app.get(&format!("/api/products/{}", victim["id"])).await;
    assert_eq!(urls(&victim_now), vec![victim_url]);
}

#[tokio::test]
async fn edit_of_missing_product_fails_generically() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let form = MultipartForm::new()
        .text("name", "Ghost")
        .text("price", "5")
        .text("stock", "1")
        .text("category", cat.to_string());

    let (status, body) = app.submit(Method::PUT, "/api/products/404", form).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to update product");
}

#[tokio::test]
async fn delete_removes_row_and_files() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let created = create_with_images(&app, cat, &["a.png"]).await;
    let id = created["id"].as_i64().unwrap();
    let url = urls(&created).remove(0);

    let (status, deleted) = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], id);
    assert!(!app.upload_path(&url).exists());

    let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_images")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(images, 0);

    let (status, body) = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to delete product");

    let (status, _) = app.delete("/api/products/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn field_content_cannot_forge_other_parts() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let forged = "see\r\n--storefront-form-7d1a9c4e\r\nContent-Disposition: form-data; name=\"price\"\r\n\r\n999";

    let mut form = ProductForm::new();
    form.set_name("Lamp");
    form.set_price("1");
    form.set_description(forged);
    form.set_stock("2");
    form.set_category(cat.to_string());
    form.add_files([file("my \"best\" lamp.png")]);

    let (status, product) = app
        .submit(Method::POST, "/api/products", form.create_submission().unwrap())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    assert_eq!(product["price"], 1.0);
    assert_eq!(product["description"], forged);

    let url = urls(&product).remove(0);
    assert!(url.ends_with("-my__best__lamp.png"), "{url}");
    assert_eq!(std::fs::read(app.upload_path(&url)).unwrap(), b"bytes of my \"best\" lamp.png");
}

#[tokio::test]
async fn same_named_files_keep_separate_copies() {
    let app = spawn().await;
    let cat = app.category("Lighting").await;
    let form = MultipartForm::new()
        .text("name", "Twin Lamp")
        .text("price", "3")
        .text("stock", "1")
        .text("categoryId", cat.to_string())
        .file("files[]", "lamp.png", b"left".to_vec())
        .file("files[]", "lamp.png", b"right".to_vec());

    let (status, product) = app.submit(Method::POST, "/api/products", form).await;
    assert_eq!(status, StatusCode::CREATED);
    let images = urls(&product);
    assert_ne!(images[0], images[1]);
    assert_eq!(std::fs::read(app.upload_path(&images[0])).unwrap(), b"left");
    assert_eq!(std::fs::read(app.upload_path(&images[1])).unwrap(), b"right");

    // dropping one copy leaves the other readable
    let edit = MultipartForm::new()
        .text("name", "Twin Lamp")
        .text("price", "3")
        .text("stock", "1")
        .text("category", cat.to_string())
        .text("deletedImages", serde_json::json!([images[0]]).to_string());
    let (status, _) = app
        .submit(Method::PUT, &format!("/api/products/{}", product["id"]), edit)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read(app.upload_path(&images[1])).unwrap(), b"right");
}

#[tokio::test]
async fn search_folds_non_ascii_case() {
    let app = spawn().await;
    let cat = app.category("Pâtisserie").await;
    let id = app.product("ÉCLAIR", "Crème pâtissière", cat).await;
    app.product("Tart", "butter", cat).await;

    let (_, body) = app.get("/api/products?search=%C3%A9clair").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["product"][0]["id"], id);

    let (_, body) = app.get("/api/products?search=CR%C3%88ME").await;
    assert_eq!(body["count"], 1);

    // folded text follows edits
    let form = MultipartForm::new()
        .text("name", "Profiterole")
        .text("price", "4")
        .text("stock", "1")
        .text("category", cat.to_string());
    let (status, _) = app.submit(Method::PUT, &format!("/api/products/{id}"), form).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/products?search=%C3%A9clair").await;
    assert_eq!(body["count"], 0);
}
