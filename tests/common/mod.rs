#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use storefront::{
    app,
    config::Config,
    db,
    forms::MultipartForm,
    models::{category::CategoryFields, product::ProductFields},
    rbac::SessionKeys,
    services::{category_service, product_service},
    AppState,
};

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub keys: SessionKeys,
    pub public: TempDir,
    http: reqwest::Client,
}

pub async fn spawn() -> TestApp {
    let public = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: "sqlite::memory:".into(),
        port: 0,
        public_dir: public.path().to_path_buf(),
        session_secret: SECRET.into(),
        max_upload_bytes: 5 * 1024 * 1024,
    };
    let pool = db::connect(&config.database_url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let state = AppState::new(pool.clone(), &config);
    TestApp {
        router: app(state),
        pool,
        keys: SessionKeys::new(SECRET),
        public,
        http: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    /// Sends `form` the way reqwest encodes it on the wire.
    pub async fn submit(&self, method: Method, uri: &str, form: MultipartForm) -> (StatusCode, Value) {
        let mut encoded = form
            .into_request(&self.http, method, &format!("http://localhost{uri}"))
            .unwrap();
        let content_type = encoded.headers()[header::CONTENT_TYPE].clone();
        let body = encoded.body_mut().take().unwrap();
        let req = Request::builder()
            .method(encoded.method().clone())
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::new(body))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub fn upload_path(&self, url: &str) -> std::path::PathBuf {
        self.public.path().join(url.trim_start_matches('/'))
    }

    pub async fn category(&self, name: &str) -> i64 {
        let fields = CategoryFields { name: name.into(), icon_name: "Box".into() };
        category_service::create_category(&self.pool, &fields).await.unwrap().id
    }

    pub async fn product(&self, name: &str, description: &str, category_id: i64) -> i64 {
        let fields = ProductFields {
            name: name.into(),
            price: 10.0,
            description: description.into(),
            stock: 1,
            category_id,
        };
        product_service::create_product(&self.pool, &fields, &[]).await.unwrap().id
    }
}

pub fn urls(product: &Value) -> Vec<String> {
    product["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|img| img["url"].as_str().unwrap().to_string())
        .collect()
}
