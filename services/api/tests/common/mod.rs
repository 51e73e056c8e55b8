// tests/common/mod.rs
#![allow(dead_code)]

pub mod properties;

use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bookstore_core::{Book, MemoryStore, NewBook, StoreService};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("memory:".to_string()),
        _ => None,
    })
    .unwrap()
}

/// An app over a fresh in-memory store holding the given books.
pub async fn spawn_app(books: &[(&str, &str, Decimal)]) -> (TestApp, Vec<Book>) {
    let store = MemoryStore::new();
    let mut inserted = Vec::new();
    for (title, author, price) in books {
        let book = store
            .insert_book(NewBook::new(*title, *author, *price, "A book."))
            .await
            .unwrap();
        inserted.push(book);
    }
    let state = Arc::new(AppState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(test_config()),
    ));
    let app = TestApp {
        router: build_router(state),
        store,
    };
    (app, inserted)
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Signs up a fresh user and returns the `Cookie` header value for them.
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .post_json(
                "/auth/signup",
                json!({ "email": email, "password": "correct horse" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        cookie_from(&response)
    }
}

/// Turns a `Set-Cookie` response header into a `Cookie` request header value.
pub fn cookie_from(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub async fn body_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn sample_books() -> Vec<(&'static str, &'static str, Decimal)> {
    vec![
        ("Sample Book 1", "Sample Author", Decimal::new(29999, 2)),
        ("Sample Book 2", "Another Author", Decimal::new(39999, 2)),
    ]
}
