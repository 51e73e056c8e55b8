// tests/common/mod.rs
#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Once};

use bookstore_core::{Book, Identity, MemoryStore, NewBook, StoreService, Storefront};
use rust_decimal::Decimal;
use uuid::Uuid;

static TRACING: Once = Once::new();

pub fn setup_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("bookstore_core=debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn price(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

pub fn customer() -> Identity {
    Identity::new(Uuid::new_v4())
}

/// A storefront over a fresh in-memory store holding the two sample books.
pub async fn seeded_storefront() -> (Storefront, MemoryStore, Vec<Book>) {
    setup_tracing();
    let store = MemoryStore::new();
    let mut books = Vec::new();
    for (title, author, amount) in [
        ("Sample Book 1", "Sample Author", "299.99"),
        ("Sample Book 2", "Another Author", "399.99"),
    ] {
        let book = store
            .insert_book(NewBook::new(title, author, price(amount), "A sample book."))
            .await
            .unwrap();
        books.push(book);
    }
    let storefront = Storefront::new(Arc::new(store.clone()));
    (storefront, store, books)
}
