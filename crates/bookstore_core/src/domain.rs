//! crates/bookstore_core/src/domain.rs
//!
//! Defines the pure, core data structures for the bookstore.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Identifier of a catalog entry. Assigned in insertion order.
pub type BookId = i64;

/// Identifier of a cart line.
pub type CartLineId = i64;

/// Identifier of an order.
pub type OrderId = i64;

/// A purchasable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Unit price, fixed-point with two decimal places.
    pub price: Decimal,
    pub description: String,
    pub cover_image: Option<String>,
}

/// The fields needed to insert a new book; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub description: String,
    pub cover_image: Option<String>,
}

impl NewBook {
    /// Builds a book without a cover image. The price is rounded to cents.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        price: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            price: price.round_dp(2),
            description: description.into(),
            cover_image: None,
        }
    }
}

/// A per-user, per-book pending purchase. At most one exists per (user, book).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: Uuid,
    pub book_id: BookId,
    /// Always >= 1.
    pub quantity: u32,
}

/// The frozen copy of a cart line inside an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub book_id: BookId,
    pub quantity: u32,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            book_id: line.book_id,
            quantity: line.quantity,
        }
    }
}

/// An immutable snapshot of a user's cart taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Uuid,
    /// Never empty.
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of a cart or checkout operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// A registered customer.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Login lookups only; carries the password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A login session, referenced by the `session` cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
