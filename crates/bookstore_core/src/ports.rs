//! crates/bookstore_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the bookstore core.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage and identity implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AuthSession, Book, BookId, CartLine, CartLineId, NewBook, Order, OrderId, OrderLine, User,
    UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Catalog, cart and order storage.
///
/// Reads that need no consistency with a following write go straight through
/// this trait. Read-then-write sequences go through a [`StoreTransaction`]
/// obtained from [`StoreService::begin`].
#[async_trait]
pub trait StoreService: Send + Sync {
    // --- Catalog ---
    /// All books in insertion order.
    async fn list_books(&self) -> PortResult<Vec<Book>>;

    async fn get_book(&self, book_id: BookId) -> PortResult<Book>;

    async fn insert_book(&self, book: NewBook) -> PortResult<Book>;

    // --- Cart ---
    /// The user's cart lines in creation order.
    async fn cart_lines(&self, user_id: Uuid) -> PortResult<Vec<CartLine>>;

    // --- Orders ---
    /// The user's orders, oldest first.
    async fn orders_for_user(&self, user_id: Uuid) -> PortResult<Vec<Order>>;

    async fn get_order(&self, order_id: OrderId) -> PortResult<Order>;

    // --- Transactions ---
    async fn begin(&self) -> PortResult<Box<dyn StoreTransaction>>;
}

/// A unit of work against the store.
///
/// Nothing done through a transaction is visible to other callers until
/// [`StoreTransaction::commit`] succeeds. Dropping the transaction without
/// committing rolls every change back.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn book_exists(&mut self, book_id: BookId) -> PortResult<bool>;

    async fn find_cart_line(
        &mut self,
        user_id: Uuid,
        book_id: BookId,
    ) -> PortResult<Option<CartLine>>;

    /// Inserts a cart line. If a line for (user, book) appeared concurrently,
    /// `quantity` is added to it instead.
    async fn insert_cart_line(
        &mut self,
        user_id: Uuid,
        book_id: BookId,
        quantity: u32,
    ) -> PortResult<CartLine>;

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: u32,
    ) -> PortResult<CartLine>;

    /// The user's cart lines, locked against concurrent writers until the
    /// transaction ends.
    async fn lock_cart_lines(&mut self, user_id: Uuid) -> PortResult<Vec<CartLine>>;

    async fn create_order(&mut self, user_id: Uuid, lines: &[OrderLine]) -> PortResult<Order>;

    /// Returns the number of lines removed.
    async fn delete_cart_lines(&mut self, line_ids: &[CartLineId]) -> PortResult<u64>;

    async fn commit(self: Box<Self>) -> PortResult<()>;
}

/// User accounts and login sessions.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()>;

    /// Resolves a live session to its user. Expired or unknown sessions are
    /// `Unauthenticated`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
