//! crates/bookstore_core/src/memory.rs
//!
//! An in-process implementation of the storage and identity ports.
//!
//! Shop data (books, carts, orders) and identity data (users, sessions) sit
//! behind separate async mutexes. A transaction holds the shop lock for its
//! whole lifetime, so transactions are fully serialised. It writes in place
//! and keeps an undo log; dropping it without `commit` replays the log.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{
    AuthSession, Book, BookId, CartLine, CartLineId, NewBook, Order, OrderId, OrderLine, User,
    UserCredentials,
};
use crate::ports::{IdentityService, PortError, PortResult, StoreService, StoreTransaction};

#[derive(Default)]
struct ShopState {
    books: Vec<Book>,
    /// Sorted by id.
    cart_lines: Vec<CartLine>,
    orders: Vec<Order>,
    last_book_id: BookId,
    last_cart_line_id: CartLineId,
    last_order_id: OrderId,
}

impl ShopState {
    fn cart_lines_for(&self, user_id: Uuid) -> Vec<CartLine> {
        self.cart_lines
            .iter()
            .filter(|line| line.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct IdentityState {
    users: HashMap<String, UserCredentials>,
    auth_sessions: HashMap<String, AuthSession>,
}

/// Shared handle to an in-memory bookstore. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shop: Arc<Mutex<ShopState>>,
    identity: Arc<Mutex<IdentityState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored auth sessions, expired ones included.
    pub async fn auth_session_count(&self) -> usize {
        self.identity.lock().await.auth_sessions.len()
    }
}

#[async_trait]
impl StoreService for MemoryStore {
    async fn list_books(&self) -> PortResult<Vec<Book>> {
        Ok(self.shop.lock().await.books.clone())
    }

    async fn get_book(&self, book_id: BookId) -> PortResult<Book> {
        self.shop
            .lock()
            .await
            .books
            .iter()
            .find(|book| book.id == book_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
    }

    async fn insert_book(&self, book: NewBook) -> PortResult<Book> {
        let mut shop = self.shop.lock().await;
        shop.last_book_id += 1;
        let book = Book {
            id: shop.last_book_id,
            title: book.title,
            author: book.author,
            price: book.price,
            description: book.description,
            cover_image: book.cover_image,
        };
        shop.books.push(book.clone());
        Ok(book)
    }

    async fn cart_lines(&self, user_id: Uuid) -> PortResult<Vec<CartLine>> {
        Ok(self.shop.lock().await.cart_lines_for(user_id))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> PortResult<Vec<Order>> {
        Ok(self
            .shop
            .lock()
            .await
            .orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_order(&self, order_id: OrderId) -> PortResult<Order> {
        self.shop
            .lock()
            .await
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn begin(&self) -> PortResult<Box<dyn StoreTransaction>> {
        let guard = self.shop.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            start_cart_line_id: guard.last_cart_line_id,
            start_order_id: guard.last_order_id,
            guard,
            undo: Vec::new(),
            committed: false,
        }))
    }
}

/// A change to pre-existing cart lines, recorded so it can be reverted.
enum Undo {
    Quantity(CartLineId, u32),
    Deleted(Vec<CartLine>),
}

/// A transaction over a [`MemoryStore`].
///
/// Rows created inside the transaction are recognised by ids above the
/// counters captured at `begin`.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<ShopState>,
    start_cart_line_id: CartLineId,
    start_order_id: OrderId,
    undo: Vec<Undo>,
    committed: bool,
}

impl MemoryTransaction {
    fn rollback(&mut self) {
        let shop = &mut *self.guard;
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::Quantity(id, quantity) => {
                    if let Some(line) = shop.cart_lines.iter_mut().find(|line| line.id == id) {
                        line.quantity = quantity;
                    }
                }
                Undo::Deleted(lines) => {
                    shop.cart_lines.extend(lines);
                    shop.cart_lines.sort_by_key(|line| line.id);
                }
            }
        }
        let (cart_cutoff, order_cutoff) = (self.start_cart_line_id, self.start_order_id);
        shop.cart_lines.retain(|line| line.id <= cart_cutoff);
        shop.orders.retain(|order| order.id <= order_cutoff);
        shop.last_cart_line_id = cart_cutoff;
        shop.last_order_id = order_cutoff;
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn book_exists(&mut self, book_id: BookId) -> PortResult<bool> {
        Ok(self.guard.books.iter().any(|book| book.id == book_id))
    }

    async fn find_cart_line(
        &mut self,
        user_id: Uuid,
        book_id: BookId,
    ) -> PortResult<Option<CartLine>> {
        Ok(self
            .guard
            .cart_lines
            .iter()
            .find(|line| line.user_id == user_id && line.book_id == book_id)
            .cloned())
    }

    async fn insert_cart_line(
        &mut self,
        user_id: Uuid,
        book_id: BookId,
        quantity: u32,
    ) -> PortResult<CartLine> {
        if let Some(existing) = self
            .guard
            .cart_lines
            .iter_mut()
            .find(|line| line.user_id == user_id && line.book_id == book_id)
        {
            self.undo.push(Undo::Quantity(existing.id, existing.quantity));
            existing.quantity += quantity;
            return Ok(existing.clone());
        }

        self.guard.last_cart_line_id += 1;
        let line = CartLine {
            id: self.guard.last_cart_line_id,
            user_id,
            book_id,
            quantity,
        };
        self.guard.cart_lines.push(line.clone());
        Ok(line)
    }

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: u32,
    ) -> PortResult<CartLine> {
        let line = self
            .guard
            .cart_lines
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or_else(|| PortError::NotFound(format!("Cart line {} not found", line_id)))?;
        self.undo.push(Undo::Quantity(line.id, line.quantity));
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn lock_cart_lines(&mut self, user_id: Uuid) -> PortResult<Vec<CartLine>> {
        // The whole shop is already locked for this transaction.
        Ok(self.guard.cart_lines_for(user_id))
    }

    async fn create_order(&mut self, user_id: Uuid, lines: &[OrderLine]) -> PortResult<Order> {
        self.guard.last_order_id += 1;
        let order = Order {
            id: self.guard.last_order_id,
            user_id,
            lines: lines.to_vec(),
            created_at: Utc::now(),
        };
        self.guard.orders.push(order.clone());
        Ok(order)
    }

    async fn delete_cart_lines(&mut self, line_ids: &[CartLineId]) -> PortResult<u64> {
        let (removed, kept) = std::mem::take(&mut self.guard.cart_lines)
            .into_iter()
            .partition::<Vec<_>, _>(|line| line_ids.contains(&line.id));
        self.guard.cart_lines = kept;
        let count = removed.len() as u64;
        if !removed.is_empty() {
            self.undo.push(Undo::Deleted(removed));
        }
        Ok(count)
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        let mut tx = *self;
        tx.committed = true;
        Ok(())
    }
}

#[async_trait]
impl IdentityService for MemoryStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut identity = self.identity.lock().await;
        if identity.users.contains_key(email) {
            return Err(PortError::AlreadyExists(format!("User {}", email)));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        let user = User {
            user_id: credentials.user_id,
            email: credentials.email.clone(),
        };
        identity.users.insert(email.to_string(), credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.identity
            .lock()
            .await
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    /// Also drops every session that has already expired.
    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()> {
        let now = Utc::now();
        let mut identity = self.identity.lock().await;
        identity
            .auth_sessions
            .retain(|_, existing| existing.expires_at > now);
        identity.auth_sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let mut identity = self.identity.lock().await;
        match identity.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            Some(_) => {
                identity.auth_sessions.remove(session_id);
                Err(PortError::Unauthenticated)
            }
            None => Err(PortError::Unauthenticated),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.identity.lock().await.auth_sessions.remove(session_id);
        Ok(())
    }
}
