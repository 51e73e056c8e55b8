//! crates/bookstore_core/src/storefront.rs
//!
//! The catalog, cart and checkout operations, written against the storage port.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::{Book, BookId, CartLine, Identity, Order, OrderId, OrderLine};
use crate::ports::{PortError, PortResult, StoreService};

/// Entry point for every bookstore operation.
///
/// Holds no state of its own; the store is injected and the caller's identity
/// is passed to each operation that needs one.
#[derive(Clone)]
pub struct Storefront {
    store: Arc<dyn StoreService>,
}

impl Storefront {
    pub fn new(store: Arc<dyn StoreService>) -> Self {
        Self { store }
    }

    /// Every book, in insertion order.
    pub async fn list_catalog(&self) -> PortResult<Vec<Book>> {
        self.store.list_books().await
    }

    pub async fn book_detail(&self, book_id: BookId) -> PortResult<Book> {
        self.store.get_book(book_id).await
    }

    /// Adds one copy of a book to the caller's cart.
    ///
    /// The first add creates the line with quantity 1, later adds increment
    /// it. Fails with `NotFound` if the book does not exist, leaving the cart
    /// untouched.
    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn add_to_cart(&self, identity: &Identity, book_id: BookId) -> PortResult<CartLine> {
        let mut tx = self.store.begin().await?;

        if !tx.book_exists(book_id).await? {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }

        let line = match tx.find_cart_line(identity.user_id, book_id).await? {
            Some(existing) => {
                tx.set_cart_line_quantity(existing.id, existing.quantity + 1)
                    .await?
            }
            None => tx.insert_cart_line(identity.user_id, book_id, 1).await?,
        };

        tx.commit().await?;
        debug!(quantity = line.quantity, "Cart line updated");
        Ok(line)
    }

    pub async fn view_cart(&self, identity: &Identity) -> PortResult<Vec<CartLine>> {
        self.store.cart_lines(identity.user_id).await
    }

    /// Turns the caller's cart into an order and empties the cart.
    ///
    /// Returns `None` without writing anything when the cart is empty. The
    /// order insert and the cart deletion commit together or not at all.
    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn checkout(&self, identity: &Identity) -> PortResult<Option<Order>> {
        let mut tx = self.store.begin().await?;

        let lines = tx.lock_cart_lines(identity.user_id).await?;
        if lines.is_empty() {
            debug!("Checkout on an empty cart, nothing to do");
            return Ok(None);
        }

        let snapshot: Vec<OrderLine> = lines.iter().map(OrderLine::from).collect();
        let order = tx.create_order(identity.user_id, &snapshot).await?;

        let ids: Vec<_> = lines.iter().map(|line| line.id).collect();
        let removed = tx.delete_cart_lines(&ids).await?;
        if removed != ids.len() as u64 {
            // Dropping `tx` rolls the order back.
            return Err(PortError::Unexpected(format!(
                "expected to clear {} cart lines, cleared {}",
                ids.len(),
                removed
            )));
        }

        tx.commit().await?;
        info!(order_id = order.id, lines = order.lines.len(), "Order created");
        Ok(Some(order))
    }

    pub async fn list_orders(&self, identity: &Identity) -> PortResult<Vec<Order>> {
        self.store.orders_for_user(identity.user_id).await
    }

    /// One of the caller's orders. Orders owned by someone else are reported
    /// as `NotFound`.
    pub async fn get_order(&self, identity: &Identity, order_id: OrderId) -> PortResult<Order> {
        let order = self.store.get_order(order_id).await?;
        if order.user_id != identity.user_id {
            return Err(PortError::NotFound(format!("Order {} not found", order_id)));
        }
        Ok(order)
    }
}
