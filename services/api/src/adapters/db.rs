//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StoreService` and `IdentityService` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use bookstore_core::domain::{
    AuthSession, Book, BookId, CartLine, CartLineId, NewBook, Order, OrderId, OrderLine, User,
    UserCredentials,
};
use bookstore_core::ports::{
    IdentityService, PortError, PortResult, StoreService, StoreTransaction,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage and identity ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRecord {
    id: i64,
    title: String,
    author: String,
    price: Decimal,
    description: String,
    cover_image: Option<String>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            price: self.price,
            description: self.description,
            cover_image: self.cover_image,
        }
    }
}

#[derive(FromRow)]
struct CartLineRecord {
    id: i64,
    user_id: Uuid,
    book_id: i64,
    quantity: i32,
}
impl CartLineRecord {
    fn to_domain(self) -> CartLine {
        CartLine {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            quantity: self.quantity as u32,
        }
    }
}

#[derive(FromRow)]
struct OrderRecord {
    id: i64,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}
impl OrderRecord {
    fn to_domain(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            lines,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct OrderLineRecord {
    order_id: i64,
    book_id: i64,
    quantity: i32,
}
impl OrderLineRecord {
    fn to_domain(&self) -> OrderLine {
        OrderLine {
            book_id: self.book_id,
            quantity: self.quantity as u32,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

const BOOK_COLUMNS: &str = "id, title, author, price, description, cover_image";
const CART_LINE_COLUMNS: &str = "id, user_id, book_id, quantity";

/// Loads the lines of the given orders and attaches them, preserving the
/// order of `records`.
async fn attach_lines(pool: &PgPool, records: Vec<OrderRecord>) -> PortResult<Vec<Order>> {
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let lines = sqlx::query_as::<_, OrderLineRecord>(
        "SELECT order_id, book_id, quantity FROM order_lines WHERE order_id = ANY($1) ORDER BY order_id, position",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(unexpected)?;

    let orders = records
        .into_iter()
        .map(|record| {
            let own = lines
                .iter()
                .filter(|line| line.order_id == record.id)
                .map(OrderLineRecord::to_domain)
                .collect();
            record.to_domain(own)
        })
        .collect();
    Ok(orders)
}

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for DbAdapter {
    async fn list_books(&self) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books ORDER BY id ASC",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_book(&self, book_id: BookId) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("Book {} not found", book_id)))?;
        Ok(record.to_domain())
    }

    async fn insert_book(&self, book: NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "INSERT INTO books (title, author, price, description, cover_image) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price)
        .bind(&book.description)
        .bind(&book.cover_image)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn cart_lines(&self, user_id: Uuid) -> PortResult<Vec<CartLine>> {
        let records = sqlx::query_as::<_, CartLineRecord>(&format!(
            "SELECT {} FROM cart_lines WHERE user_id = $1 ORDER BY id ASC",
            CART_LINE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn orders_for_user(&self, user_id: Uuid) -> PortResult<Vec<Order>> {
        let records = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, created_at FROM orders WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        attach_lines(&self.pool, records).await
    }

    async fn get_order(&self, order_id: OrderId) -> PortResult<Order> {
        let record = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, created_at FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("Order {} not found", order_id)))?;

        let mut orders = attach_lines(&self.pool, vec![record]).await?;
        orders
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn begin(&self) -> PortResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(unexpected)?;
        Ok(Box::new(DbTransaction { tx }))
    }
}

//=========================================================================================
// `StoreTransaction` Trait Implementation
//=========================================================================================

/// Wraps a `sqlx` transaction. Dropping it without `commit` rolls back.
pub struct DbTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for DbTransaction {
    async fn book_exists(&mut self, book_id: BookId) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(unexpected)
    }

    async fn find_cart_line(
        &mut self,
        user_id: Uuid,
        book_id: BookId,
    ) -> PortResult<Option<CartLine>> {
        let record = sqlx::query_as::<_, CartLineRecord>(&format!(
            "SELECT {} FROM cart_lines WHERE user_id = $1 AND book_id = $2 FOR UPDATE",
            CART_LINE_COLUMNS
        ))
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_cart_line(
        &mut self,
        user_id: Uuid,
        book_id: BookId,
        quantity: u32,
    ) -> PortResult<CartLine> {
        let record = sqlx::query_as::<_, CartLineRecord>(&format!(
            "INSERT INTO cart_lines (user_id, book_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, book_id) DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity \
             RETURNING {}",
            CART_LINE_COLUMNS
        ))
        .bind(user_id)
        .bind(book_id)
        .bind(quantity as i32)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: u32,
    ) -> PortResult<CartLine> {
        let record = sqlx::query_as::<_, CartLineRecord>(&format!(
            "UPDATE cart_lines SET quantity = $1 WHERE id = $2 RETURNING {}",
            CART_LINE_COLUMNS
        ))
        .bind(quantity as i32)
        .bind(line_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("Cart line {} not found", line_id)))?;
        Ok(record.to_domain())
    }

    async fn lock_cart_lines(&mut self, user_id: Uuid) -> PortResult<Vec<CartLine>> {
        let records = sqlx::query_as::<_, CartLineRecord>(&format!(
            "SELECT {} FROM cart_lines WHERE user_id = $1 ORDER BY id ASC FOR UPDATE",
            CART_LINE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_order(&mut self, user_id: Uuid, lines: &[OrderLine]) -> PortResult<Order> {
        let record = sqlx::query_as::<_, OrderRecord>(
            "INSERT INTO orders (user_id) VALUES ($1) RETURNING id, user_id, created_at",
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(unexpected)?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_lines (order_id, position, book_id, quantity) VALUES ($1, $2, $3, $4)",
            )
            .bind(record.id)
            .bind(position as i32)
            .bind(line.book_id)
            .bind(line.quantity as i32)
            .execute(&mut *self.tx)
            .await
            .map_err(unexpected)?;
        }

        Ok(record.to_domain(lines.to_vec()))
    }

    async fn delete_cart_lines(&mut self, line_ids: &[CartLineId]) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1)")
            .bind(line_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        self.tx.commit().await.map_err(unexpected)
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::AlreadyExists(format!("User {}", email))
            }
            _ => unexpected(e),
        })?;

        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    /// Also deletes every session that has already expired.
    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()> {
        let purged = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if purged > 0 {
            debug!(purged, "Expired auth sessions deleted");
        }

        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthenticated)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
