//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the storefront endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::auth::{self, AuthResponse, LoginRequest, SignupRequest};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Redirect},
    Extension,
};
use bookstore_core::domain::{
    Book, BookId, CartLine, CartLineId, Identity, Order, OrderId, OrderLine,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        home_handler,
        simple_home_handler,
        health_handler,
        book_detail_handler,
        add_to_cart_handler,
        cart_handler,
        checkout_handler,
        list_orders_handler,
        order_detail_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
    ),
    components(
        schemas(
            BookResponse,
            CartLineResponse,
            OrderLineResponse,
            OrderResponse,
            CheckoutResponse,
            HealthResponse,
            SignupRequest,
            LoginRequest,
            AuthResponse,
        )
    ),
    tags(
        (name = "Bookstore API", description = "Catalog, cart and checkout endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Decimal string with two places, e.g. "299.99".
    #[schema(value_type = String)]
    pub price: Decimal,
    pub description: String,
    pub cover_image: Option<String>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
            description: book.description,
            cover_image: book.cover_image,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CartLineResponse {
    pub id: CartLineId,
    pub book_id: BookId,
    pub quantity: u32,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            book_id: line.book_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    pub book_id: BookId,
    pub quantity: u32,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            book_id: line.book_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: Uuid,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            lines: order.lines.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
        }
    }
}

/// Checkout confirmation. `order` is null when the cart was empty.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub message: String,
    pub order: Option<OrderResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// List every book in the catalog, in insertion order.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "The catalog", body = [BookResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn home_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = app_state.storefront.list_catalog().await?;
    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// Plain-text fallback listing of the catalog.
#[utoipa::path(
    get,
    path = "/simple",
    responses(
        (status = 200, description = "The catalog as plain text", content_type = "text/plain", body = String)
    )
)]
pub async fn simple_home_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let books = app_state.storefront.list_catalog().await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_plain_catalog(&books),
    ))
}

fn render_plain_catalog(books: &[Book]) -> String {
    let mut out = String::from("Bookstore\n\n");
    if books.is_empty() {
        out.push_str("No books available yet.\n");
    }
    for book in books {
        out.push_str(&format!(
            "{}. {} by {} - {}\n",
            book.id, book.title, book.author, book.price
        ));
    }
    out
}

/// Liveness probe. Does not touch the store.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Fetch a single book.
#[utoipa::path(
    get,
    path = "/book/{id}",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "No such book")
    )
)]
pub async fn book_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Path(book_id): Path<BookId>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = app_state.storefront.book_detail(book_id).await?;
    Ok(Json(book.into()))
}

//=========================================================================================
// Cart and Checkout Handlers
//=========================================================================================

/// Add one copy of a book to the caller's cart, then redirect to the cart.
#[utoipa::path(
    post,
    path = "/add-to-cart/{id}",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 303, description = "Added; redirects to /cart"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such book")
    )
)]
pub async fn add_to_cart_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(book_id): Path<BookId>,
) -> Result<Redirect, ApiError> {
    app_state.storefront.add_to_cart(&identity, book_id).await?;
    Ok(Redirect::to("/cart"))
}

/// The caller's cart lines.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart lines", body = [CartLineResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn cart_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<CartLineResponse>>, ApiError> {
    let lines = app_state.storefront.view_cart(&identity).await?;
    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

/// Turn the caller's cart into an order.
#[utoipa::path(
    post,
    path = "/checkout",
    responses(
        (status = 200, description = "Checkout confirmation", body = CheckoutResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn checkout_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let order = app_state.storefront.checkout(&identity).await?;
    let message = match order {
        Some(_) => "Order placed",
        None => "Cart is empty, no order placed",
    };
    Ok(Json(CheckoutResponse {
        message: message.to_string(),
        order: order.map(Into::into),
    }))
}

//=========================================================================================
// Order Handlers
//=========================================================================================

/// The caller's orders, oldest first.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders", body = [OrderResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_orders_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = app_state.storefront.list_orders(&identity).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// One of the caller's orders.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = i64, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "The order", body = OrderResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such order for this user")
    )
)]
pub async fn order_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = app_state.storefront.get_order(&identity, order_id).await?;
    Ok(Json(order.into()))
}
