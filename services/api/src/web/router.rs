//! services/api/src/web/router.rs
//!
//! Assembles the full axum application from the handlers.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    middleware::require_auth,
    rest::{
        add_to_cart_handler, book_detail_handler, cart_handler, checkout_handler,
        health_handler, home_handler, list_orders_handler, order_detail_handler,
        simple_home_handler, ApiDoc,
    },
    state::AppState,
};

/// Builds the application router, including the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.allowed_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(home_handler))
        .route("/simple", get(simple_home_handler))
        .route("/health", get(health_handler))
        .route("/book/{id}", get(book_detail_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/add-to-cart/{id}",
            get(add_to_cart_handler).post(add_to_cart_handler),
        )
        .route("/cart", get(cart_handler))
        .route("/checkout", get(checkout_handler).post(checkout_handler))
        .route("/orders", get(list_orders_handler))
        .route("/orders/{id}", get(order_detail_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
