//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use bookstore_core::ports::{IdentityService, StoreService};
use bookstore_core::Storefront;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub storefront: Storefront,
    pub identity: Arc<dyn IdentityService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StoreService>,
        identity: Arc<dyn IdentityService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            storefront: Storefront::new(store),
            identity,
            config,
        }
    }
}
