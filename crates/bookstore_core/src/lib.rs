pub mod domain;
pub mod memory;
pub mod ports;
pub mod storefront;

pub use domain::{
    AuthSession, Book, BookId, CartLine, CartLineId, Identity, NewBook, Order, OrderId, OrderLine,
    User, UserCredentials,
};
pub use memory::MemoryStore;
pub use ports::{IdentityService, PortError, PortResult, StoreService, StoreTransaction};
pub use storefront::Storefront;
