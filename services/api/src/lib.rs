//! services/api/src/lib.rs
//!
//! The bookstore HTTP service: configuration, storage adapters and the axum
//! web layer. The binaries in `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod seed;
pub mod web;
