//! services/api/src/seed.rs
//!
//! First-run data for a fresh deployment: an operator account and two sample books.
//! The service has no roles, so the "admin" account is an ordinary customer login.
//! Every step checks for existing data first, so running it again is harmless.

use bookstore_core::domain::NewBook;
use bookstore_core::ports::{IdentityService, PortError, StoreService};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::ApiError;
use crate::web::auth::hash_password;

/// Email of the seeded operator account. It has no privileges beyond a customer's.
pub const ADMIN_EMAIL: &str = "admin@bookstore.com";

/// What a seeding run actually created.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub books_created: usize,
}

fn sample_books() -> Vec<NewBook> {
    vec![
        NewBook::new(
            "Sample Book 1",
            "Sample Author",
            Decimal::new(29999, 2),
            "This is a sample book to test your bookstore.",
        ),
        NewBook::new(
            "Sample Book 2",
            "Another Author",
            Decimal::new(39999, 2),
            "Another sample book for your bookstore.",
        ),
    ]
}

/// Creates the admin account (when a password is given and no admin exists)
/// and the sample books (when the catalog is empty).
pub async fn seed_database(
    store: &dyn StoreService,
    identity: &dyn IdentityService,
    admin_password: Option<&str>,
) -> Result<SeedReport, ApiError> {
    let mut report = SeedReport::default();

    match admin_password {
        Some(password) => match identity.get_user_by_email(ADMIN_EMAIL).await {
            Ok(_) => info!("Admin user already exists."),
            Err(PortError::NotFound(_)) => {
                let hash = hash_password(password)?;
                identity.create_user_with_email(ADMIN_EMAIL, &hash).await?;
                info!(
                    "Admin user created: {} (a regular customer account, no admin role)",
                    ADMIN_EMAIL
                );
                report.admin_created = true;
            }
            Err(e) => return Err(e.into()),
        },
        None => info!("ADMIN_PASSWORD not set, skipping admin user."),
    }

    if store.list_books().await?.is_empty() {
        for book in sample_books() {
            store.insert_book(book).await?;
            report.books_created += 1;
        }
        info!("Created {} sample books.", report.books_created);
    } else {
        info!("Books already exist in database.");
    }

    Ok(report)
}
