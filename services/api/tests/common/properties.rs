// tests/common/properties.rs
//
// Storage behaviour every `StoreService` implementation must share. Each
// function inserts its own books, so it can run against a store that other
// tests are writing to at the same time.

use std::sync::Arc;

use bookstore_core::{
    Book, Identity, NewBook, OrderLine, PortError, StoreService, StoreTransaction, Storefront,
};
use rust_decimal::Decimal;
use uuid::Uuid;

const MISSING_ID: i64 = i64::MAX;

async fn insert_books(store: &Arc<dyn StoreService>, count: usize) -> Vec<Book> {
    let run = Uuid::new_v4();
    let mut books = Vec::with_capacity(count);
    for n in 0..count {
        let book = store
            .insert_book(NewBook::new(
                format!("Book {} of {}", n, run),
                "Test Author",
                Decimal::new(1999 + n as i64, 2),
                "A book.",
            ))
            .await
            .unwrap();
        books.push(book);
    }
    books
}

pub async fn catalog_keeps_insertion_order(store: Arc<dyn StoreService>) {
    let books = insert_books(&store, 3).await;
    let storefront = Storefront::new(store);

    let catalog = storefront.list_catalog().await.unwrap();
    let positions: Vec<usize> = books
        .iter()
        .map(|book| {
            catalog
                .iter()
                .position(|listed| listed == book)
                .expect("inserted book is listed")
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(storefront.book_detail(books[1].id).await.unwrap(), books[1]);
}

pub async fn adding_twice_increments_one_line(store: Arc<dyn StoreService>, customer: Identity) {
    let books = insert_books(&store, 1).await;
    let storefront = Storefront::new(store);

    let first = storefront.add_to_cart(&customer, books[0].id).await.unwrap();
    let second = storefront.add_to_cart(&customer, books[0].id).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 2);

    let cart = storefront.view_cart(&customer).await.unwrap();
    assert_eq!(cart, vec![second]);
}

pub async fn unknown_book_is_not_found(store: Arc<dyn StoreService>, customer: Identity) {
    let storefront = Storefront::new(store.clone());

    let added = storefront.add_to_cart(&customer, MISSING_ID).await;
    assert!(matches!(added, Err(PortError::NotFound(_))));
    assert!(storefront.view_cart(&customer).await.unwrap().is_empty());

    assert!(matches!(
        store.get_book(MISSING_ID).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        store.get_order(MISSING_ID).await,
        Err(PortError::NotFound(_))
    ));
    let mut tx = store.begin().await.unwrap();
    assert!(matches!(
        tx.set_cart_line_quantity(MISSING_ID, 3).await,
        Err(PortError::NotFound(_))
    ));
}

pub async fn empty_checkout_creates_no_order(store: Arc<dyn StoreService>, customer: Identity) {
    let storefront = Storefront::new(store);

    assert!(storefront.checkout(&customer).await.unwrap().is_none());
    assert!(storefront.list_orders(&customer).await.unwrap().is_empty());
}

pub async fn checkout_snapshots_and_empties_cart(
    store: Arc<dyn StoreService>,
    customer: Identity,
) {
    let books = insert_books(&store, 3).await;
    let storefront = Storefront::new(store.clone());

    // Lines keep the order the books were first added in, not book id order.
    for index in [2, 0, 1, 0] {
        storefront.add_to_cart(&customer, books[index].id).await.unwrap();
    }
    let order = storefront
        .checkout(&customer)
        .await
        .unwrap()
        .expect("order created");
    let expected = vec![
        OrderLine { book_id: books[2].id, quantity: 1 },
        OrderLine { book_id: books[0].id, quantity: 2 },
        OrderLine { book_id: books[1].id, quantity: 1 },
    ];
    assert_eq!(order.user_id, customer.user_id);
    assert_eq!(order.lines, expected);
    assert!(storefront.view_cart(&customer).await.unwrap().is_empty());

    // A later cart does not touch the stored order.
    storefront.add_to_cart(&customer, books[1].id).await.unwrap();
    let second = storefront
        .checkout(&customer)
        .await
        .unwrap()
        .expect("second order created");
    assert!(second.id > order.id);

    let stored = store.get_order(order.id).await.unwrap();
    assert_eq!(stored.lines, expected);
    let history = storefront.list_orders(&customer).await.unwrap();
    assert_eq!(
        history.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![order.id, second.id]
    );
    assert_eq!(history[0].lines, expected);
    assert_eq!(
        history[1].lines,
        vec![OrderLine { book_id: books[1].id, quantity: 1 }]
    );
}

pub async fn dropped_transaction_rolls_back(store: Arc<dyn StoreService>, customer: Identity) {
    let books = insert_books(&store, 2).await;
    let storefront = Storefront::new(store.clone());
    storefront.add_to_cart(&customer, books[0].id).await.unwrap();
    let before = storefront.view_cart(&customer).await.unwrap();

    {
        let mut tx = store.begin().await.unwrap();
        tx.set_cart_line_quantity(before[0].id, 9).await.unwrap();
        tx.insert_cart_line(customer.user_id, books[1].id, 1).await.unwrap();
        let locked = tx.lock_cart_lines(customer.user_id).await.unwrap();
        assert_eq!(locked.len(), 2);
        let snapshot: Vec<OrderLine> = locked.iter().map(OrderLine::from).collect();
        tx.create_order(customer.user_id, &snapshot).await.unwrap();
        let ids: Vec<_> = locked.iter().map(|line| line.id).collect();
        assert_eq!(tx.delete_cart_lines(&ids).await.unwrap(), 2);
    }

    assert_eq!(storefront.view_cart(&customer).await.unwrap(), before);
    assert!(storefront.list_orders(&customer).await.unwrap().is_empty());
}

pub async fn concurrent_first_adds_are_not_lost(
    store: Arc<dyn StoreService>,
    customer: Identity,
) {
    let books = insert_books(&store, 1).await;
    let storefront = Storefront::new(store);
    let book_id = books[0].id;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let storefront = storefront.clone();
            tokio::spawn(async move { storefront.add_to_cart(&customer, book_id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let cart = storefront.view_cart(&customer).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 8);
}
