// tests/storefront_tests.rs
mod common;
use common::*;

use bookstore_core::{OrderLine, PortError, StoreService, StoreTransaction};

#[tokio::test]
async fn test_catalog_lists_books_in_insertion_order() {
    let (storefront, _store, books) = seeded_storefront().await;

    let first = storefront.list_catalog().await.unwrap();
    let second = storefront.list_catalog().await.unwrap();

    assert_eq!(first, books);
    assert_eq!(first, second);
    assert!(first[0].id < first[1].id);
    assert_eq!(first[0].price, price("299.99"));
}

#[tokio::test]
async fn test_book_detail_missing_is_not_found() {
    let (storefront, _store, _books) = seeded_storefront().await;

    match storefront.book_detail(999).await {
        Err(PortError::NotFound(msg)) => assert!(msg.contains("999")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_add_to_cart_twice_increments_single_line() {
    let (storefront, _store, books) = seeded_storefront().await;
    let alice = customer();

    let first = storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    assert_eq!(first.quantity, 1);
    let second = storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    assert_eq!(second.quantity, 2);
    assert_eq!(first.id, second.id);

    let cart = storefront.view_cart(&alice).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].book_id, books[0].id);
    assert_eq!(cart[0].quantity, 2);
}

#[tokio::test]
async fn test_add_unknown_book_creates_nothing() {
    let (storefront, _store, _books) = seeded_storefront().await;
    let alice = customer();

    let result = storefront.add_to_cart(&alice, 42).await;
    assert!(matches!(result, Err(PortError::NotFound(_))));
    assert!(storefront.view_cart(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_empty_cart_creates_no_order() {
    let (storefront, _store, _books) = seeded_storefront().await;
    let alice = customer();

    assert!(storefront.checkout(&alice).await.unwrap().is_none());
    assert!(storefront.list_orders(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_snapshots_cart_and_clears_it() {
    let (storefront, _store, books) = seeded_storefront().await;
    let alice = customer();

    storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    storefront.add_to_cart(&alice, books[1].id).await.unwrap();

    let order = storefront.checkout(&alice).await.unwrap().expect("order created");
    assert_eq!(order.user_id, alice.user_id);
    assert_eq!(
        order.lines,
        vec![
            OrderLine { book_id: books[0].id, quantity: 2 },
            OrderLine { book_id: books[1].id, quantity: 1 },
        ]
    );
    assert!(storefront.view_cart(&alice).await.unwrap().is_empty());

    let orders = storefront.list_orders(&alice).await.unwrap();
    assert_eq!(orders, vec![order.clone()]);

    // A second checkout finds nothing left to order.
    assert!(storefront.checkout(&alice).await.unwrap().is_none());
    assert_eq!(storefront.list_orders(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_is_frozen_after_later_adds() {
    let (storefront, _store, books) = seeded_storefront().await;
    let alice = customer();

    storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    let order = storefront.checkout(&alice).await.unwrap().unwrap();

    storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    storefront.add_to_cart(&alice, books[0].id).await.unwrap();

    let stored = storefront.get_order(&alice, order.id).await.unwrap();
    assert_eq!(stored.lines, vec![OrderLine { book_id: books[0].id, quantity: 1 }]);
    assert_eq!(storefront.view_cart(&alice).await.unwrap()[0].quantity, 2);
}

#[tokio::test]
async fn test_carts_and_orders_are_per_user() {
    let (storefront, _store, books) = seeded_storefront().await;
    let alice = customer();
    let bob = customer();

    storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    storefront.add_to_cart(&bob, books[1].id).await.unwrap();

    let order = storefront.checkout(&alice).await.unwrap().unwrap();

    let bob_cart = storefront.view_cart(&bob).await.unwrap();
    assert_eq!(bob_cart.len(), 1);
    assert_eq!(bob_cart[0].book_id, books[1].id);

    assert!(matches!(
        storefront.get_order(&bob, order.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(storefront.list_orders(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_transaction_leaves_no_trace() {
    let (storefront, store, books) = seeded_storefront().await;
    let alice = customer();

    {
        let mut tx = store.begin().await.unwrap();
        tx.insert_cart_line(alice.user_id, books[0].id, 1).await.unwrap();
        tx.create_order(alice.user_id, &[OrderLine { book_id: books[0].id, quantity: 1 }])
            .await
            .unwrap();
        // Dropped without commit.
    }

    assert!(storefront.view_cart(&alice).await.unwrap().is_empty());
    assert!(storefront.list_orders(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_transaction_restores_existing_lines() {
    let (storefront, store, books) = seeded_storefront().await;
    let alice = customer();
    let bob = customer();
    storefront.add_to_cart(&alice, books[0].id).await.unwrap();
    storefront.add_to_cart(&alice, books[1].id).await.unwrap();
    storefront.add_to_cart(&bob, books[0].id).await.unwrap();
    let before = storefront.view_cart(&alice).await.unwrap();

    {
        let mut tx = store.begin().await.unwrap();
        tx.set_cart_line_quantity(before[0].id, 5).await.unwrap();
        tx.insert_cart_line(alice.user_id, books[1].id, 3).await.unwrap();
        let ids: Vec<_> = before.iter().map(|line| line.id).collect();
        assert_eq!(tx.delete_cart_lines(&ids).await.unwrap(), 2);
        tx.create_order(alice.user_id, &[OrderLine { book_id: books[0].id, quantity: 5 }])
            .await
            .unwrap();
    }

    assert_eq!(storefront.view_cart(&alice).await.unwrap(), before);
    assert_eq!(storefront.view_cart(&bob).await.unwrap()[0].quantity, 1);

    // The order id handed out by the dropped transaction is reused.
    let order = storefront.checkout(&alice).await.unwrap().expect("order created");
    assert_eq!(order.id, 1);
    assert_eq!(order.lines.len(), 2);
    assert_eq!(storefront.list_orders(&alice).await.unwrap(), vec![order]);
}

#[tokio::test]
async fn test_concurrent_adds_are_not_lost() {
    let (storefront, _store, books) = seeded_storefront().await;
    let alice = customer();
    let book_id = books[0].id;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let storefront = storefront.clone();
            tokio::spawn(async move { storefront.add_to_cart(&alice, book_id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let cart = storefront.view_cart(&alice).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 8);
}
