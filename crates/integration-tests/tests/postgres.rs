//! Repository and location store tests against a real `PostgreSQL`.
//!
//! Each test migrates the database named by `TEST_DATABASE_URL` and works
//! in its own rows. Point it at a disposable database.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use foodcart_core::{Coordinates, OrderStatus};
use foodcart_dispatch::db::{DispatchSource, PgDispatchSource, PgLocationStore};
use foodcart_dispatch::geocoder::LocationStore;
use foodcart_dispatch::models::Location;

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("database should be reachable");
    sqlx::migrate!("../dispatch/migrations")
        .run(&pool)
        .await
        .expect("migrations should apply");
    pool
}

fn unique(label: &str) -> String {
    format!("{label} {}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_location_upsert_round_trip() {
    let store = PgLocationStore::new(pool().await);
    let address = unique("Moscow, Arbat");

    store
        .save(&Location::new(address.clone(), None, Utc::now()))
        .await
        .expect("insert");
    let coords = Coordinates::new(55.75, 37.59).expect("valid coordinates");
    store
        .save(&Location::new(address.clone(), Some(coords), Utc::now()))
        .await
        .expect("upsert");

    let loaded = store
        .load_many(std::slice::from_ref(&address))
        .await
        .expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.first().and_then(|l| l.coordinates), Some(coords));
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_active_orders_load_with_items() {
    let pool = pool().await;
    let restaurant = unique("Arbat");

    let restaurant_id: i32 = sqlx::query_scalar(
        "INSERT INTO restaurants (name, address) VALUES ($1, 'Moscow, Arbat 10') RETURNING id",
    )
    .bind(&restaurant)
    .fetch_one(&pool)
    .await
    .expect("restaurant");
    let product_id: i32 = sqlx::query_scalar(
        "INSERT INTO products (name, price) VALUES ($1, 199.00) RETURNING id",
    )
    .bind(unique("Burger"))
    .fetch_one(&pool)
    .await
    .expect("product");
    sqlx::query("INSERT INTO menu_items (restaurant_id, product_id) VALUES ($1, $2)")
        .bind(restaurant_id)
        .bind(product_id)
        .execute(&pool)
        .await
        .expect("menu item");
    let order_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO orders (firstname, lastname, phonenumber, address, status)
        VALUES ('Maria', 'Kuznetsova', '+79161234567', 'Moscow, Tverskaya 7', 1)
        RETURNING id
        ",
    )
    .fetch_one(&pool)
    .await
    .expect("order");
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, 3, 199.00)")
        .bind(order_id)
        .bind(product_id)
        .execute(&pool)
        .await
        .expect("order item");

    let source = PgDispatchSource::new(pool);
    let orders = tokio::time::timeout(Duration::from_secs(10), source.active_orders())
        .await
        .expect("query should not hang")
        .expect("orders");
    let order = orders
        .iter()
        .find(|o| o.id.as_i32() == order_id)
        .expect("inserted order is active");

    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.price_total().to_string(), "597.00");

    let menu = source.menu_items(true).await.expect("menu");
    assert!(
        menu.iter()
            .any(|m| m.restaurant_id.as_i32() == restaurant_id && m.product_id.as_i32() == product_id)
    );
}
