use bo_common::Paise;
use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{AccountId, Order, OrderItem, PaymentMethod};

pub async fn insert_order(
    user_id: &AccountId,
    total_amount: Paise,
    method: PaymentMethod,
    payment_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let status = match method {
        PaymentMethod::Online => "Paid",
        PaymentMethod::Cod => "Pending",
    };
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, total_amount, payment_method, payment_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id.as_str())
    .bind(total_amount)
    .bind(method)
    .bind(payment_id)
    .bind(status)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} saved for account {} ({})", order.id, order.user_id, order.total_amount);
    Ok(order)
}

pub async fn insert_order_item(
    order_id: i64,
    product_id: i64,
    product_name: &str,
    quantity: i64,
    unit_price: Paise,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(quantity)
    .bind(unit_price)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT product_id, product_name, quantity, unit_price FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn fetch_orders_for_user(
    user_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn mark_paid(order_id: i64, payment_id: &str, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET status = 'Paid', payment_id = $2, updated_at = $3 WHERE id = $1 RETURNING *")
        .bind(order_id)
        .bind(payment_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
}
