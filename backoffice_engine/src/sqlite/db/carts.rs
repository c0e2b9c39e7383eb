use sqlx::{FromRow, SqliteConnection};

use crate::db_types::{AccountId, CartLine};

/// A cart line before catalog resolution. Checkout resolves each reference against the catalog itself so that a
/// dangling product reference is reported per line.
#[derive(Debug, Clone, FromRow)]
pub struct RawCartItem {
    pub product_id: i64,
    pub quantity: i64,
}

pub async fn cart_exists(user_id: &AccountId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM carts WHERE user_id = $1").bind(user_id.as_str()).fetch_optional(conn).await?;
    Ok(row.is_some())
}

/// Creates the cart row if it does not exist yet (carts are created lazily on first add).
pub async fn ensure_cart(user_id: &AccountId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// Adds to the quantity of an existing line, or creates the line. The UNIQUE(user_id, product_id) constraint is what
/// makes "adding an already-present product" a merge instead of a duplicate.
pub async fn upsert_item(
    user_id: &AccountId,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity;
        "#,
    )
    .bind(user_id.as_str())
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

/// Replaces the quantity of an existing line. Returns `false` if the line does not exist.
pub async fn set_item_quantity(
    user_id: &AccountId,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2")
        .bind(user_id.as_str())
        .bind(product_id)
        .bind(quantity)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_item(
    user_id: &AccountId,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id.as_str())
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn clear_items(user_id: &AccountId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id.as_str()).execute(conn).await?;
    Ok(())
}

/// Fetches the cart lines joined with their catalog entries, in insertion order.
pub async fn fetch_lines(user_id: &AccountId, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT ci.product_id, p.name AS product_name, p.unit_price, ci.quantity
            FROM cart_items ci INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.id;
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(conn)
    .await
}

pub async fn fetch_raw_items(
    user_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Vec<RawCartItem>, sqlx::Error> {
    sqlx::query_as("SELECT product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY id")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await
}

/// Deletes the cart entirely (the row and its lines). Safe to repeat.
pub async fn delete_cart(user_id: &AccountId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id.as_str()).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id.as_str()).execute(conn).await?;
    Ok(())
}
