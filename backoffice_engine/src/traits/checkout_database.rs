use crate::{
    api::errors::CheckoutApiError,
    db_types::{AccountId, Order, OrderWithItems, PaymentMethod},
};

use super::CartManagement;

/// The checkout flow and order persistence.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: CartManagement {
    /// Convert the principal's cart into an immutable order, in a single atomic transaction:
    ///
    /// 1. load the cart — `EmptyCart` when absent or without lines;
    /// 2. resolve every line's unit price from the catalog — `ProductUnavailable` when a reference dangles;
    /// 3. total = Σ(quantity × catalog price); client-supplied prices never participate;
    /// 4. persist the order, `Paid` for online payments and `Pending` otherwise;
    /// 5. delete the cart entirely.
    ///
    /// Any failure rolls the transaction back, leaving the cart untouched.
    async fn checkout(
        &self,
        user_id: &AccountId,
        method: PaymentMethod,
        payment_id: Option<&str>,
    ) -> Result<OrderWithItems, CheckoutApiError>;

    /// All orders for a principal, newest first, with their lines.
    async fn fetch_orders_for_user(&self, user_id: &AccountId) -> Result<Vec<OrderWithItems>, CheckoutApiError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, CheckoutApiError>;

    /// Transition an order `Pending` → `Paid`, recording the gateway payment id. A repeat confirmation fails with
    /// `PaymentAlreadyConfirmed` so callers can treat retries as a no-op; any other state is an error.
    async fn mark_order_paid(&self, order_id: i64, payment_id: &str) -> Result<Order, CheckoutApiError>;
}
