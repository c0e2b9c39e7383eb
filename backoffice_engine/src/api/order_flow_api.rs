use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::CheckoutApiError,
    db_types::{AccountId, Order, OrderWithItems, PaymentMethod},
    traits::CheckoutDatabase,
};

/// `OrderFlowApi` is the primary API for converting carts into orders and attaching verified payments to them.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: CheckoutDatabase
{
    /// Convert the principal's cart into an order. Totals are computed from authoritative catalog prices inside the
    /// backend's transaction; the cart is deleted in the same transaction, so a failed checkout leaves it intact.
    ///
    /// Two concurrent checkouts of the same cart are not mutually excluded here: the loser of the race sees an
    /// empty cart and fails with `EmptyCart`. Backends without serialized writes would need a per-principal lock.
    pub async fn place_order(
        &self,
        user_id: &AccountId,
        method: PaymentMethod,
        payment_id: Option<&str>,
    ) -> Result<OrderWithItems, CheckoutApiError> {
        let placed = self.db.checkout(user_id, method, payment_id).await?;
        info!(
            "🔄️📦️ Order #{} placed for {user_id} via {method}: {} ({} lines)",
            placed.order.id,
            placed.order.total_amount,
            placed.items.len()
        );
        Ok(placed)
    }

    pub async fn orders_for_user(&self, user_id: &AccountId) -> Result<Vec<OrderWithItems>, CheckoutApiError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// Attach a verified gateway payment to its order, moving it `Pending` → `Paid`. The signature check has
    /// already happened at the boundary; this is the state transition it authorises.
    pub async fn confirm_payment(&self, order_id: i64, payment_id: &str) -> Result<Order, CheckoutApiError> {
        trace!("🔄️✅️ Payment {payment_id} is being attached to order #{order_id}");
        let order = self.db.mark_order_paid(order_id, payment_id).await?;
        info!("🔄️✅️ Order #{order_id} confirmed as paid by payment {payment_id}");
        Ok(order)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
