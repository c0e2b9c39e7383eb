use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::CartApiError,
    db_types::{AccountId, Cart},
    traits::CartManagement,
};

/// `CartApi` fronts cart mutation. Quantity rules live here; persistence details stay behind the trait.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    /// Add a product to the cart. Adding a product already in the cart increments its quantity.
    pub async fn add_item(&self, user_id: &AccountId, product_id: i64, quantity: i64) -> Result<Cart, CartApiError> {
        if quantity <= 0 {
            return Err(CartApiError::InvalidQuantity);
        }
        let cart = self.db.add_cart_item(user_id, product_id, quantity).await?;
        debug!("🛒️ Added {quantity} × product {product_id} to cart for {user_id}");
        Ok(cart)
    }

    pub async fn get_cart(&self, user_id: &AccountId) -> Result<Cart, CartApiError> {
        self.db.fetch_cart(user_id).await
    }

    /// Replace a line's quantity.
    pub async fn update_item(
        &self,
        user_id: &AccountId,
        product_id: i64,
        quantity: i64,
    ) -> Result<Cart, CartApiError> {
        if quantity <= 0 {
            return Err(CartApiError::InvalidQuantity);
        }
        self.db.update_cart_item(user_id, product_id, quantity).await
    }

    pub async fn remove_item(&self, user_id: &AccountId, product_id: i64) -> Result<Cart, CartApiError> {
        self.db.remove_cart_item(user_id, product_id).await
    }

    /// Empty the cart without deleting it.
    pub async fn clear(&self, user_id: &AccountId) -> Result<(), CartApiError> {
        self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cart cleared for {user_id}");
        Ok(())
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
