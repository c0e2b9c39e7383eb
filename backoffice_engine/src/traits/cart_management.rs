use crate::{
    api::errors::CartApiError,
    db_types::{AccountId, Cart, NewProduct, Product},
};

/// Read access to the product catalog. The catalog itself is managed elsewhere; checkout and the cart only ever
/// consume it for authoritative prices.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CartApiError>;

    /// Seam for seeding and tests. There is no HTTP surface for this.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CartApiError>;
}

/// Cart persistence. One cart per principal, created lazily on the first add.
#[allow(async_fn_in_trait)]
pub trait CartManagement: CatalogManagement {
    /// Add a product to the cart, merging quantities when the line already exists. Fails with `ProductNotFound`
    /// when the product reference is dangling.
    async fn add_cart_item(&self, user_id: &AccountId, product_id: i64, quantity: i64) -> Result<Cart, CartApiError>;

    /// Fetch the cart with catalog details populated. An absent cart is returned empty.
    async fn fetch_cart(&self, user_id: &AccountId) -> Result<Cart, CartApiError>;

    /// Replace the quantity of an existing line.
    async fn update_cart_item(
        &self,
        user_id: &AccountId,
        product_id: i64,
        quantity: i64,
    ) -> Result<Cart, CartApiError>;

    /// Drop a line from the cart. Removing an absent line is a no-op.
    async fn remove_cart_item(&self, user_id: &AccountId, product_id: i64) -> Result<Cart, CartApiError>;

    /// Empty the cart, keeping the cart itself.
    async fn clear_cart(&self, user_id: &AccountId) -> Result<(), CartApiError>;
}
