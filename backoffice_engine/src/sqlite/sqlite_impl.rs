use std::fmt::Debug;

use bo_common::Paise;
use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use crate::{
    api::errors::{AuthApiError, CartApiError, CheckoutApiError, StaffApiError},
    db_types::{
        AccountId,
        Cart,
        NewProduct,
        NewUser,
        Order,
        OrderItem,
        OrderWithItems,
        PaymentMethod,
        Product,
        Resignation,
        ResignationStatus,
        Staff,
        StaffProfileUpdate,
        StaffRegistration,
        StaffStatus,
        User,
        UserProfileUpdate,
    },
    sqlite::db::{carts, orders, products, staff, users},
    traits::{AuthManagement, CartManagement, CatalogManagement, CheckoutDatabase, StaffManagement},
};

use super::db::{new_pool, run_migrations};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        run_migrations(&pool).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

//--------------------------------------    AuthManagement    --------------------------------------------------------

impl AuthManagement for SqliteDatabase {
    async fn fetch_user_by_id(&self, id: &AccountId) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_id(id, &mut conn).await?)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_email(email, &mut conn).await?)
    }

    async fn fetch_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_google_id(google_id, &mut conn).await?)
    }

    async fn fetch_staff_by_id(&self, id: &AccountId) -> Result<Option<Staff>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::fetch_staff_by_id(id, &mut conn).await?)
    }

    async fn fetch_staff_by_email(&self, email: &str) -> Result<Option<Staff>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::fetch_staff_by_email(email, &mut conn).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::insert_user(user, &mut conn).await?)
    }

    async fn link_google_id(&self, id: &AccountId, google_id: &str) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::link_google_id(id, google_id, &mut conn).await?)
    }

    async fn update_user_profile(
        &self,
        id: &AccountId,
        update: UserProfileUpdate,
    ) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::update_user_profile(id, update, &mut conn).await?)
    }

    async fn set_user_verification(&self, id: &AccountId, verified: bool) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::set_user_verification(id, verified, &mut conn).await?)
    }

    async fn fetch_all_users(&self) -> Result<Vec<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_all_users(&mut conn).await?)
    }

    async fn count_users(&self) -> Result<i64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::count_users(&mut conn).await?)
    }

    async fn upsert_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::upsert_reset_ticket(email, token_hash, expires_at, &mut conn).await?)
    }

    async fn redeem_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::redeem_reset_ticket(email, token_hash, new_password_hash, now, &mut conn).await?)
    }
}

//--------------------------------------   StaffManagement    --------------------------------------------------------

impl StaffManagement for SqliteDatabase {
    async fn insert_invited_staff(&self, email: &str, invited_by: Option<&str>) -> Result<Staff, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::insert_invited_staff(email, invited_by, &mut conn).await?)
    }

    async fn complete_staff_registration(
        &self,
        email: &str,
        registration: StaffRegistration,
    ) -> Result<Staff, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::complete_staff_registration(email, registration, &mut conn).await?)
    }

    async fn approve_staff(
        &self,
        id: &AccountId,
        joining_date: DateTime<Utc>,
    ) -> Result<Option<Staff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::approve_staff(id, joining_date, &mut conn).await?)
    }

    async fn set_staff_status(&self, id: &AccountId, status: StaffStatus) -> Result<Option<Staff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::set_staff_status(id, status, &mut conn).await?)
    }

    async fn update_staff_profile(
        &self,
        id: &AccountId,
        update: StaffProfileUpdate,
    ) -> Result<Option<Staff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::update_staff_profile(id, update, &mut conn).await?)
    }

    async fn delete_staff(&self, id: &AccountId) -> Result<bool, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::delete_staff(id, &mut conn).await?)
    }

    async fn fetch_all_staff(&self) -> Result<Vec<Staff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::fetch_all_staff(&mut conn).await?)
    }

    async fn count_staff(&self) -> Result<i64, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::count_staff(&mut conn).await?)
    }

    async fn insert_resignation(&self, staff_id: &AccountId, reason: &str) -> Result<Resignation, StaffApiError> {
        let mut tx = self.pool.begin().await?;
        let id = staff::insert_resignation(staff_id, reason, &mut tx).await?;
        let resignation = staff::fetch_resignation(id, &mut tx)
            .await?
            .ok_or(StaffApiError::ResignationNotFound)?;
        tx.commit().await?;
        Ok(resignation)
    }

    async fn fetch_resignations(&self) -> Result<Vec<Resignation>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(staff::fetch_resignations(&mut conn).await?)
    }

    async fn process_resignation(
        &self,
        id: i64,
        approve: bool,
        admin_comment: Option<&str>,
    ) -> Result<Resignation, StaffApiError> {
        let mut tx = self.pool.begin().await?;
        let resignation =
            staff::fetch_resignation(id, &mut tx).await?.ok_or(StaffApiError::ResignationNotFound)?;
        if resignation.status != ResignationStatus::Pending {
            return Err(StaffApiError::ResignationAlreadyProcessed);
        }
        staff::update_resignation_status(id, approve, admin_comment, &mut tx).await?;
        if approve {
            // Resignation approval is what retires the worker account.
            staff::set_staff_status(&resignation.staff_id, StaffStatus::Deactivated, &mut tx).await?;
            debug!("🗃️ Staff {} deactivated following resignation #{id}", resignation.staff_id);
        }
        let updated = staff::fetch_resignation(id, &mut tx).await?.ok_or(StaffApiError::ResignationNotFound)?;
        tx.commit().await?;
        Ok(updated)
    }
}

//--------------------------------------  CatalogManagement   --------------------------------------------------------

impl CatalogManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(product_id, &mut conn).await?)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::insert_product(product, &mut conn).await?)
    }
}

//--------------------------------------    CartManagement    --------------------------------------------------------

impl CartManagement for SqliteDatabase {
    async fn add_cart_item(&self, user_id: &AccountId, product_id: i64, quantity: i64) -> Result<Cart, CartApiError> {
        let mut tx = self.pool.begin().await?;
        if products::fetch_product(product_id, &mut tx).await?.is_none() {
            return Err(CartApiError::ProductNotFound(product_id));
        }
        carts::ensure_cart(user_id, &mut tx).await?;
        carts::upsert_item(user_id, product_id, quantity, &mut tx).await?;
        let items = carts::fetch_lines(user_id, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Cart for {user_id} now has {} lines", items.len());
        Ok(Cart { user_id: user_id.clone(), items })
    }

    async fn fetch_cart(&self, user_id: &AccountId) -> Result<Cart, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_lines(user_id, &mut conn).await?;
        Ok(Cart { user_id: user_id.clone(), items })
    }

    async fn update_cart_item(
        &self,
        user_id: &AccountId,
        product_id: i64,
        quantity: i64,
    ) -> Result<Cart, CartApiError> {
        let mut tx = self.pool.begin().await?;
        if !carts::cart_exists(user_id, &mut tx).await? {
            return Err(CartApiError::CartNotFound);
        }
        if !carts::set_item_quantity(user_id, product_id, quantity, &mut tx).await? {
            return Err(CartApiError::ItemNotFound(product_id));
        }
        let items = carts::fetch_lines(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Cart { user_id: user_id.clone(), items })
    }

    async fn remove_cart_item(&self, user_id: &AccountId, product_id: i64) -> Result<Cart, CartApiError> {
        let mut tx = self.pool.begin().await?;
        if !carts::cart_exists(user_id, &mut tx).await? {
            return Err(CartApiError::CartNotFound);
        }
        carts::remove_item(user_id, product_id, &mut tx).await?;
        let items = carts::fetch_lines(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Cart { user_id: user_id.clone(), items })
    }

    async fn clear_cart(&self, user_id: &AccountId) -> Result<(), CartApiError> {
        let mut conn = self.pool.acquire().await?;
        if !carts::cart_exists(user_id, &mut conn).await? {
            return Err(CartApiError::CartNotFound);
        }
        carts::clear_items(user_id, &mut conn).await?;
        Ok(())
    }
}

//--------------------------------------   CheckoutDatabase   --------------------------------------------------------

impl CheckoutDatabase for SqliteDatabase {
    async fn checkout(
        &self,
        user_id: &AccountId,
        method: PaymentMethod,
        payment_id: Option<&str>,
    ) -> Result<OrderWithItems, CheckoutApiError> {
        let mut tx = self.pool.begin().await?;
        let raw_items = carts::fetch_raw_items(user_id, &mut tx).await?;
        if raw_items.is_empty() {
            return Err(CheckoutApiError::EmptyCart);
        }
        // Unit prices come from the catalog at this moment, never from the request.
        let mut lines = Vec::with_capacity(raw_items.len());
        for item in &raw_items {
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(CheckoutApiError::ProductUnavailable(item.product_id))?;
            lines.push((product, item.quantity));
        }
        let total: Paise = lines.iter().map(|(p, qty)| p.unit_price * *qty).sum();
        let order = orders::insert_order(user_id, total, method, payment_id, &mut tx).await?;
        for (product, quantity) in &lines {
            orders::insert_order_item(order.id, product.id, &product.name, *quantity, product.unit_price, &mut tx)
                .await?;
        }
        carts::delete_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Checkout complete for {user_id}: order #{} with {} lines totalling {total}",
            order.id,
            lines.len()
        );
        let items = lines
            .into_iter()
            .map(|(product, quantity)| OrderItem {
                product_id: product.id,
                product_name: product.name,
                quantity,
                unit_price: product.unit_price,
            })
            .collect();
        Ok(OrderWithItems { order, items })
    }

    async fn fetch_orders_for_user(&self, user_id: &AccountId) -> Result<Vec<OrderWithItems>, CheckoutApiError> {
        let mut conn = self.pool.acquire().await?;
        let order_rows = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        let mut result = Vec::with_capacity(order_rows.len());
        for order in order_rows {
            let items = orders::fetch_order_items(order.id, &mut conn).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, CheckoutApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn mark_order_paid(&self, order_id: i64, payment_id: &str) -> Result<Order, CheckoutApiError> {
        use crate::db_types::OrderStatusType::*;
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(CheckoutApiError::OrderNotFound(order_id))?;
        match order.status {
            Paid => return Err(CheckoutApiError::PaymentAlreadyConfirmed(order_id)),
            Pending => {},
            other => {
                return Err(CheckoutApiError::InvalidOrderState { order_id, status: other.to_string() });
            },
        }
        let updated = orders::mark_paid(order_id, payment_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} is now Paid (payment {payment_id})");
        Ok(updated)
    }
}
