use backoffice_engine::{
    db_types::{
        AccountId,
        Cart,
        NewProduct,
        NewUser,
        Order,
        OrderStatusType,
        OrderWithItems,
        PaymentMethod,
        Principal,
        Product,
        Resignation,
        Role,
        Staff,
        StaffProfileUpdate,
        StaffRegistration,
        StaffStatus,
        User,
        UserProfileUpdate,
        VerificationStatus,
    },
    traits::{AuthManagement, CartManagement, CatalogManagement, CheckoutDatabase, StaffManagement},
    AuthApiError,
    CartApiError,
    CheckoutApiError,
    StaffApiError,
};
use bo_common::{Paise, Secret};
use chrono::{DateTime, Utc};
use mockall::mock;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::AuthConfig,
    integrations::{GatewayError, GatewayOrder, Mailer, MailerError, PaymentGateway},
};

mock! {
    pub Backend {}

    impl AuthManagement for Backend {
        async fn fetch_user_by_id(&self, id: &AccountId) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_staff_by_id(&self, id: &AccountId) -> Result<Option<Staff>, AuthApiError>;
        async fn fetch_staff_by_email(&self, email: &str) -> Result<Option<Staff>, AuthApiError>;
        async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn link_google_id(&self, id: &AccountId, google_id: &str) -> Result<User, AuthApiError>;
        async fn update_user_profile(&self, id: &AccountId, update: UserProfileUpdate) -> Result<Option<User>, AuthApiError>;
        async fn set_user_verification(&self, id: &AccountId, verified: bool) -> Result<Option<User>, AuthApiError>;
        async fn fetch_all_users(&self) -> Result<Vec<User>, AuthApiError>;
        async fn count_users(&self) -> Result<i64, AuthApiError>;
        async fn upsert_reset_ticket(&self, email: &str, token_hash: &str, expires_at: DateTime<Utc>) -> Result<bool, AuthApiError>;
        async fn redeem_reset_ticket(&self, email: &str, token_hash: &str, new_password_hash: &str, now: DateTime<Utc>) -> Result<bool, AuthApiError>;
    }

    impl StaffManagement for Backend {
        async fn insert_invited_staff<'a>(&self, email: &str, invited_by: Option<&'a str>) -> Result<Staff, StaffApiError>;
        async fn complete_staff_registration(&self, email: &str, registration: StaffRegistration) -> Result<Staff, StaffApiError>;
        async fn approve_staff(&self, id: &AccountId, joining_date: DateTime<Utc>) -> Result<Option<Staff>, StaffApiError>;
        async fn set_staff_status(&self, id: &AccountId, status: StaffStatus) -> Result<Option<Staff>, StaffApiError>;
        async fn update_staff_profile(&self, id: &AccountId, update: StaffProfileUpdate) -> Result<Option<Staff>, StaffApiError>;
        async fn delete_staff(&self, id: &AccountId) -> Result<bool, StaffApiError>;
        async fn fetch_all_staff(&self) -> Result<Vec<Staff>, StaffApiError>;
        async fn count_staff(&self) -> Result<i64, StaffApiError>;
        async fn insert_resignation(&self, staff_id: &AccountId, reason: &str) -> Result<Resignation, StaffApiError>;
        async fn fetch_resignations(&self) -> Result<Vec<Resignation>, StaffApiError>;
        async fn process_resignation<'a>(&self, id: i64, approve: bool, admin_comment: Option<&'a str>) -> Result<Resignation, StaffApiError>;
    }

    impl CatalogManagement for Backend {
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CartApiError>;
        async fn insert_product(&self, product: NewProduct) -> Result<Product, CartApiError>;
    }

    impl CartManagement for Backend {
        async fn add_cart_item(&self, user_id: &AccountId, product_id: i64, quantity: i64) -> Result<Cart, CartApiError>;
        async fn fetch_cart(&self, user_id: &AccountId) -> Result<Cart, CartApiError>;
        async fn update_cart_item(&self, user_id: &AccountId, product_id: i64, quantity: i64) -> Result<Cart, CartApiError>;
        async fn remove_cart_item(&self, user_id: &AccountId, product_id: i64) -> Result<Cart, CartApiError>;
        async fn clear_cart(&self, user_id: &AccountId) -> Result<(), CartApiError>;
    }

    impl CheckoutDatabase for Backend {
        async fn checkout<'a>(&self, user_id: &AccountId, method: PaymentMethod, payment_id: Option<&'a str>) -> Result<OrderWithItems, CheckoutApiError>;
        async fn fetch_orders_for_user(&self, user_id: &AccountId) -> Result<Vec<OrderWithItems>, CheckoutApiError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, CheckoutApiError>;
        async fn mark_order_paid(&self, order_id: i64, payment_id: &str) -> Result<Order, CheckoutApiError>;
    }
}

mock! {
    pub MailSender {}

    impl Mailer for MailSender {
        async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
    }
}

mock! {
    pub Gateway {}

    impl PaymentGateway for Gateway {
        async fn create_order(&self, amount: Paise, currency: &str) -> Result<GatewayOrder, GatewayError>;
    }
}

//----------------------------------------------   Fixtures  ----------------------------------------------------

pub const TEST_SECRET: &str = "endpoint-test-secret-0123456789";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new(TEST_SECRET.to_string()) }
}

pub fn token_for(principal: &Principal) -> String {
    TokenIssuer::new(&test_auth_config()).issue_access_token(principal).unwrap()
}

pub fn test_verifier() -> TokenVerifier {
    TokenVerifier::new(&test_auth_config())
}

pub fn make_user(id: &str, role: Role) -> User {
    User {
        id: AccountId(id.to_string()),
        email: format!("{id}@example.com"),
        password_hash: None,
        google_id: None,
        role,
        name: Some(id.to_string()),
        phone: None,
        pincode: None,
        store_name: None,
        store_address: None,
        landmark: None,
        is_active: true,
        is_blocked: false,
        verification_status: VerificationStatus::Pending,
        is_verified: false,
        reset_token_hash: None,
        reset_token_expires_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_staff(id: &str, status: StaffStatus) -> Staff {
    Staff {
        id: AccountId(id.to_string()),
        email: format!("{id}@example.com"),
        password_hash: None,
        role: Some(Role::Staff),
        status,
        is_registered: true,
        name: Some(id.to_string()),
        address: Some("12 Market Road".to_string()),
        phone: Some("9876543210".to_string()),
        gender: None,
        pincode: Some("685566".to_string()),
        invited_by: None,
        date_of_joining: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_order(id: i64, user: &str, total: i64, status: OrderStatusType) -> Order {
    Order {
        id,
        user_id: AccountId(user.to_string()),
        total_amount: Paise::from(total),
        payment_method: PaymentMethod::Cod,
        payment_id: None,
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
