use std::{fmt::Display, str::FromStr};

use bo_common::Paise;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------      AccountId       --------------------------------------------------------
/// A random hex identifier for a principal.
///
/// Users and invited staff live in separate tables but share this id namespace, so an id resolves to at most one
/// principal across both stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AccountId(pub String);

impl FromStr for AccountId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Role          --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Staff => write!(f, "staff"),
            Role::User => write!(f, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "user" => Ok(Self::User),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------  VerificationStatus  --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    NotVerified,
}

impl Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::NotVerified => write!(f, "not_verified"),
        }
    }
}

//--------------------------------------     StaffStatus      --------------------------------------------------------
/// Lifecycle of an invited worker account.
///
/// `Invited` → `Pending` (registration submitted) → `Active` (admin approval) ⇄ `Deactivated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    Invited,
    Pending,
    Active,
    Deactivated,
}

impl Display for StaffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffStatus::Invited => write!(f, "invited"),
            StaffStatus::Pending => write!(f, "pending"),
            StaffStatus::Active => write!(f, "active"),
            StaffStatus::Deactivated => write!(f, "deactivated"),
        }
    }
}

impl FromStr for StaffStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "invited" => Ok(Self::Invited),
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            s => Err(ConversionError(format!("Invalid staff status: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created but no payment has been confirmed.
    Pending,
    /// Payment for the order has been confirmed.
    Paid,
    /// The order has been handed to the courier.
    Shipped,
    /// The order has been delivered to the customer.
    Delivered,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[sqlx(rename = "COD")]
    #[serde(rename = "COD")]
    Cod,
    Online,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "COD"),
            PaymentMethod::Online => write!(f, "Online"),
        }
    }
}

//--------------------------------------        User          --------------------------------------------------------
/// A self-registered account. The password hash is absent only when the account was created (or linked) via an
/// external identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: AccountId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: Role,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub pincode: Option<String>,
    pub store_name: Option<String>,
    pub store_address: Option<String>,
    pub landmark: Option<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub verification_status: VerificationStatus,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: Role,
    pub name: Option<String>,
}

impl NewUser {
    pub fn with_password(email: String, password_hash: String) -> Self {
        Self { email, password_hash: Some(password_hash), google_id: None, role: Role::User, name: None }
    }

    pub fn from_google(email: String, google_id: String, name: Option<String>) -> Self {
        Self { email, password_hash: None, google_id: Some(google_id), role: Role::User, name }
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub pincode: Option<String>,
    pub store_name: Option<String>,
    pub store_address: Option<String>,
    pub landmark: Option<String>,
    pub password_hash: Option<String>,
}

//--------------------------------------        Staff         --------------------------------------------------------
/// An invited worker account. Until registration completes, only the email (and inviter) are populated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Staff {
    pub id: AccountId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub status: StaffStatus,
    pub is_registered: bool,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub pincode: Option<String>,
    pub invited_by: Option<String>,
    pub date_of_joining: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a worker submits when completing their invited registration.
#[derive(Debug, Clone)]
pub struct StaffRegistration {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub gender: Option<String>,
    pub pincode: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct StaffProfileUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub pincode: Option<String>,
    pub password_hash: Option<String>,
}

//--------------------------------------      Principal       --------------------------------------------------------
/// Any identity capable of authenticating: a self-registered user or an invited worker.
///
/// The identity resolver is the only place that knows the search order across the two stores; everything downstream
/// works against this enum.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    Staff(Staff),
}

impl Principal {
    pub fn id(&self) -> &AccountId {
        match self {
            Principal::User(u) => &u.id,
            Principal::Staff(s) => &s.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::User(u) => &u.email,
            Principal::Staff(s) => &s.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::User(u) => u.role,
            Principal::Staff(s) => s.role.unwrap_or(Role::Staff),
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Principal::User(u) => u.password_hash.as_deref(),
            Principal::Staff(s) => s.password_hash.as_deref(),
        }
    }

    /// Human-readable name; falls back to the mailbox part of the email.
    pub fn display_name(&self) -> String {
        let name = match self {
            Principal::User(u) => u.name.as_deref(),
            Principal::Staff(s) => s.name.as_deref(),
        };
        match name {
            Some(n) => n.to_string(),
            None => self.email().split('@').next().unwrap_or_default().to_string(),
        }
    }
}

//--------------------------------------    GoogleProfile     --------------------------------------------------------
/// The subset of an external identity assertion this system depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

//--------------------------------------       Product        --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit_price: Paise,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub unit_price: Paise,
}

//--------------------------------------        Cart          --------------------------------------------------------
/// One line of a cart, joined with the catalog entry it references.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartLine {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Paise,
    pub quantity: i64,
}

/// A principal's cart. An absent cart row and an empty cart are indistinguishable to callers.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub user_id: AccountId,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn empty(user_id: AccountId) -> Self {
        Self { user_id, items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//--------------------------------------        Order         --------------------------------------------------------
/// An immutable order record. Unit prices were captured from the catalog at checkout time and never change.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: AccountId,
    pub total_amount: Paise,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Paise,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------     Resignation      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResignationStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for ResignationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResignationStatus::Pending => write!(f, "pending"),
            ResignationStatus::Approved => write!(f, "approved"),
            ResignationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A staff resignation request, joined with the worker's name and email for display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resignation {
    pub id: i64,
    pub staff_id: AccountId,
    pub staff_name: Option<String>,
    pub staff_email: Option<String>,
    pub reason: String,
    pub status: ResignationStatus,
    pub admin_comment: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::Admin, Role::Staff, Role::User] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn staff_status_round_trip() {
        for status in [StaffStatus::Invited, StaffStatus::Pending, StaffStatus::Active, StaffStatus::Deactivated] {
            assert_eq!(StaffStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn order_status_is_case_sensitive() {
        assert_eq!(OrderStatusType::from_str("Paid").unwrap(), OrderStatusType::Paid);
        assert!(OrderStatusType::from_str("paid").is_err());
    }

    #[test]
    fn principal_role_defaults_to_staff_before_approval() {
        let staff = Staff {
            id: AccountId("s1".into()),
            email: "worker@example.com".into(),
            password_hash: None,
            role: None,
            status: StaffStatus::Pending,
            is_registered: true,
            name: None,
            address: None,
            phone: None,
            gender: None,
            pincode: None,
            invited_by: None,
            date_of_joining: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let principal = Principal::Staff(staff);
        assert_eq!(principal.role(), Role::Staff);
        assert_eq!(principal.display_name(), "worker");
    }
}
