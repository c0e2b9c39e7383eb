//! Back-office engine
//!
//! This library contains the storage and domain flows for the back-office server: principal stores and identity
//! resolution, the worker-account lifecycle, carts, and the checkout/payment-confirmation flow. It is
//! provider-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). Specific backends need to implement the traits in [`mod@traits`] in
//!    order to act as a backend for the server.
mod api;

pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db_url, SqliteDatabase};

pub use api::{
    auth_api::{AuthApi, ProfileChanges},
    cart_api::CartApi,
    errors::{AuthApiError, CartApiError, CheckoutApiError, StaffApiError},
    order_flow_api::OrderFlowApi,
    staff_api::{RegistrationForm, StaffApi, StaffProfileChanges},
};
