//! Behaviour contracts for storage backends.
//!
//! The HTTP layer and the API structs are generic over these traits, so endpoint tests can substitute mocks and a
//! different backend can be slotted in without touching handlers.

mod auth_management;
mod cart_management;
mod checkout_database;
mod staff_management;

pub use auth_management::AuthManagement;
pub use cart_management::{CartManagement, CatalogManagement};
pub use checkout_database::CheckoutDatabase;
pub use staff_management::StaffManagement;
