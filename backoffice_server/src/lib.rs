//! # Back-office server
//!
//! The HTTP layer of the back-office system. It is responsible for:
//! * authenticating principals (password login, staff invites, Google external login) and issuing bearer tokens;
//! * gating every protected route on role and ownership checks;
//! * the cart and checkout surface, including payment-gateway intent creation and callback verification.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod staff_routes;

#[cfg(test)]
mod endpoint_tests;
