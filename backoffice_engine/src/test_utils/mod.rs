//! Helpers for tests and local tooling.

mod prepare_env;

pub use prepare_env::prepare_env;
