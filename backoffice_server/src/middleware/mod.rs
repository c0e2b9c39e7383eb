mod acl;
mod authn;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use authn::{AuthnMiddlewareFactory, AuthnMiddlewareService};
