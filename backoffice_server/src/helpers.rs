use backoffice_engine::db_types::{AccountId, Role};
use log::debug;

use crate::{data_objects::RequestIdentity, errors::ServerError};

/// Owner-or-admin gate used by every `:id`-addressed resource.
pub fn assert_self_or_admin(identity: &RequestIdentity, target: &AccountId) -> Result<(), ServerError> {
    if identity.is_admin() || &identity.id == target {
        Ok(())
    } else {
        debug!("💻️ {} attempted to act on {target} without permission", identity.id);
        Err(ServerError::InsufficientPermissions("Unauthorized action".to_string()))
    }
}

/// The client route a principal lands on after login.
pub fn redirect_for_role(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Staff => "/staff",
        Role::User => "/user",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn identity(id: &str, role: Role) -> RequestIdentity {
        RequestIdentity { id: AccountId(id.into()), email: format!("{id}@example.com"), role, name: id.into() }
    }

    #[test]
    fn owners_and_admins_pass_the_gate() {
        let owner = identity("u1", Role::User);
        let admin = identity("a1", Role::Admin);
        let other = identity("u2", Role::User);
        let target = AccountId("u1".into());
        assert!(assert_self_or_admin(&owner, &target).is_ok());
        assert!(assert_self_or_admin(&admin, &target).is_ok());
        assert!(assert_self_or_admin(&other, &target).is_err());
    }

    #[test]
    fn redirects_by_role() {
        assert_eq!(redirect_for_role(Role::Admin), "/admin");
        assert_eq!(redirect_for_role(Role::Staff), "/staff");
        assert_eq!(redirect_for_role(Role::User), "/user");
    }
}
