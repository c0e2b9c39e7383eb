use chrono::{DateTime, Utc};

use crate::{
    api::errors::AuthApiError,
    db_types::{AccountId, NewUser, Staff, User, UserProfileUpdate},
};

/// Storage operations behind authentication and identity resolution.
///
/// Both principal stores are visible here because resolution has to search them in a fixed order (staff before
/// users). The uniqueness of emails (and linked google ids) is the backend's responsibility — implementations must
/// enforce it with constraints, not lookups, and report violations as [`AuthApiError::DuplicateAccount`].
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_user_by_id(&self, id: &AccountId) -> Result<Option<User>, AuthApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;

    async fn fetch_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AuthApiError>;

    async fn fetch_staff_by_id(&self, id: &AccountId) -> Result<Option<Staff>, AuthApiError>;

    async fn fetch_staff_by_email(&self, email: &str) -> Result<Option<Staff>, AuthApiError>;

    /// Insert a new self-registered account. Fails with `DuplicateAccount` when the email (or google id) is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Attach an external identity to an existing account.
    async fn link_google_id(&self, id: &AccountId, google_id: &str) -> Result<User, AuthApiError>;

    /// Apply a partial profile update. Returns `None` if the account does not exist.
    async fn update_user_profile(&self, id: &AccountId, update: UserProfileUpdate)
        -> Result<Option<User>, AuthApiError>;

    /// Toggle the verification flags. Returns `None` if the account does not exist.
    async fn set_user_verification(&self, id: &AccountId, verified: bool) -> Result<Option<User>, AuthApiError>;

    async fn fetch_all_users(&self) -> Result<Vec<User>, AuthApiError>;

    async fn count_users(&self) -> Result<i64, AuthApiError>;

    /// Store a reset ticket on the account, replacing any live ticket. Returns `false` when the email is unknown
    /// (the caller decides how much of that to reveal).
    async fn upsert_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthApiError>;

    /// Atomically consume a live, unexpired ticket and set the new password hash. Returns `false` when the ticket
    /// does not match or has expired.
    async fn redeem_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthApiError>;
}
