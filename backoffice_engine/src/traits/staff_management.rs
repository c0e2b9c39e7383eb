use chrono::{DateTime, Utc};

use crate::{
    api::errors::StaffApiError,
    db_types::{AccountId, Resignation, Staff, StaffProfileUpdate, StaffRegistration, StaffStatus},
};

use super::AuthManagement;

/// Lifecycle operations for invited worker accounts: invite → registration completion → approval → status changes,
/// plus the resignation workflow that feeds back into the lifecycle.
#[allow(async_fn_in_trait)]
pub trait StaffManagement: AuthManagement {
    /// Create the invited shell record. Fails with `StaffAlreadyExists` when the email is taken.
    async fn insert_invited_staff(&self, email: &str, invited_by: Option<&str>) -> Result<Staff, StaffApiError>;

    /// Fill in the registration fields and move the record to `Pending`.
    async fn complete_staff_registration(
        &self,
        email: &str,
        registration: StaffRegistration,
    ) -> Result<Staff, StaffApiError>;

    /// Activate the worker, assign the staff role and record the joining date. `None` if the id is unknown.
    async fn approve_staff(&self, id: &AccountId, joining_date: DateTime<Utc>) -> Result<Option<Staff>, StaffApiError>;

    async fn set_staff_status(&self, id: &AccountId, status: StaffStatus) -> Result<Option<Staff>, StaffApiError>;

    async fn update_staff_profile(
        &self,
        id: &AccountId,
        update: StaffProfileUpdate,
    ) -> Result<Option<Staff>, StaffApiError>;

    /// Hard delete. Returns `false` if the id was unknown.
    async fn delete_staff(&self, id: &AccountId) -> Result<bool, StaffApiError>;

    async fn fetch_all_staff(&self) -> Result<Vec<Staff>, StaffApiError>;

    async fn count_staff(&self) -> Result<i64, StaffApiError>;

    async fn insert_resignation(&self, staff_id: &AccountId, reason: &str) -> Result<Resignation, StaffApiError>;

    async fn fetch_resignations(&self) -> Result<Vec<Resignation>, StaffApiError>;

    /// Approve or reject a pending resignation. Approval deactivates the worker in the same transaction.
    async fn process_resignation(
        &self,
        id: i64,
        approve: bool,
        admin_comment: Option<&str>,
    ) -> Result<Resignation, StaffApiError>;
}
