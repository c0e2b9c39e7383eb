use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    api::errors::StaffApiError,
    db_types::{AccountId, Principal, Resignation, Staff, StaffProfileUpdate, StaffRegistration, StaffStatus, User, UserProfileUpdate},
    helpers::{
        hash_password,
        validate_address,
        validate_email,
        validate_password_strength,
        validate_person_name,
        validate_phone,
        validate_pincode,
        validate_staff_registration,
        verify_password,
    },
    traits::StaffManagement,
};

/// The registration form an invited worker submits, with the password still in plaintext.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub gender: Option<String>,
    pub pincode: String,
    pub password: String,
}

/// Profile changes for the logged-in staff member. Changing the password requires proving the current one.
#[derive(Debug, Clone, Default)]
pub struct StaffProfileChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub pincode: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// `StaffApi` drives the worker-account lifecycle: invite → registration → approval → status changes, plus the
/// resignation workflow.
pub struct StaffApi<B> {
    db: B,
}

impl<B> Debug for StaffApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StaffApi")
    }
}

impl<B> StaffApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> StaffApi<B>
where B: StaffManagement
{
    /// Create the invited shell record. An email already owned by a self-registered account blocks the invite;
    /// so does an existing staff record.
    pub async fn invite(&self, email: &str, invited_by: Option<&str>) -> Result<Staff, StaffApiError> {
        let email = email.trim().to_lowercase();
        validate_email(&email).map_err(StaffApiError::Auth)?;
        if self.db.fetch_user_by_email(&email).await.map_err(StaffApiError::Auth)?.is_some() {
            return Err(StaffApiError::EmailBelongsToUser);
        }
        if self.db.fetch_staff_by_email(&email).await.map_err(StaffApiError::Auth)?.is_some() {
            return Err(StaffApiError::StaffAlreadyExists);
        }
        let staff = self.db.insert_invited_staff(&email, invited_by).await?;
        info!("🧑️ Staff invitation recorded for {email}");
        Ok(staff)
    }

    /// Complete an invited registration. The email comes from the verified invite token, never the form.
    pub async fn complete_registration(&self, email: &str, form: RegistrationForm) -> Result<Staff, StaffApiError> {
        let staff =
            self.db.fetch_staff_by_email(email).await.map_err(StaffApiError::Auth)?.ok_or(StaffApiError::StaffNotFound)?;
        if staff.is_registered {
            return Err(StaffApiError::AlreadyRegistered);
        }
        validate_staff_registration(&form.name, &form.address, &form.phone, &form.pincode)
            .map_err(StaffApiError::Auth)?;
        validate_password_strength(&form.password).map_err(StaffApiError::Auth)?;
        let password_hash = hash_password(&form.password).map_err(StaffApiError::Auth)?;
        let registration = StaffRegistration {
            name: form.name,
            address: form.address,
            phone: form.phone,
            gender: form.gender,
            pincode: form.pincode,
            password_hash,
        };
        let staff = self.db.complete_staff_registration(email, registration).await?;
        info!("🧑️ Registration submitted for {email}; awaiting approval");
        Ok(staff)
    }

    /// Whether the invite for this email has already been used to submit a registration.
    pub async fn registration_submitted(&self, email: &str) -> Result<bool, StaffApiError> {
        let staff = self.db.fetch_staff_by_email(email).await.map_err(StaffApiError::Auth)?;
        Ok(staff.map(|s| s.is_registered).unwrap_or(false))
    }

    /// Activate a pending worker. The joining date defaults to now.
    pub async fn approve(&self, id: &AccountId, joining_date: Option<DateTime<Utc>>) -> Result<Staff, StaffApiError> {
        let date = joining_date.unwrap_or_else(Utc::now);
        let staff = self.db.approve_staff(id, date).await?.ok_or(StaffApiError::StaffNotFound)?;
        info!("🧑️ Staff {} approved, joining {}", staff.email, date.date_naive());
        Ok(staff)
    }

    /// Toggle a worker between `Active` and `Deactivated`. Other lifecycle states are driven by their own flows.
    pub async fn set_status(&self, id: &AccountId, status: StaffStatus) -> Result<Staff, StaffApiError> {
        if !matches!(status, StaffStatus::Active | StaffStatus::Deactivated) {
            return Err(StaffApiError::ValidationError("Invalid status".to_string()));
        }
        let staff = self.db.set_staff_status(id, status).await?.ok_or(StaffApiError::StaffNotFound)?;
        info!("🧑️ Staff {} is now {status}", staff.email);
        Ok(staff)
    }

    /// Update the profile of the logged-in principal. Staff records are preferred; admins and users calling the
    /// same endpoint fall through to their user record with the subset of fields that applies.
    pub async fn update_own_profile(
        &self,
        id: &AccountId,
        changes: StaffProfileChanges,
    ) -> Result<Principal, StaffApiError> {
        if let Some(staff) = self.db.fetch_staff_by_id(id).await.map_err(StaffApiError::Auth)? {
            let staff = self.update_staff_record(staff, changes).await?;
            return Ok(Principal::Staff(staff));
        }
        let user =
            self.db.fetch_user_by_id(id).await.map_err(StaffApiError::Auth)?.ok_or(StaffApiError::StaffNotFound)?;
        let user = self.update_user_record(user, changes).await?;
        Ok(Principal::User(user))
    }

    async fn update_staff_record(
        &self,
        staff: Staff,
        changes: StaffProfileChanges,
    ) -> Result<Staff, StaffApiError> {
        self.validate_profile_fields(&changes)?;
        let password_hash =
            self.password_change_hash(staff.password_hash.as_deref(), &changes)?;
        let update = StaffProfileUpdate {
            name: changes.name.map(|s| s.trim().to_string()),
            address: changes.address.map(|s| s.trim().to_string()),
            phone: changes.phone.map(|s| s.trim().to_string()),
            gender: changes.gender.map(|s| s.trim().to_string()),
            pincode: changes.pincode.map(|s| s.trim().to_string()),
            password_hash,
        };
        self.db.update_staff_profile(&staff.id, update).await?.ok_or(StaffApiError::StaffNotFound)
    }

    async fn update_user_record(&self, user: User, changes: StaffProfileChanges) -> Result<User, StaffApiError> {
        self.validate_profile_fields(&changes)?;
        let password_hash = self.password_change_hash(user.password_hash.as_deref(), &changes)?;
        let update = UserProfileUpdate {
            name: changes.name.map(|s| s.trim().to_string()),
            phone: changes.phone.map(|s| s.trim().to_string()),
            pincode: changes.pincode.map(|s| s.trim().to_string()),
            password_hash,
            ..UserProfileUpdate::default()
        };
        self.db
            .update_user_profile(&user.id, update)
            .await
            .map_err(StaffApiError::Auth)?
            .ok_or(StaffApiError::StaffNotFound)
    }

    // Partial updates validate only the supplied fields.
    fn validate_profile_fields(&self, changes: &StaffProfileChanges) -> Result<(), StaffApiError> {
        if let Some(name) = &changes.name {
            validate_person_name(name.trim()).map_err(StaffApiError::Auth)?;
        }
        if let Some(address) = &changes.address {
            validate_address(address.trim()).map_err(StaffApiError::Auth)?;
        }
        if let Some(phone) = &changes.phone {
            validate_phone(phone.trim()).map_err(StaffApiError::Auth)?;
        }
        if let Some(pincode) = &changes.pincode {
            validate_pincode(pincode.trim()).map_err(StaffApiError::Auth)?;
        }
        Ok(())
    }

    fn password_change_hash(
        &self,
        stored_hash: Option<&str>,
        changes: &StaffProfileChanges,
    ) -> Result<Option<String>, StaffApiError> {
        match (&changes.current_password, &changes.new_password) {
            (None, None) => Ok(None),
            (Some(current), Some(new)) => {
                let stored = stored_hash.ok_or_else(|| {
                    StaffApiError::ValidationError("Current password is invalid".to_string())
                })?;
                if !verify_password(current.trim(), stored) {
                    return Err(StaffApiError::ValidationError("Current password is invalid".to_string()));
                }
                validate_password_strength(new).map_err(StaffApiError::Auth)?;
                Ok(Some(hash_password(new).map_err(StaffApiError::Auth)?))
            },
            _ => Err(StaffApiError::ValidationError(
                "Both current and new passwords are required".to_string(),
            )),
        }
    }

    pub async fn delete(&self, id: &AccountId) -> Result<(), StaffApiError> {
        if self.db.delete_staff(id).await? {
            info!("🧑️ Staff {id} deleted");
            Ok(())
        } else {
            Err(StaffApiError::StaffNotFound)
        }
    }

    pub async fn list(&self) -> Result<Vec<Staff>, StaffApiError> {
        self.db.fetch_all_staff().await
    }

    pub async fn count(&self) -> Result<i64, StaffApiError> {
        self.db.count_staff().await
    }

    /// File a resignation for the given worker.
    pub async fn apply_resignation(&self, staff_id: &AccountId, reason: &str) -> Result<Resignation, StaffApiError> {
        if reason.trim().is_empty() {
            return Err(StaffApiError::ValidationError("Reason is required.".to_string()));
        }
        if self.db.fetch_staff_by_id(staff_id).await.map_err(StaffApiError::Auth)?.is_none() {
            return Err(StaffApiError::StaffNotFound);
        }
        let resignation = self.db.insert_resignation(staff_id, reason.trim()).await?;
        info!("🧑️ Resignation #{} filed by staff {staff_id}", resignation.id);
        Ok(resignation)
    }

    pub async fn resignations(&self) -> Result<Vec<Resignation>, StaffApiError> {
        self.db.fetch_resignations().await
    }

    /// Approve or reject a resignation. Approval deactivates the worker in the same transaction.
    pub async fn process_resignation(
        &self,
        id: i64,
        approve: bool,
        admin_comment: Option<&str>,
    ) -> Result<Resignation, StaffApiError> {
        let resignation = self.db.process_resignation(id, approve, admin_comment).await?;
        info!("🧑️ Resignation #{id} {}", resignation.status);
        Ok(resignation)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
