use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    api::errors::AuthApiError,
    db_types::{AccountId, GoogleProfile, NewUser, Principal, Role, Staff, StaffStatus, User, UserProfileUpdate},
    helpers::{
        generate_reset_token,
        hash_password,
        hash_reset_token,
        validate_email,
        validate_password_strength,
        verify_password,
    },
    traits::AuthManagement,
};

/// How long a password-reset ticket stays valid.
const RESET_TICKET_TTL_MINUTES: i64 = 15;

/// Changes a principal may make to their own profile. The password, when present, arrives in plaintext and is
/// hashed here.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub pincode: Option<String>,
    pub store_name: Option<String>,
    pub store_address: Option<String>,
    pub landmark: Option<String>,
    pub password: Option<String>,
}

/// `AuthApi` owns credential handling and identity resolution across the two principal stores.
pub struct AuthApi<B> {
    db: B,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Register a new self-registered account. The email is normalised to lowercase; duplicates are rejected by the
    /// store's uniqueness constraint rather than a lookup.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthApiError> {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password_strength(password)?;
        let password_hash = hash_password(password)?;
        let user = self.db.insert_user(NewUser::with_password(email.clone(), password_hash)).await?;
        info!("🔑️ New account registered for {email}");
        Ok(user)
    }

    /// Authenticate an email/password pair. Users are checked before staff; a worker whose lifecycle status is not
    /// `Active` is refused even with valid credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, AuthApiError> {
        let email = email.trim().to_lowercase();
        if let Some(user) = self.db.fetch_user_by_email(&email).await? {
            let hash = user.password_hash.as_deref().ok_or(AuthApiError::InvalidCredentials)?;
            if !verify_password(password, hash) {
                return Err(AuthApiError::InvalidCredentials);
            }
            debug!("🔑️ {} login successful for {email}", user.role);
            return Ok(Principal::User(user));
        }
        let staff = self.db.fetch_staff_by_email(&email).await?.ok_or(AuthApiError::InvalidCredentials)?;
        let hash = staff.password_hash.as_deref().ok_or(AuthApiError::InvalidCredentials)?;
        if !verify_password(password, hash) {
            return Err(AuthApiError::InvalidCredentials);
        }
        if staff.status != StaffStatus::Active {
            debug!("🔑️ Refusing login for {email}: worker status is {}", staff.status);
            return Err(AuthApiError::InactiveWorker);
        }
        debug!("🔑️ Staff login successful for {email}");
        Ok(Principal::Staff(staff))
    }

    /// Resolve a principal id to its record. The worker store is searched first; ids are random hex drawn from a
    /// single namespace, so at most one store can match.
    pub async fn resolve(&self, id: &AccountId) -> Result<Principal, AuthApiError> {
        if let Some(staff) = self.db.fetch_staff_by_id(id).await? {
            return Ok(Principal::Staff(staff));
        }
        match self.db.fetch_user_by_id(id).await? {
            Some(user) => Ok(Principal::User(user)),
            None => Err(AuthApiError::AccountNotFound),
        }
    }

    /// Resolve an external-identity assertion to a principal, creating a self-registered account on first login.
    ///
    /// Search order: worker email (workers never log in via Google, but an existing worker email blocks
    /// external-identity self-registration) → google id → email (linking the google id) → create. Creation races
    /// with concurrent identical logins are absorbed by re-running the lookups when the uniqueness constraint
    /// fires, so at most one account is ever created.
    pub async fn resolve_google(&self, profile: &GoogleProfile) -> Result<Principal, AuthApiError> {
        let email = profile.email.trim().to_lowercase();
        if let Some(staff) = self.db.fetch_staff_by_email(&email).await? {
            return Ok(Principal::Staff(staff));
        }
        if let Some(user) = self.lookup_google_user(&email, &profile.id).await? {
            return Ok(Principal::User(user));
        }
        let new_user = NewUser::from_google(email.clone(), profile.id.clone(), profile.name.clone());
        match self.db.insert_user(new_user).await {
            Ok(user) => {
                info!("🔑️ New account created via external login for {email}");
                Ok(Principal::User(user))
            },
            Err(AuthApiError::DuplicateAccount) => {
                debug!("🔑️ Concurrent external login for {email}; re-resolving");
                self.lookup_google_user(&email, &profile.id).await?.map(Principal::User).ok_or(AuthApiError::AccountNotFound)
            },
            Err(e) => Err(e),
        }
    }

    async fn lookup_google_user(&self, email: &str, google_id: &str) -> Result<Option<User>, AuthApiError> {
        if let Some(user) = self.db.fetch_user_by_google_id(google_id).await? {
            return Ok(Some(user));
        }
        if let Some(user) = self.db.fetch_user_by_email(email).await? {
            let user = self.db.link_google_id(&user.id, google_id).await?;
            return Ok(Some(user));
        }
        Ok(None)
    }

    /// Issue a reset ticket for the account, replacing any live one. Returns the plaintext token for the emailed
    /// link, or `None` when no account owns the email — the caller must answer identically either way.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthApiError> {
        let email = email.trim().to_lowercase();
        let (plain, hash) = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TICKET_TTL_MINUTES);
        let stored = self.db.upsert_reset_ticket(&email, &hash, expires_at).await?;
        if stored {
            debug!("🔑️ Reset ticket issued for {email}");
            Ok(Some(plain))
        } else {
            debug!("🔑️ Reset requested for unknown email");
            Ok(None)
        }
    }

    /// Consume a reset ticket and set the new password.
    pub async fn reset_password(&self, email: &str, token: &str, new_password: &str) -> Result<(), AuthApiError> {
        let email = email.trim().to_lowercase();
        validate_password_strength(new_password)?;
        let token_hash = hash_reset_token(token);
        let new_password_hash = hash_password(new_password)?;
        let redeemed = self.db.redeem_reset_ticket(&email, &token_hash, &new_password_hash, Utc::now()).await?;
        if redeemed {
            info!("🔑️ Password reset completed for {email}");
            Ok(())
        } else {
            Err(AuthApiError::InvalidResetToken)
        }
    }

    pub async fn fetch_user(&self, id: &AccountId) -> Result<User, AuthApiError> {
        self.db.fetch_user_by_id(id).await?.ok_or(AuthApiError::AccountNotFound)
    }

    pub async fn fetch_staff(&self, id: &AccountId) -> Result<Staff, AuthApiError> {
        self.db.fetch_staff_by_id(id).await?.ok_or(AuthApiError::AccountNotFound)
    }

    pub async fn update_profile(&self, id: &AccountId, changes: ProfileChanges) -> Result<User, AuthApiError> {
        let password_hash = match changes.password.as_deref() {
            Some(p) if !p.trim().is_empty() => Some(hash_password(p)?),
            _ => None,
        };
        let update = UserProfileUpdate {
            name: changes.name,
            phone: changes.phone,
            pincode: changes.pincode,
            store_name: changes.store_name,
            store_address: changes.store_address,
            landmark: changes.landmark,
            password_hash,
        };
        self.db.update_user_profile(id, update).await?.ok_or(AuthApiError::AccountNotFound)
    }

    /// Flip the verification flag and return the updated account.
    pub async fn toggle_verification(&self, id: &AccountId) -> Result<User, AuthApiError> {
        let user = self.db.fetch_user_by_id(id).await?.ok_or(AuthApiError::AccountNotFound)?;
        let user = self.db.set_user_verification(id, !user.is_verified).await?.ok_or(AuthApiError::AccountNotFound)?;
        info!("🔑️ User {} is now {}", user.email, user.verification_status);
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthApiError> {
        self.db.fetch_all_users().await
    }

    pub async fn count_users(&self) -> Result<i64, AuthApiError> {
        self.db.count_users().await
    }

    /// Make sure an admin account exists, creating it with the given credentials when missing. A concurrent
    /// creation is treated as success.
    pub async fn ensure_admin_account(&self, email: &str, password: &str) -> Result<(), AuthApiError> {
        let email = email.trim().to_lowercase();
        if self.db.fetch_user_by_email(&email).await?.is_some() {
            debug!("🔑️ Admin account already exists");
            return Ok(());
        }
        let password_hash = hash_password(password)?;
        let admin = NewUser {
            email: email.clone(),
            password_hash: Some(password_hash),
            google_id: None,
            role: Role::Admin,
            name: None,
        };
        match self.db.insert_user(admin).await {
            Ok(_) => {
                info!("🔑️ Default admin account created for {email}");
                Ok(())
            },
            Err(AuthApiError::DuplicateAccount) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
