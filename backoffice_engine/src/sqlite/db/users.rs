use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccountId, NewUser, User, UserProfileUpdate},
    helpers::new_account_id,
};

pub async fn fetch_user_by_id(id: &AccountId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn fetch_user_by_google_id(
    google_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE google_id = $1").bind(google_id).fetch_optional(conn).await
}

/// Inserts a new self-registered account. The UNIQUE constraints on `email` and `google_id` are the real guard
/// against duplicate registration; a violation surfaces as a database error for the caller to map.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let id = new_account_id();
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (id, email, password_hash, google_id, role, name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.google_id)
    .bind(user.role)
    .bind(user.name)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ New account [{}] saved with id {}", user.email, user.id);
    Ok(user)
}

pub async fn link_google_id(
    id: &AccountId,
    google_id: &str,
    conn: &mut SqliteConnection,
) -> Result<User, sqlx::Error> {
    sqlx::query_as(
        "UPDATE users SET google_id = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id.as_str())
    .bind(google_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

/// Applies a partial profile update. `COALESCE` keeps the stored value for fields that were not supplied.
pub async fn update_user_profile(
    id: &AccountId,
    update: UserProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE users SET
                name          = COALESCE($2, name),
                phone         = COALESCE($3, phone),
                pincode       = COALESCE($4, pincode),
                store_name    = COALESCE($5, store_name),
                store_address = COALESCE($6, store_address),
                landmark      = COALESCE($7, landmark),
                password_hash = COALESCE($8, password_hash),
                updated_at    = $9
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(update.name)
    .bind(update.phone)
    .bind(update.pincode)
    .bind(update.store_name)
    .bind(update.store_address)
    .bind(update.landmark)
    .bind(update.password_hash)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn set_user_verification(
    id: &AccountId,
    verified: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE users SET
                is_verified = $2,
                verification_status = CASE WHEN $2 THEN 'verified' ELSE 'not_verified' END,
                updated_at = $3
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(verified)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn fetch_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC").fetch_all(conn).await
}

pub async fn count_users(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(conn).await
}

/// Stores a reset ticket, overwriting any live one (at most one live ticket per account). Returns `false` when the
/// email does not belong to an account.
pub async fn upsert_reset_ticket(
    email: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = $4 WHERE email = $1",
    )
    .bind(email)
    .bind(token_hash)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Consumes a live ticket and sets the new password hash in one statement, so a ticket can never be spent twice.
/// Returns `false` when the ticket does not match or has expired.
pub async fn redeem_reset_ticket(
    email: &str,
    token_hash: &str,
    new_password_hash: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE users SET
                password_hash = $3,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $4
            WHERE email = $1 AND reset_token_hash = $2 AND reset_token_expires_at > $4;
        "#,
    )
    .bind(email)
    .bind(token_hash)
    .bind(new_password_hash)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
