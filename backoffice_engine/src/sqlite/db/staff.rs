use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccountId, Resignation, Staff, StaffProfileUpdate, StaffRegistration, StaffStatus},
    helpers::new_account_id,
};

pub async fn fetch_staff_by_id(id: &AccountId, conn: &mut SqliteConnection) -> Result<Option<Staff>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM staff WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_staff_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Staff>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM staff WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn insert_invited_staff(
    email: &str,
    invited_by: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Staff, sqlx::Error> {
    let id = new_account_id();
    let staff: Staff = sqlx::query_as(
        "INSERT INTO staff (id, email, invited_by, status) VALUES ($1, $2, $3, 'invited') RETURNING *",
    )
    .bind(id)
    .bind(email)
    .bind(invited_by)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Invited staff record created for [{}] with id {}", staff.email, staff.id);
    Ok(staff)
}

pub async fn complete_staff_registration(
    email: &str,
    registration: StaffRegistration,
    conn: &mut SqliteConnection,
) -> Result<Staff, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE staff SET
                name = $2,
                address = $3,
                phone = $4,
                gender = $5,
                pincode = $6,
                password_hash = $7,
                status = 'pending',
                is_registered = 1,
                updated_at = $8
            WHERE email = $1
            RETURNING *;
        "#,
    )
    .bind(email)
    .bind(registration.name)
    .bind(registration.address)
    .bind(registration.phone)
    .bind(registration.gender)
    .bind(registration.pincode)
    .bind(registration.password_hash)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn approve_staff(
    id: &AccountId,
    joining_date: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Staff>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE staff SET
                status = 'active',
                role = 'staff',
                date_of_joining = $2,
                updated_at = $3
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(joining_date)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn set_staff_status(
    id: &AccountId,
    status: StaffStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Staff>, sqlx::Error> {
    sqlx::query_as("UPDATE staff SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *")
        .bind(id.as_str())
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await
}

pub async fn update_staff_profile(
    id: &AccountId,
    update: StaffProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Staff>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE staff SET
                name          = COALESCE($2, name),
                address       = COALESCE($3, address),
                phone         = COALESCE($4, phone),
                gender        = COALESCE($5, gender),
                pincode       = COALESCE($6, pincode),
                password_hash = COALESCE($7, password_hash),
                updated_at    = $8
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(update.name)
    .bind(update.address)
    .bind(update.phone)
    .bind(update.gender)
    .bind(update.pincode)
    .bind(update.password_hash)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn delete_staff(id: &AccountId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM staff WHERE id = $1").bind(id.as_str()).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_all_staff(conn: &mut SqliteConnection) -> Result<Vec<Staff>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM staff ORDER BY created_at DESC").fetch_all(conn).await
}

pub async fn count_staff(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM staff").fetch_one(conn).await
}

//--------------------------------------    Resignations      --------------------------------------------------------

const RESIGNATION_SELECT: &str = r#"
    SELECT
        r.id,
        r.staff_id,
        s.name AS staff_name,
        s.email AS staff_email,
        r.reason,
        r.status,
        r.admin_comment,
        r.applied_at,
        r.processed_at
    FROM resignations r LEFT JOIN staff s ON s.id = r.staff_id
"#;

pub async fn insert_resignation(
    staff_id: &AccountId,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO resignations (staff_id, reason) VALUES ($1, $2) RETURNING id")
        .bind(staff_id.as_str())
        .bind(reason)
        .fetch_one(conn)
        .await
}

pub async fn fetch_resignation(id: i64, conn: &mut SqliteConnection) -> Result<Option<Resignation>, sqlx::Error> {
    let query = format!("{RESIGNATION_SELECT} WHERE r.id = $1");
    sqlx::query_as(&query).bind(id).fetch_optional(conn).await
}

pub async fn fetch_resignations(conn: &mut SqliteConnection) -> Result<Vec<Resignation>, sqlx::Error> {
    let query = format!("{RESIGNATION_SELECT} ORDER BY r.applied_at DESC");
    sqlx::query_as(&query).fetch_all(conn).await
}

pub async fn update_resignation_status(
    id: i64,
    approve: bool,
    admin_comment: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let status = if approve { "approved" } else { "rejected" };
    sqlx::query("UPDATE resignations SET status = $2, admin_comment = $3, processed_at = $4 WHERE id = $1")
        .bind(id)
        .bind(status)
        .bind(admin_comment)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}
