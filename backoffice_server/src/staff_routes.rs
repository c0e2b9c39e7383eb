//! Staff lifecycle and resignation handlers.
//!
//! The invite → register → approve flow is driven by a 2-day invite token minted at invite time and emailed to the
//! worker; the registration form never chooses its own email.

use std::str::FromStr;

use actix_web::{web, HttpResponse};
use backoffice_engine::{
    db_types::{AccountId, Role, StaffStatus},
    traits::{AuthManagement, StaffManagement},
    AuthApi,
    StaffApi,
    StaffProfileChanges,
};
use log::*;
use serde_json::json;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::PublicUrls,
    data_objects::{
        ApplyResignationRequest,
        ApproveStaffRequest,
        InviteStaffRequest,
        InviteTokenRequest,
        JsonResponse,
        ProcessResignationRequest,
        RequestIdentity,
        StaffRegisterRequest,
        StaffStatusRequest,
        StaffUpdateRequest,
    },
    errors::ServerError,
    integrations::{messages, Mailer},
    route,
};

//----------------------------------------------   Invitations  -------------------------------------------------------

route!(invite_staff => Post "/invite" impl StaffManagement, Mailer requires [Role::Admin]);
/// Invite a worker by email.
///
/// The invite email carries the registration link and is the only copy of the invite token, so a failed send
/// surfaces as an error (the shell record still exists and the invite can be re-sent by deleting and re-inviting).
pub async fn invite_staff<B, M>(
    api: web::Data<StaffApi<B>>,
    mailer: web::Data<M>,
    signer: web::Data<TokenIssuer>,
    urls: web::Data<PublicUrls>,
    body: web::Json<InviteStaffRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StaffManagement,
    M: Mailer + 'static,
{
    let InviteStaffRequest { email, invited_by } = body.into_inner();
    let staff = api.invite(&email, invited_by.as_deref()).await?;
    let token =
        signer.issue_invite_token(&staff.email).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
    let link = format!("{}/staff/staffregister?token={token}", urls.client_url);
    let (subject, html) = messages::staff_invite(&link);
    mailer.send(&staff.email, subject, &html).await?;
    info!("💻️ Invitation sent to {}", staff.email);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Invitation sent")))
}

route!(staff_register => Post "/register" impl StaffManagement);
/// Complete an invited registration. The email is taken from the verified invite token.
pub async fn staff_register<B: StaffManagement>(
    api: web::Data<StaffApi<B>>,
    verifier: web::Data<TokenVerifier>,
    body: web::Json<StaffRegisterRequest>,
) -> Result<HttpResponse, ServerError> {
    let StaffRegisterRequest { token, name, address, phone, gender, pincode, password } = body.into_inner();
    let claims = verifier
        .verify_invite_token(&token)
        .map_err(|_| ServerError::InvalidRequestBody("Invalid or expired link".to_string()))?;
    let form = backoffice_engine::RegistrationForm { name, address, phone, gender, pincode, password };
    api.complete_registration(&claims.email, form).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Registration submitted, awaiting admin approval",
        "redirect": "/check-mail",
    })))
}

route!(check_submitted => Post "/check-submitted" impl StaffManagement);
/// Whether the invite token has already been used to submit a registration. An unusable token just reads as "not
/// submitted"; this endpoint deliberately never errors on bad tokens.
pub async fn check_submitted<B: StaffManagement>(
    api: web::Data<StaffApi<B>>,
    verifier: web::Data<TokenVerifier>,
    body: web::Json<InviteTokenRequest>,
) -> Result<HttpResponse, ServerError> {
    let submitted = match verifier.verify_invite_token(&body.token) {
        Ok(claims) => api.registration_submitted(&claims.email).await.unwrap_or(false),
        Err(_) => false,
    };
    Ok(HttpResponse::Ok().json(json!({ "submitted": submitted })))
}

//----------------------------------------------   Lifecycle  ---------------------------------------------------------

route!(approve_staff => Put "/approve/{id}" impl StaffManagement, Mailer requires [Role::Admin]);
/// Approve a pending registration, activating the worker. The congratulation email is best-effort.
pub async fn approve_staff<B, M>(
    path: web::Path<AccountId>,
    api: web::Data<StaffApi<B>>,
    mailer: web::Data<M>,
    body: web::Json<ApproveStaffRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StaffManagement,
    M: Mailer + 'static,
{
    let id = path.into_inner();
    let staff = api.approve(&id, body.into_inner().joining_date).await?;
    let to = staff.email.clone();
    let name = staff.name.clone().unwrap_or_default();
    let joining = staff.date_of_joining.map(|d| d.date_naive().to_string()).unwrap_or_default();
    actix_web::rt::spawn(async move {
        let (subject, html) = messages::staff_approved(&name, &joining);
        if let Err(e) = mailer.send(&to, subject, &html).await {
            error!("📧️ Approval email to {to} failed: {e}");
        }
    });
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Staff approved successfully", "staff": staff })))
}

route!(staff_status => Put "/status/{id}" impl StaffManagement requires [Role::Admin]);
pub async fn staff_status<B: StaffManagement>(
    path: web::Path<AccountId>,
    api: web::Data<StaffApi<B>>,
    body: web::Json<StaffStatusRequest>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = StaffStatus::from_str(&body.status)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let staff = api.set_status(&id, status).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": format!("Staff {status}"), "staff": staff })))
}

route!(staff_me => Get "/me" impl AuthManagement requires [Role::Staff]);
pub async fn staff_me<B: AuthManagement>(
    identity: RequestIdentity,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let staff = api.fetch_staff(&identity.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "staff": staff })))
}

route!(staff_update => Put "/update" impl StaffManagement);
/// Update the logged-in principal's profile, including a verified password change. Admin and user principals
/// calling this endpoint fall through to their user record.
pub async fn staff_update<B: StaffManagement>(
    identity: RequestIdentity,
    api: web::Data<StaffApi<B>>,
    body: web::Json<StaffUpdateRequest>,
) -> Result<HttpResponse, ServerError> {
    let StaffUpdateRequest { name, address, phone, gender, pincode, current_password, new_password } =
        body.into_inner();
    let changes = StaffProfileChanges { name, address, phone, gender, pincode, current_password, new_password };
    let updated = api.update_own_profile(&identity.id, changes).await?;
    let record = match &updated {
        backoffice_engine::db_types::Principal::Staff(s) => serde_json::to_value(s),
        backoffice_engine::db_types::Principal::User(u) => serde_json::to_value(u),
    }
    .map_err(|e| ServerError::Unspecified(e.to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Profile updated successfully", "staff": record })))
}

route!(list_staff => Get "" impl StaffManagement requires [Role::Admin]);
pub async fn list_staff<B: StaffManagement>(api: web::Data<StaffApi<B>>) -> Result<HttpResponse, ServerError> {
    let staff = api.list().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "staff": staff })))
}

route!(count_staff => Get "/count" impl StaffManagement requires [Role::Admin]);
pub async fn count_staff<B: StaffManagement>(api: web::Data<StaffApi<B>>) -> Result<HttpResponse, ServerError> {
    let total = api.count().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "total": total })))
}

route!(delete_staff => Delete "/{id}" impl StaffManagement requires [Role::Admin]);
pub async fn delete_staff<B: StaffManagement>(
    path: web::Path<AccountId>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete(&id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Staff deleted successfully")))
}

//----------------------------------------------   Resignations  ------------------------------------------------------

route!(apply_resignation => Post "/apply" impl StaffManagement requires [Role::Staff]);
/// File a resignation for the logged-in worker.
pub async fn apply_resignation<B: StaffManagement>(
    identity: RequestIdentity,
    api: web::Data<StaffApi<B>>,
    body: web::Json<ApplyResignationRequest>,
) -> Result<HttpResponse, ServerError> {
    api.apply_resignation(&identity.id, &body.reason).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Resignation applied successfully.")))
}

route!(list_resignations => Get "" impl StaffManagement requires [Role::Admin]);
pub async fn list_resignations<B: StaffManagement>(
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let resignations = api.resignations().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "resignations": resignations })))
}

route!(process_resignation => Put "/{id}" impl StaffManagement requires [Role::Admin]);
/// Approve or reject a resignation. Approval deactivates the worker account in the same transaction.
pub async fn process_resignation<B: StaffManagement>(
    path: web::Path<i64>,
    api: web::Data<StaffApi<B>>,
    body: web::Json<ProcessResignationRequest>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let ProcessResignationRequest { approve, admin_comment } = body.into_inner();
    let resignation = api.process_resignation(id, approve, admin_comment.as_deref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "resignation": resignation })))
}
