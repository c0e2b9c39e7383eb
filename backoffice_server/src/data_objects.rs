use std::fmt::Display;

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use backoffice_engine::db_types::{AccountId, Principal, Role};
use chrono::{DateTime, Utc};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The resolved principal attached to every authenticated request. Serialisable so the same shape can ride in a
/// session cookie if one is ever reintroduced for the external-login handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub id: AccountId,
    pub email: String,
    pub role: Role,
    pub name: String,
}

impl RequestIdentity {
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            id: principal.id().clone(),
            email: principal.email().to_string(),
            role: principal.role(),
            name: principal.display_name(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for RequestIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req
            .extensions()
            .get::<RequestIdentity>()
            .cloned()
            .ok_or(ServerError::AuthenticationError(AuthError::MissingToken));
        ready(identity)
    }
}

//----------------------------------------------   Auth payloads  -----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: RequestIdentity,
    pub redirect: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub pincode: Option<String>,
    pub store_name: Option<String>,
    pub store_address: Option<String>,
    pub landmark: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

//----------------------------------------------   Staff payloads  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InviteStaffRequest {
    pub email: String,
    pub invited_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffRegisterRequest {
    pub token: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub gender: Option<String>,
    pub pincode: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveStaffRequest {
    pub joining_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffUpdateRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub pincode: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyResignationRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResignationRequest {
    pub approve: bool,
    pub admin_comment: Option<String>,
}

//----------------------------------------------   Cart payloads  -----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRequest {
    /// Admins may act on another principal's cart; everyone else implicitly targets their own.
    pub user_id: Option<AccountId>,
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartRemoveRequest {
    pub user_id: Option<AccountId>,
    pub product_id: i64,
}

//----------------------------------------------   Order payloads  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGatewayOrderRequest {
    /// Amount in the major currency unit; converted to the minor unit before it reaches the gateway.
    pub amount: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    /// The local order this payment settles.
    pub order_id: i64,
}
