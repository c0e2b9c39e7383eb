use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use backoffice_engine::{AuthApiError, CartApiError, CheckoutApiError, StaffApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    DuplicateRecord(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Upstream service failure. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateRecord(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Unexpected failures keep their detail in the logs; the client sees a generic message.
        let message = match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                log::error!("💻️ Internal error: {self}");
                "Server error".to_string()
            },
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Authorization token missing.")]
    MissingToken,
    #[error("Token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Token is not valid or expired. {0}")]
    ValidationError(String),
    #[error("Account not found.")]
    AccountNotFound,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::ValidationError(m) => Self::InvalidRequestBody(m),
            AuthApiError::InvalidCredentials => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::InvalidResetToken => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::DuplicateAccount => Self::DuplicateRecord(e.to_string()),
            AuthApiError::InactiveWorker => Self::InsufficientPermissions(e.to_string()),
            AuthApiError::AccountNotFound => Self::NoRecordFound(e.to_string()),
            AuthApiError::PasswordHash(m) => Self::BackendError(m),
            AuthApiError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<StaffApiError> for ServerError {
    fn from(e: StaffApiError) -> Self {
        match e {
            StaffApiError::Auth(inner) => inner.into(),
            StaffApiError::EmailBelongsToUser | StaffApiError::StaffAlreadyExists => {
                Self::DuplicateRecord(e.to_string())
            },
            StaffApiError::AlreadyRegistered => Self::DuplicateRecord(e.to_string()),
            StaffApiError::StaffNotFound | StaffApiError::ResignationNotFound => Self::NoRecordFound(e.to_string()),
            StaffApiError::ResignationAlreadyProcessed => Self::InvalidRequestBody(e.to_string()),
            StaffApiError::ValidationError(m) => Self::InvalidRequestBody(m),
            StaffApiError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::ProductNotFound(_) | CartApiError::CartNotFound | CartApiError::ItemNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CartApiError::InvalidQuantity => Self::InvalidRequestBody(e.to_string()),
            CartApiError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<CheckoutApiError> for ServerError {
    fn from(e: CheckoutApiError) -> Self {
        match e {
            CheckoutApiError::EmptyCart => Self::InvalidRequestBody(e.to_string()),
            CheckoutApiError::ProductUnavailable(_) => Self::InvalidRequestBody(e.to_string()),
            CheckoutApiError::InvalidOrderState { .. } => Self::InvalidRequestBody(e.to_string()),
            CheckoutApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutApiError::PaymentAlreadyConfirmed(_) => Self::DuplicateRecord(e.to_string()),
            CheckoutApiError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}
