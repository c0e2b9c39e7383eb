use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Could not hash password. {0}")]
    PasswordHash(String),
    #[error("Account not found.")]
    AccountNotFound,
    #[error("An account with this email already exists.")]
    DuplicateAccount,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Your account is not active. Contact admin.")]
    InactiveWorker,
    #[error("Invalid or expired token.")]
    InvalidResetToken,
}

#[derive(Debug, Clone, Error)]
pub enum StaffApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    Auth(#[from] AuthApiError),
    #[error("This email is already registered as a user.")]
    EmailBelongsToUser,
    #[error("Staff already exists with this email.")]
    StaffAlreadyExists,
    #[error("You have already submitted your registration.")]
    AlreadyRegistered,
    #[error("Staff not found.")]
    StaffNotFound,
    #[error("Resignation not found.")]
    ResignationNotFound,
    #[error("Resignation has already been processed.")]
    ResignationAlreadyProcessed,
    #[error("{0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} not found.")]
    ProductNotFound(i64),
    #[error("Cart not found.")]
    CartNotFound,
    #[error("Item {0} not found in cart.")]
    ItemNotFound(i64),
    #[error("Quantity must be a positive integer.")]
    InvalidQuantity,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cart is empty.")]
    EmptyCart,
    #[error("Product {0} is no longer available.")]
    ProductUnavailable(i64),
    #[error("Order {0} does not exist.")]
    OrderNotFound(i64),
    #[error("Payment for order {0} has already been confirmed.")]
    PaymentAlreadyConfirmed(i64),
    #[error("Order {order_id} cannot move from {status} to Paid.")]
    InvalidOrderState { order_id: i64, status: String },
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().is_some_and(|db| db.is_unique_violation())
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation(&e) {
            AuthApiError::DuplicateAccount
        } else {
            AuthApiError::DatabaseError(e.to_string())
        }
    }
}

impl From<sqlx::Error> for StaffApiError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation(&e) {
            StaffApiError::StaffAlreadyExists
        } else {
            StaffApiError::DatabaseError(e.to_string())
        }
    }
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::Error> for CheckoutApiError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutApiError::DatabaseError(e.to_string())
    }
}
