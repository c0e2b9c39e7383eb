//! Clients for the external collaborators: the payment gateway, the transactional mail provider, and Google's
//! OAuth endpoints. Each client is an injected handle (`web::Data`), never ambient global state, so tests can
//! substitute fakes.

mod gateway;
mod google;
mod mailer;

pub use gateway::{GatewayError, GatewayOrder, HttpPaymentGateway, PaymentGateway};
pub use google::{GoogleAuthError, GoogleOAuthClient};
pub use mailer::{messages, MailApiClient, Mailer, MailerError};
