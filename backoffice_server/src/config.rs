use std::{env, io::Write};

use bo_common::{parse_boolean_flag, Secret};
use log::*;
use rand::RngCore;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_BO_HOST: &str = "127.0.0.1";
const DEFAULT_BO_PORT: u16 = 5000;
const DEFAULT_CLIENT_URL: &str = "http://localhost:8080";
const DEFAULT_MAIL_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const DEFAULT_PAYMENT_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_ADMIN_EMAIL: &str = "admin@backoffice.local";
const DEFAULT_ADMIN_PASSWORD: &str = "Admin!234";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL of the browser client; used for redirect targets and emailed links.
    pub client_url: String,
    /// Origins allowed by CORS. Defaults to the client URL.
    pub allowed_origins: Vec<String>,
    /// If true, CORS allows any origin. **DANGER**
    pub permissive_cors: bool,
    pub auth: AuthConfig,
    pub google: GoogleConfig,
    pub mail: MailConfig,
    pub payment: PaymentConfig,
    pub admin: AdminBootstrapConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BO_HOST.to_string(),
            port: DEFAULT_BO_PORT,
            database_url: String::default(),
            client_url: DEFAULT_CLIENT_URL.to_string(),
            allowed_origins: vec![DEFAULT_CLIENT_URL.to_string()],
            permissive_cors: false,
            auth: AuthConfig::default(),
            google: GoogleConfig::default(),
            mail: MailConfig::default(),
            payment: PaymentConfig::default(),
            admin: AdminBootstrapConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BO_HOST").ok().unwrap_or_else(|| DEFAULT_BO_HOST.into());
        let port = env::var("BO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for BO_PORT. {e} Using the default, {DEFAULT_BO_PORT}, instead.");
                    DEFAULT_BO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BO_PORT);
        let database_url = env::var("BO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BO_DATABASE_URL is not set. Please set it to the URL for the back-office database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let client_url = env::var("BO_CLIENT_URL").ok().unwrap_or_else(|| DEFAULT_CLIENT_URL.into());
        let allowed_origins = env::var("BO_ALLOWED_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect::<Vec<_>>())
            .ok()
            .filter(|v: &Vec<String>| !v.is_empty())
            .unwrap_or_else(|| vec![client_url.clone()]);
        let permissive_cors = parse_boolean_flag(env::var("BO_PERMISSIVE_CORS").ok(), false);
        if permissive_cors {
            warn!("🚨️ BO_PERMISSIVE_CORS is set. The server will accept requests from any browser origin.");
        }
        Self {
            host,
            port,
            database_url,
            client_url,
            allowed_origins,
            permissive_cors,
            auth,
            google: GoogleConfig::from_env_or_default(),
            mail: MailConfig::from_env_or_default(),
            payment: PaymentConfig::from_env_or_default(),
            admin: AdminBootstrapConfig::from_env_or_default(),
        }
    }
}

//-------------------------------------------------  PublicUrls  ------------------------------------------------------
/// The subset of the configuration handlers need for building redirect targets and emailed links. Kept small and
/// free of secrets so it can be handed around as shared app data.
#[derive(Clone, Debug)]
pub struct PublicUrls {
    pub client_url: String,
}

impl PublicUrls {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { client_url: config.client_url.clone() }
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify every token the server issues. The process must not serve production
    /// traffic without it being configured explicitly.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every token dies with the process. 🚨️🚨️🚨️"
        );
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let secret = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the BO_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("BO_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [BO_JWT_SECRET]")))?;
        if secret.len() < 16 {
            return Err(ServerError::ConfigurationError(
                "BO_JWT_SECRET must be at least 16 characters long.".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

//------------------------------------------------  GoogleConfig  -----------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_url: String,
}

impl GoogleConfig {
    pub fn from_env_or_default() -> Self {
        let client_id = env::var("BO_GOOGLE_CLIENT_ID").ok().unwrap_or_else(|| {
            warn!("🪛️ BO_GOOGLE_CLIENT_ID is not set. External login will not be available.");
            String::default()
        });
        let client_secret = Secret::new(env::var("BO_GOOGLE_CLIENT_SECRET").ok().unwrap_or_default());
        let redirect_url = env::var("BO_GOOGLE_REDIRECT_URL")
            .ok()
            .unwrap_or_else(|| format!("http://{DEFAULT_BO_HOST}:{DEFAULT_BO_PORT}/auth/google/callback"));
        Self { client_id, client_secret, redirect_url }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.reveal().is_empty()
    }
}

//-------------------------------------------------  MailConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MAIL_API_URL.to_string(),
            api_key: Secret::default(),
            from_address: String::default(),
        }
    }
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let api_key = Secret::new(env::var("BO_MAIL_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ BO_MAIL_API_KEY is not set. Transactional email will fail.");
            String::default()
        }));
        let from_address = env::var("BO_MAIL_FROM").ok().unwrap_or_else(|| {
            error!("🪛️ BO_MAIL_FROM is not set. Transactional email will fail.");
            String::default()
        });
        let api_url = env::var("BO_MAIL_API_URL").ok().unwrap_or_else(|| DEFAULT_MAIL_API_URL.into());
        Self { api_url, api_key, from_address }
    }
}

//-----------------------------------------------  PaymentConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_PAYMENT_API_URL.to_string(), key_id: String::default(), key_secret: Secret::default() }
    }
}

impl PaymentConfig {
    pub fn from_env_or_default() -> Self {
        let key_id = env::var("BO_PAYMENT_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ BO_PAYMENT_KEY_ID is not set. Online payments will fail.");
            String::default()
        });
        let key_secret = Secret::new(env::var("BO_PAYMENT_KEY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ BO_PAYMENT_KEY_SECRET is not set. Online payments will fail.");
            String::default()
        }));
        let api_url = env::var("BO_PAYMENT_API_URL").ok().unwrap_or_else(|| DEFAULT_PAYMENT_API_URL.into());
        Self { api_url, key_id, key_secret }
    }
}

//--------------------------------------------  AdminBootstrapConfig  -------------------------------------------------
#[derive(Clone, Debug)]
pub struct AdminBootstrapConfig {
    pub email: String,
    pub password: Secret<String>,
}

impl Default for AdminBootstrapConfig {
    fn default() -> Self {
        Self { email: DEFAULT_ADMIN_EMAIL.to_string(), password: Secret::new(DEFAULT_ADMIN_PASSWORD.to_string()) }
    }
}

impl AdminBootstrapConfig {
    pub fn from_env_or_default() -> Self {
        let email = env::var("BO_ADMIN_EMAIL").ok().unwrap_or_else(|| {
            warn!("🪛️ BO_ADMIN_EMAIL is not set. Using the default bootstrap admin address.");
            DEFAULT_ADMIN_EMAIL.to_string()
        });
        let password = env::var("BO_ADMIN_PASSWORD").map(Secret::new).ok().unwrap_or_else(|| {
            warn!(
                "🚨️ BO_ADMIN_PASSWORD is not set. The bootstrap admin uses a well-known default password; change \
                 it before exposing this server."
            );
            Secret::new(DEFAULT_ADMIN_PASSWORD.to_string())
        });
        Self { email, password }
    }
}
