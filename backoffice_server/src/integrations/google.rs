use backoffice_engine::db_types::GoogleProfile;
use log::*;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, Clone, Error)]
pub enum GoogleAuthError {
    #[error("External login is not configured on this server.")]
    NotConfigured,
    #[error("Could not build authorization URL. {0}")]
    UrlError(String),
    #[error("Token exchange failed. {0}")]
    ExchangeError(String),
    #[error("Profile fetch failed. {0}")]
    ProfileError(String),
    #[error("The identity assertion is missing a required field: {0}")]
    IncompleteProfile(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

/// Google OAuth code-flow client. The callback route drives `fetch_profile` and hands the result to the identity
/// resolver; no Google-specific state survives past that point.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: Client,
    config: GoogleConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleConfig) -> Result<Self, GoogleAuthError> {
        let client = Client::builder().build().map_err(|e| GoogleAuthError::ExchangeError(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// The URL the browser is redirected to for consent. The `state` value is a signed, short-lived token that is
    /// checked again on the way back.
    pub fn authorize_url(&self, state: &str) -> Result<String, GoogleAuthError> {
        if !self.is_configured() {
            return Err(GoogleAuthError::NotConfigured);
        }
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "profile email"),
                ("state", state),
            ],
        )
        .map_err(|e| GoogleAuthError::UrlError(e.to_string()))?;
        Ok(url.to_string())
    }

    /// Exchange the authorization code and fetch the minimal profile this system consumes.
    pub async fn fetch_profile(&self, code: &str) -> Result<GoogleProfile, GoogleAuthError> {
        if !self.is_configured() {
            return Err(GoogleAuthError::NotConfigured);
        }
        trace!("🌐️ Exchanging authorization code");
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.reveal().as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleAuthError::ExchangeError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::ExchangeError(format!("{status}: {message}")));
        }
        let token =
            response.json::<TokenResponse>().await.map_err(|e| GoogleAuthError::ExchangeError(e.to_string()))?;

        let info = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| GoogleAuthError::ProfileError(e.to_string()))?
            .json::<UserInfoResponse>()
            .await
            .map_err(|e| GoogleAuthError::ProfileError(e.to_string()))?;
        let email = info.email.ok_or_else(|| GoogleAuthError::IncompleteProfile("email".to_string()))?;
        debug!("🌐️ External identity asserted for {email}");
        Ok(GoogleProfile { id: info.id, email, name: info.name })
    }
}
