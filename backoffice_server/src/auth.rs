use backoffice_engine::db_types::{AccountId, Principal, Role};
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError};

/// Login tokens live for a day; a new login is required after expiry, there is no refresh.
const ACCESS_TOKEN_TTL_HOURS: i64 = 24;
/// Invite links stay valid for two days.
const INVITE_TOKEN_TTL_HOURS: i64 = 48;
/// The OAuth round-trip state token only needs to survive the redirect dance.
const STATE_TOKEN_TTL_MINUTES: i64 = 15;

/// Claims carried by an access token. The principal record itself is re-resolved on every request; the token only
/// pins identity and the role granted at login time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: AccountId,
    pub role: Role,
}

/// Claims carried by a staff-invite token. The email is the invited address and is trusted over anything in the
/// registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteClaims {
    pub email: String,
}

/// Claims carried by the OAuth `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClaims {
    pub nonce: String,
}

fn signing_key(config: &AuthConfig) -> Hs256Key {
    Hs256Key::new(config.jwt_secret.reveal().as_bytes())
}

/// Issues the HS256 tokens used across the system.
pub struct TokenIssuer {
    key: Hs256Key,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: signing_key(config) }
    }

    /// Issue an access token for an authenticated principal.
    pub fn issue_access_token(&self, principal: &Principal) -> Result<String, AuthError> {
        let claims = JwtClaims { sub: principal.id().clone(), role: principal.role() };
        self.issue(&claims, Duration::hours(ACCESS_TOKEN_TTL_HOURS))
    }

    pub fn issue_invite_token(&self, email: &str) -> Result<String, AuthError> {
        let claims = InviteClaims { email: email.to_string() };
        self.issue(&claims, Duration::hours(INVITE_TOKEN_TTL_HOURS))
    }

    pub fn issue_state_token(&self, nonce: &str) -> Result<String, AuthError> {
        let claims = StateClaims { nonce: nonce.to_string() };
        self.issue(&claims, Duration::minutes(STATE_TOKEN_TTL_MINUTES))
    }

    fn issue<T: Serialize>(&self, claims: &T, ttl: Duration) -> Result<String, AuthError> {
        let time_options = TimeOptions::default();
        let claims = Claims::new(claims).set_duration_and_issuance(&time_options, ttl);
        let header = Header::empty().with_token_type("JWT");
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }
}

/// Verifies tokens minted by [`TokenIssuer`]. Signature and expiry are both checked; either failure is an
/// [`AuthError`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: Hs256Key,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: signing_key(config) }
    }

    pub fn verify_access_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        self.verify(token)
    }

    pub fn verify_invite_token(&self, token: &str) -> Result<InviteClaims, AuthError> {
        self.verify(token)
    }

    pub fn verify_state_token(&self, token: &str) -> Result<StateClaims, AuthError> {
        self.verify(token)
    }

    fn verify<T: DeserializeOwned + Clone>(&self, token: &str) -> Result<T, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
        let token: Token<T> =
            Hs256.validator(&self.key).validate(&untrusted).map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        Ok(token.claims().custom.clone())
    }
}

#[cfg(test)]
mod test {
    use backoffice_engine::db_types::{Role, User, VerificationStatus};
    use bo_common::Secret;
    use chrono::Utc;

    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig { jwt_secret: Secret::new("a-test-secret-that-is-long-enough".to_string()) }
    }

    fn test_user() -> Principal {
        Principal::User(User {
            id: AccountId("abc123".into()),
            email: "someone@example.com".into(),
            password_hash: Some("$argon2id$stub".into()),
            google_id: None,
            role: Role::User,
            name: Some("Someone".into()),
            phone: None,
            pincode: None,
            store_name: None,
            store_address: None,
            landmark: None,
            is_active: true,
            is_blocked: false,
            verification_status: VerificationStatus::Pending,
            is_verified: false,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn access_token_round_trip() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config);
        let verifier = TokenVerifier::new(&config);
        let token = issuer.issue_access_token(&test_user()).unwrap();
        let claims = verifier.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, AccountId("abc123".into()));
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let issuer = TokenIssuer::new(&test_config());
        let other = AuthConfig { jwt_secret: Secret::new("a-completely-different-secret!!".to_string()) };
        let verifier = TokenVerifier::new(&other);
        let token = issuer.issue_access_token(&test_user()).unwrap();
        assert!(matches!(verifier.verify_access_token(&token), Err(AuthError::ValidationError(_))));
    }

    #[test]
    fn garbage_tokens_are_poorly_formatted() {
        let verifier = TokenVerifier::new(&test_config());
        assert!(matches!(verifier.verify_access_token("made up nonsense"), Err(AuthError::PoorlyFormattedToken(_))));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = test_config();
        let key = signing_key(&config);
        let claims = JwtClaims { sub: AccountId("abc123".into()), role: Role::User };
        // A token that expired an hour ago, signed with the right key.
        let time_options = TimeOptions::default();
        let claims = Claims::new(&claims).set_duration_and_issuance(&time_options, Duration::hours(-1));
        let token = Hs256.token(&Header::empty().with_token_type("JWT"), &claims, &key).unwrap();
        let verifier = TokenVerifier::new(&config);
        assert!(matches!(verifier.verify_access_token(&token), Err(AuthError::ValidationError(_))));
    }

    #[test]
    fn invite_tokens_carry_the_invited_email() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config);
        let verifier = TokenVerifier::new(&config);
        let token = issuer.issue_invite_token("new.staff@example.com").unwrap();
        let claims = verifier.verify_invite_token(&token).unwrap();
        assert_eq!(claims.email, "new.staff@example.com");
    }
}
