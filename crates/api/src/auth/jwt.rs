//! JWT access-token generation and validation.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload.
//! The signing secret comes from `SCRAPPY_SECRET_KEY` and must be at least
//! 32 characters.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the authenticated username.
    pub sub: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 30).
    pub token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_TOKEN_EXPIRY_MINS: i64 = 30;

/// Minimum accepted secret length in characters.
const MIN_SECRET_LEN: usize = 32;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                        | Required | Default |
    /// |--------------------------------|----------|---------|
    /// | `SCRAPPY_SECRET_KEY`           | **yes**  | --      |
    /// | `SCRAPPY_TOKEN_EXPIRE_MINUTES` | no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if `SCRAPPY_SECRET_KEY` is not set or is shorter than 32
    /// characters.
    pub fn from_env() -> Self {
        let secret = std::env::var("SCRAPPY_SECRET_KEY")
            .expect("SCRAPPY_SECRET_KEY must be set in the environment");
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "SCRAPPY_SECRET_KEY must be at least {MIN_SECRET_LEN} characters"
        );

        let token_expiry_mins: i64 = std::env::var("SCRAPPY_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRY_MINS.to_string())
            .parse()
            .expect("SCRAPPY_TOKEN_EXPIRE_MINUTES must be a valid i64");

        Self {
            secret,
            token_expiry_mins,
        }
    }
}

/// Generate an HS256 access token for the given username.
pub fn generate_access_token(
    username: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.token_expiry_mins * 60;

    let claims = Claims {
        sub: username.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
