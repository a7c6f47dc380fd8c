use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::{Claims, Role};

/// Access token lifetime: 24 hours.
const ACCESS_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Setup token lifetime: 24 hours (welcome-email link validity).
const SETUP_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Load or generate the JWT signing key (256-bit random secret).
/// Key is stored as raw bytes in data_dir/jwt_secret.
pub fn load_or_generate_jwt_secret(data_dir: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let key_path = Path::new(data_dir).join("jwt_secret");

    if key_path.exists() {
        let key = std::fs::read(&key_path)?;
        if key.len() == 32 {
            tracing::info!("JWT signing key loaded from {}", key_path.display());
            return Ok(key);
        }
        // Invalid key file — regenerate
        tracing::warn!("JWT key file has wrong size ({}), regenerating", key.len());
    }

    // Generate new 256-bit random key
    let key: [u8; 32] = rand::rng().random();
    std::fs::write(&key_path, key)?;
    tracing::info!("JWT signing key generated at {}", key_path.display());
    Ok(key.to_vec())
}

/// Issue an access token for an authenticated owner or employee.
/// Claims: sub=user_id, role, iat, exp.
pub fn issue_access_token(
    secret: &[u8],
    user_id: &str,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now,
        exp: now + ACCESS_TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Validate an access token and return its claims.
pub fn validate_access_token(
    secret: &[u8],
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}

/// Claims for the one-time account-setup token mailed to a new employee.
/// Deliberately a distinct type from Claims: a setup token must never pass
/// the Bearer-auth extractor, and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupClaims {
    /// Employee ID the setup link was issued for
    pub sub: String,
    /// Email the welcome message was sent to
    pub email: String,
    /// Fixed discriminator, always "account-setup"
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue an account-setup token for a newly created employee.
pub fn issue_setup_token(
    secret: &[u8],
    employee_id: &str,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = SetupClaims {
        sub: employee_id.to_string(),
        email: email.to_string(),
        purpose: "account-setup".to_string(),
        iat: now,
        exp: now + SETUP_TOKEN_TTL_SECS,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Validate a setup token and return its claims.
/// Rejects tokens whose purpose discriminator is not "account-setup".
pub fn validate_setup_token(
    secret: &[u8],
    token: &str,
) -> Result<SetupClaims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    let token_data = decode::<SetupClaims>(token, &DecodingKey::from_secret(secret), &validation)?;
    if token_data.claims.purpose != "account-setup" {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(token_data.claims)
}
