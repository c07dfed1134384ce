use crate::{
    auth::{Credential, CredentialIssuer, VerifiedSubject},
    clock::{Clock, SystemClock},
    config::JwtConfig,
    error::{AuthError, Result},
};
use base64::prelude::*;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims structure for authenticated sessions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Verified account address in raw `workchain:hex` form
    pub sub: String,
    /// Session identifier
    pub sid: Uuid,
    /// Caller-supplied identifier linked to the address, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Hex SHA-256 of the wallet public key that signed the proof
    pub key_hash: String,
    /// Expiration timestamp (Unix timestamp)
    pub exp: i64,
    /// Issued at timestamp (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    fn new(session_id: Uuid, subject: &VerifiedSubject, ttl: i64, now: i64) -> Self {
        Self {
            sub: subject.address.to_string(),
            sid: session_id,
            ext: subject.external_id.clone(),
            key_hash: hex::encode(Sha256::digest(subject.public_key)),
            exp: now + ttl,
            iat: now,
        }
    }
}

/// Creates a signed JWT token for a verified wallet
///
/// # Arguments
/// * `session_id` - Unique session identifier
/// * `subject` - The address and key that passed proof verification
/// * `config` - JWT configuration with secret and TTL
///
/// # Returns
/// * `Ok(String)` - Signed JWT token
/// * `Err(AuthError)` - Base64 or JWT encoding error
///
/// # Example
/// ```rust
/// use uuid::Uuid;
/// use secrecy::Secret;
/// use base64::prelude::*;
/// use ton_proof_jwt::{Address, VerifiedSubject};
/// use ton_proof_jwt::crypto::jwt::{create_jwt, validate_token};
/// use ton_proof_jwt::config::JwtConfig;
///
/// let config = JwtConfig {
///     secret: Secret::new(BASE64_STANDARD.encode("secret-key")),
///     ttl: 3600, // 1 hour
/// };
/// let subject = VerifiedSubject {
///     address: Address::new(0, [1u8; 32]),
///     public_key: [2u8; 32],
///     external_id: Some("user-42".to_string()),
/// };
///
/// let token = create_jwt(Uuid::new_v4(), &subject, &config).unwrap();
/// let claims = validate_token(&token, &config).unwrap();
/// assert_eq!(claims.ext.as_deref(), Some("user-42"));
/// ```
pub fn create_jwt(
    session_id: Uuid,
    subject: &VerifiedSubject,
    config: &JwtConfig,
) -> Result<String> {
    let claims = Claims::new(session_id, subject, config.ttl, Utc::now().timestamp());
    sign_claims(&claims, config)
}

fn sign_claims(claims: &Claims, config: &JwtConfig) -> Result<String> {
    let jwt_secret = decode_secret(config.secret.expose_secret())?;
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(&jwt_secret),
    )
    .map_err(|e| AuthError::JwtError(format!("Failed to create JWT: {}", e)))?;

    Ok(token)
}

/// Validates a JWT token and extracts the claims
///
/// # Arguments
/// * `token` - JWT token string to validate
/// * `config` - JWT configuration with secret for verification
///
/// # Returns
/// * `Ok(Claims)` - Validated claims containing session info
/// * `Err(AuthError)` - Token expired, invalid signature, malformed, or decode error
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims> {
    validate_token_at(token, config, Utc::now().timestamp())
}

/// Expiry is checked against `now` rather than the library's own clock
fn validate_token_at(token: &str, config: &JwtConfig, now: i64) -> Result<Claims> {
    let jwt_secret = decode_secret(config.secret.expose_secret())?;
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&jwt_secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature
            | jsonwebtoken::errors::ErrorKind::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::JwtError(format!("JWT validation failed: {}", e)),
        })?;
    let claims = token_data.claims;
    if claims.exp <= now {
        return Err(AuthError::ExpiredToken);
    }
    Ok(claims)
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(secret)
        .map_err(|e| AuthError::Base64Error(format!("Failed to decode JWT secret: {}", e)))
}

/// HS256 session tokens as the credential for a verified wallet
///
/// `iat`, `exp` and expiry checks all follow the issuer's clock.
#[derive(Clone)]
pub struct JwtIssuer {
    pub config: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl JwtIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        validate_token_at(token, &self.config, self.clock.now())
    }
}

impl CredentialIssuer for JwtIssuer {
    fn issue(&self, subject: &VerifiedSubject) -> Result<Credential> {
        let claims = Claims::new(Uuid::new_v4(), subject, self.config.ttl, self.clock.now());
        Ok(Credential {
            token: sign_claims(&claims, &self.config)?,
            session_id: claims.sid,
            expires_at: claims.exp,
        })
    }
}
