use crate::error::{AuthError, Result};
use secrecy::Secret;
use serde::Deserialize;

/// Default lifetime of an issued challenge, in seconds (20 minutes)
pub const DEFAULT_CHALLENGE_TTL: u64 = 20 * 60;

/// Default maximum distance between a proof timestamp and now, in seconds
pub const DEFAULT_TIMESTAMP_TOLERANCE: u64 = 15 * 60;

/// Configuration for JWT token creation and validation
///
/// This struct contains the settings needed for JWT operations:
/// - A secret key for signing and verifying tokens
/// - Token lifetime (TTL) in seconds
///
/// # Security Note
/// The secret should be a strong, randomly generated key. For production use,
/// generate at least 256 bits of random data and encode it as base64.
///
/// # Example
/// ```rust
/// use ton_proof_jwt::JwtConfig;
/// use secrecy::Secret;
/// use base64::prelude::*;
///
/// let config = JwtConfig {
///     secret: Secret::new(BASE64_STANDARD.encode("your-256-bit-secret-key")),
///     ttl: 3600, // 1 hour
/// };
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct JwtConfig {
    /// JWT secret key, base64 encoded string
    ///
    /// This secret is used to sign and verify JWT tokens. It should be:
    /// - At least 256 bits (32 bytes) of random data
    /// - Base64 encoded
    /// - Kept secure and not committed to version control
    pub secret: Secret<String>,
    /// JWT Time To Live (TTL) in seconds
    pub ttl: i64,
}

/// Policy for accepting `ton_proof` submissions
#[derive(Clone, Debug, Deserialize)]
pub struct ProofConfig {
    /// Domain the wallet must have signed, compared byte for byte
    pub expected_domain: String,
    /// Seconds an issued challenge stays usable
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl: u64,
    /// Accepted distance in seconds between the proof timestamp and now,
    /// in either direction
    #[serde(default = "default_timestamp_tolerance")]
    pub timestamp_tolerance: u64,
    /// Require the supplied `StateInit` to deploy to the claimed address
    #[serde(default)]
    pub require_address_match: bool,
}

impl ProofConfig {
    /// Policy with the default windows for the given domain
    pub fn new(expected_domain: impl Into<String>) -> Self {
        Self {
            expected_domain: expected_domain.into(),
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            timestamp_tolerance: DEFAULT_TIMESTAMP_TOLERANCE,
            require_address_match: false,
        }
    }
}

fn default_challenge_ttl() -> u64 {
    DEFAULT_CHALLENGE_TTL
}

fn default_timestamp_tolerance() -> u64 {
    DEFAULT_TIMESTAMP_TOLERANCE
}

/// Full configuration of an [`AuthService`](crate::AuthService)
///
/// # Example
/// ```rust
/// use ton_proof_jwt::AuthConfig;
///
/// let config = AuthConfig::from_toml_str(r#"
///     [jwt]
///     secret = "c2VjcmV0"
///     ttl = 3600
///
///     [proof]
///     expected_domain = "example.com"
/// "#).unwrap();
/// assert_eq!(config.proof.challenge_ttl, 1200);
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub proof: ProofConfig,
}

impl AuthConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| AuthError::Config(e.to_string()))
    }
}
