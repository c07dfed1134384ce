use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a well-formed proof was turned down
///
/// These are expected outcomes of verification, not faults. Each variant maps
/// to a stable reason code that is safe to hand back to an untrusted caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The payload was never issued, has expired, or was already used
    ChallengeInvalidOrExpired,
    /// The signed domain is not the domain this server expects
    InvalidDomain,
    /// The proof timestamp is outside the accepted window around "now"
    TimestampExpired,
    /// No public key could be read from the supplied account state
    KeyUnavailable,
    /// The account state does not deploy to the claimed address
    AddressMismatch,
    /// The signature does not verify against the extracted key
    SignatureInvalid,
}

impl RejectReason {
    /// Stable wire code for this reason
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ChallengeInvalidOrExpired => "challenge_invalid_or_expired",
            RejectReason::InvalidDomain => "invalid_domain",
            RejectReason::TimestampExpired => "timestamp_expired",
            RejectReason::KeyUnavailable => "key_unavailable",
            RejectReason::AddressMismatch => "address_mismatch",
            RejectReason::SignatureInvalid => "signature_invalid",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication and cryptographic operation errors
///
/// A rejected proof surfaces as [`AuthError::ProofRejected`] carrying only the
/// reason code. Malformed caller input is reported separately as
/// [`AuthError::MalformedInput`] so it can be told apart from a failed proof.
///
/// # Example
/// ```rust
/// use ton_proof_jwt::{AuthError, RejectReason, Result};
///
/// fn handle_auth_result(result: Result<()>) {
///     match result {
///         Ok(()) => println!("Operation successful"),
///         Err(AuthError::ProofRejected(reason)) => println!("Rejected: {}", reason),
///         Err(AuthError::ExpiredToken) => println!("Token has expired"),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
///
/// handle_auth_result(Err(AuthError::ProofRejected(RejectReason::InvalidDomain)));
/// ```
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request itself is unusable
    ///
    /// This error occurs when:
    /// - The address is not a valid raw or user-friendly TON address
    /// - The signature is not base64
    /// - The declared domain length does not match the domain value
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The proof was checked and rejected
    #[error("proof rejected: {0}")]
    ProofRejected(RejectReason),

    /// JWT token is invalid, malformed, or has wrong signature
    #[error("invalid or malformed JWT token")]
    InvalidToken,

    /// Token has expired
    ///
    /// This error occurs when the JWT's expiration timestamp
    /// is in the past relative to the current time.
    #[error("token has expired")]
    ExpiredToken,

    /// Base64 decoding failed
    #[error("base64 decode error: {0}")]
    Base64Error(String),

    /// JWT creation or parsing error
    ///
    /// This error occurs when:
    /// - JWT encoding/decoding fails
    /// - The secret is invalid
    /// - The claims structure is incompatible
    #[error("JWT error: {0}")]
    JwtError(String),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// The operating system entropy source failed
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_match_serde() {
        for reason in [
            RejectReason::ChallengeInvalidOrExpired,
            RejectReason::InvalidDomain,
            RejectReason::TimestampExpired,
            RejectReason::KeyUnavailable,
            RejectReason::AddressMismatch,
            RejectReason::SignatureInvalid,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_rejection_display_is_only_the_code() {
        let err = AuthError::ProofRejected(RejectReason::KeyUnavailable);
        assert_eq!(err.to_string(), "proof rejected: key_unavailable");
    }
}
