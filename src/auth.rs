use crate::{
    address::Address,
    clock::{Clock, SystemClock},
    config::{AuthConfig, ProofConfig},
    crypto::{
        challenge::ChallengeStore,
        jwt::{Claims, JwtIssuer},
        message::TonProof,
    },
    error::{AuthError, Result},
    verifier::ProofVerifier,
};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// An address whose ownership has just been proven
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedSubject {
    pub address: Address,
    /// Ed25519 key that signed the proof
    pub public_key: [u8; 32],
    /// Caller-supplied identifier to bind to the address
    pub external_id: Option<String>,
}

/// An opaque bearer credential handed out after verification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: i64,
}

/// Turns a verified subject into a credential
///
/// The proof engine does not care how credentials are signed; it only needs
/// one per successful verification.
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self, subject: &VerifiedSubject) -> Result<Credential>;
}

/// Authentication service for TON Connect wallet ownership proofs
///
/// This service provides the full server-side flow:
/// - Challenge generation for wallets to embed in a `ton_proof`
/// - Proof verification against the wallet's `StateInit`
/// - Credential (JWT by default) creation for authenticated sessions
/// - JWT token validation
///
/// Issued challenges live in memory inside the service and are consumed on
/// the first successful authentication.
pub struct AuthService<I = JwtIssuer> {
    verifier: ProofVerifier,
    issuer: I,
}

/// Request structure for authenticating with a signed proof
///
/// This contains all the data needed to verify a wallet:
/// - The claimed account address (raw or user-friendly)
/// - The `ton_proof` returned by the wallet
/// - The wallet's `StateInit`, base64 encoded bag of cells
/// - Optionally, an identifier of the caller's own to bind to the address
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub address: String,
    pub proof: TonProof,
    #[serde(alias = "walletStateInit")]
    pub state_init: String,
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Response structure containing authentication results
///
/// Returned after successful proof verification, contains:
/// - A session token for subsequent API requests
/// - Session identifier for tracking
/// - Token expiration timestamp
/// - The verified address in raw form
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub session_id: Uuid,
    pub session_token: String,
    pub expires_at: i64,
    pub address: String,
}

impl AuthService<JwtIssuer> {
    /// Create a new authentication service from configuration
    ///
    /// # Example
    /// ```rust
    /// use ton_proof_jwt::{AuthService, AuthConfig, JwtConfig, ProofConfig};
    /// use secrecy::Secret;
    /// use base64::prelude::*;
    ///
    /// let config = AuthConfig {
    ///     jwt: JwtConfig {
    ///         secret: Secret::new(BASE64_STANDARD.encode("your-secret")),
    ///         ttl: 3600, // 1 hour
    ///     },
    ///     proof: ProofConfig::new("example.com"),
    /// };
    /// let auth_service = AuthService::new(config);
    /// let challenge = auth_service.generate_challenge().unwrap();
    /// assert!(auth_service.verifier().store().is_live(&challenge));
    /// ```
    pub fn new(config: AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Service whose challenges, proof windows and sessions all follow `clock`
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(ChallengeStore::with_ttl(
            clock.clone(),
            config.proof.challenge_ttl,
        ));
        let verifier = ProofVerifier::with_parts(store, clock.clone(), config.proof);
        Self::with_parts(verifier, JwtIssuer::with_clock(config.jwt, clock))
    }

    /// Validate a JWT session token
    ///
    /// Verifies that a JWT token is:
    /// - Properly formatted
    /// - Signed with the correct secret
    /// - Not expired
    ///
    /// # Returns
    /// * `Ok(Claims)` - Token is valid, returns parsed claims
    /// * `Err(AuthError)` - Token is invalid, expired, or malformed
    pub fn validate_session(&self, token: &str) -> Result<Claims> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        self.issuer.validate(token)
    }
}

impl<I: CredentialIssuer> AuthService<I> {
    pub fn with_parts(verifier: ProofVerifier, issuer: I) -> Self {
        Self { verifier, issuer }
    }

    pub fn verifier(&self) -> &ProofVerifier {
        &self.verifier
    }

    pub fn proof_config(&self) -> &ProofConfig {
        self.verifier.config()
    }

    /// Generate a fresh challenge and remember it
    ///
    /// The challenge should be:
    /// 1. Sent to the client
    /// 2. Passed by the client to its wallet as the `ton_proof` payload
    /// 3. Submitted back inside the signed proof
    pub fn generate_challenge(&self) -> Result<String> {
        self.verifier.issue_challenge().inspect_err(|e| {
            warn!(error = %e, "challenge generation failed");
        })
    }

    /// Authenticate a wallet by verifying its signed proof
    ///
    /// This is the core authentication method that:
    /// 1. Decodes the base64 `StateInit`
    /// 2. Verifies the proof (challenge, domain, timestamp, key, signature)
    /// 3. Issues a credential on successful verification
    ///
    /// # Errors
    /// - `MalformedInput` - Address, signature, domain length or `StateInit`
    ///   encoding is unusable
    /// - `ProofRejected` - The proof was checked and turned down; carries the
    ///   reason code
    /// - `JwtError` / `Base64Error` - The credential could not be issued
    pub fn authenticate(&self, auth_request: AuthRequest) -> Result<AuthResponse> {
        let state_init = BASE64_STANDARD
            .decode(auth_request.state_init.trim())
            .or_else(|_| BASE64_URL_SAFE.decode(auth_request.state_init.trim()))
            .map_err(|_| AuthError::MalformedInput("state init is not base64".to_string()))?;

        let (address, public_key) = self
            .verifier
            .check(&auth_request.address, &auth_request.proof, &state_init)?
            .map_err(AuthError::ProofRejected)?;

        let subject = VerifiedSubject {
            address,
            public_key,
            external_id: auth_request.external_id,
        };
        let credential = self.issuer.issue(&subject).inspect_err(|e| {
            warn!(%address, error = %e, "credential issuance failed");
        })?;

        Ok(AuthResponse {
            session_id: credential.session_id,
            session_token: credential.token,
            expires_at: credential.expires_at,
            address: address.to_string(),
        })
    }
}
