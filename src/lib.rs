//! # ton-proof-jwt
//!
//! A Rust library for **TON Connect wallet ownership proofs** (`ton_proof`) with
//! **JWT session management**. Provides the server-side half of the flow where
//! a wallet proves it controls the key behind a TON address by signing a
//! server-issued challenge.
//!
//! ## Features
//!
//! - **Single-use challenges** - 32-byte random payloads with a 20 minute lifetime
//! - **Exact `ton-proof-item-v2` message construction** - byte-for-byte what wallets sign
//! - **Ed25519 verification** over the `0xffff ++ "ton-connect"` framed digest
//! - **Public key extraction** straight from the wallet's `StateInit` bag of cells
//! - **JWT sessions** issued once a proof verifies
//! - **Structured verdicts** - every rejection carries a stable reason code
//!
//! ## Quick Start
//!
//! ```rust
//! use ton_proof_jwt::{
//!     AuthConfig, AuthError, AuthRequest, AuthService, JwtConfig, ProofConfig, ProofDomain,
//!     TonProof,
//! };
//! use secrecy::Secret;
//! use base64::prelude::*;
//!
//! // Setup authentication service
//! let config = AuthConfig {
//!     jwt: JwtConfig {
//!         secret: Secret::new(BASE64_STANDARD.encode("your-secret-key")),
//!         ttl: 3600, // 1 hour
//!     },
//!     proof: ProofConfig::new("example.com"),
//! };
//! let auth_service = AuthService::new(config);
//!
//! // Generate challenge, the wallet signs it as its ton_proof payload
//! let challenge = auth_service.generate_challenge().unwrap();
//!
//! // Authenticate with the proof the wallet returned
//! let auth_request = AuthRequest {
//!     address: format!("0:{}", "00".repeat(32)),
//!     proof: TonProof {
//!         timestamp: 1_700_000_000,
//!         domain: ProofDomain::new("example.com"),
//!         payload: challenge,
//!         signature: BASE64_STANDARD.encode([0u8; 64]),
//!     },
//!     state_init: "te6cckEBAQEAAgAAAEysuc0=".to_string(),
//!     external_id: None,
//! };
//!
//! match auth_service.authenticate(auth_request) {
//!     Ok(response) => println!("JWT Token: {}", response.session_token),
//!     Err(AuthError::ProofRejected(reason)) => println!("Rejected: {}", reason),
//!     Err(e) => println!("Authentication failed: {}", e),
//! }
//! ```
//!
//! ## Examples
//!
//! See the [basic_workflow demo](demos/basic_workflow.rs) for a complete flow
//! with a real wallet key:
//!
//! ```bash
//! cargo run --example basic_workflow
//! ```

pub mod address;
pub mod auth;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod state_init;
pub mod verifier;

// Re-export main types for easier access
pub use address::Address;
pub use auth::{
    AuthRequest, AuthResponse, AuthService, Credential, CredentialIssuer, VerifiedSubject,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, JwtConfig, ProofConfig};
pub use crypto::challenge::{generate_challenge, ChallengeStore};
pub use crypto::jwt::{create_jwt, validate_token, Claims, JwtIssuer};
pub use crypto::message::{build_message, ProofDomain, TonProof};
pub use crypto::signature::verify_signature;
pub use error::{AuthError, RejectReason, Result};
pub use state_init::extract_public_key;
pub use verifier::{ProofVerifier, Verdict};
