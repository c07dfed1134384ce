use crate::{
    address::Address,
    error::{AuthError, Result},
};
use serde::{Deserialize, Serialize};

/// Prefix of every signed proof message
pub const PROOF_PREFIX: &[u8] = b"ton-proof-item-v2/";

/// Domain the wallet claims to be signing for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofDomain {
    /// Byte length of `value` as declared by the wallet
    pub length_bytes: u32,
    pub value: String,
}

impl ProofDomain {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            length_bytes: value.len() as u32,
            value,
        }
    }
}

/// A `ton_proof` as produced by a TON Connect wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonProof {
    /// Unix seconds at which the wallet signed
    pub timestamp: i64,
    pub domain: ProofDomain,
    /// The challenge issued by this server
    pub payload: String,
    /// Base64 Ed25519 signature
    pub signature: String,
}

/// Serialize the exact bytes a wallet signs for `proof` on behalf of `address`
///
/// Layout: prefix, workchain (i32 BE), account hash, domain length (u32 LE),
/// domain, timestamp (u64 LE), payload. Nothing else is inserted between
/// fields.
///
/// # Errors
/// `MalformedInput` when `domain.length_bytes` disagrees with the domain
/// value.
///
/// # Example
/// ```rust
/// use ton_proof_jwt::{Address, ProofDomain, TonProof};
/// use ton_proof_jwt::crypto::message::build_message;
///
/// let address = Address::new(0, [0u8; 32]);
/// let proof = TonProof {
///     timestamp: 1_700_000_000,
///     domain: ProofDomain::new("example.com"),
///     payload: "abc123".to_string(),
///     signature: String::new(),
/// };
/// let message = build_message(&address, &proof).unwrap();
/// assert!(message.starts_with(b"ton-proof-item-v2/"));
/// assert!(message.ends_with(b"abc123"));
/// ```
pub fn build_message(address: &Address, proof: &TonProof) -> Result<Vec<u8>> {
    let domain = proof.domain.value.as_bytes();
    if proof.domain.length_bytes as usize != domain.len() {
        return Err(AuthError::MalformedInput(format!(
            "domain length {} does not match {} domain bytes",
            proof.domain.length_bytes,
            domain.len()
        )));
    }

    let payload = proof.payload.as_bytes();
    let mut message =
        Vec::with_capacity(PROOF_PREFIX.len() + 4 + 32 + 4 + domain.len() + 8 + payload.len());
    message.extend_from_slice(PROOF_PREFIX);
    message.extend_from_slice(&address.workchain.to_be_bytes());
    message.extend_from_slice(&address.hash);
    message.extend_from_slice(&proof.domain.length_bytes.to_le_bytes());
    message.extend_from_slice(domain);
    message.extend_from_slice(&proof.timestamp.to_le_bytes());
    message.extend_from_slice(payload);

    Ok(message)
}
