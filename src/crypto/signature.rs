use ed25519_dalek::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

/// Tag mixed into the outer hash so a proof signature cannot be replayed as
/// a signature for any other TON Connect message type
pub const DOMAIN_TAG: &[u8] = b"ton-connect";

/// Compute the 32-byte digest a wallet actually signs for `message`
///
/// `sha256(0xff 0xff "ton-connect" sha256(message))`
pub fn proof_digest(message: &[u8]) -> [u8; 32] {
    let message_hash = Sha256::digest(message);

    let mut hasher = Sha256::new();
    hasher.update([0xff, 0xff]);
    hasher.update(DOMAIN_TAG);
    hasher.update(message_hash);
    hasher.finalize().into()
}

/// Verify an Ed25519 proof signature over `message`
///
/// The signature is checked against [`proof_digest`] of the message, never
/// the message itself. Any malformed key or signature yields `false`.
///
/// # Example
/// ```rust
/// use ton_proof_jwt::crypto::signature::verify_signature;
///
/// assert!(!verify_signature(&[0u8; 32], &[0u8; 64], b"message"));
/// assert!(!verify_signature(&[0u8; 31], &[0u8; 64], b"message"));
/// ```
pub fn verify_signature(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };

    verifying_key
        .verify_strict(&proof_digest(message), &signature)
        .is_ok()
}
