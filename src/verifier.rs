//! Proof verification: challenge freshness, domain, time window, key
//! extraction, address binding and signature, in that order.

use crate::{
    address::Address,
    clock::{Clock, SystemClock},
    config::ProofConfig,
    crypto::{
        challenge::ChallengeStore,
        message::{build_message, TonProof},
        signature::verify_signature,
    },
    error::{AuthError, RejectReason, Result},
    state_init::{extract_public_key, state_init_hash},
};
use base64::prelude::*;
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, info};

/// Final decision on a proof
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Verified)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Verified => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        state.serialize_field("valid", &self.is_valid())?;
        state.serialize_field("error_reason", &self.reason())?;
        state.end()
    }
}

/// Verifies `ton_proof` submissions against issued challenges
///
/// The verifier owns no global state: the challenge table is handed in as
/// an [`ChallengeStore`] and may be shared with other verifiers.
pub struct ProofVerifier {
    store: Arc<ChallengeStore>,
    clock: Arc<dyn Clock>,
    config: ProofConfig,
}

impl ProofVerifier {
    /// Verifier on the system clock with its own challenge table
    pub fn new(config: ProofConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(ChallengeStore::with_ttl(clock.clone(), config.challenge_ttl));
        Self::with_parts(store, clock, config)
    }

    pub fn with_parts(
        store: Arc<ChallengeStore>,
        clock: Arc<dyn Clock>,
        config: ProofConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<ChallengeStore> {
        &self.store
    }

    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    /// Issue a new challenge for a wallet to sign
    pub fn issue_challenge(&self) -> Result<String> {
        self.store.issue()
    }

    /// Verify that the owner of `address` signed `proof`
    ///
    /// `state_init` is the wallet's serialized `StateInit`, the only source
    /// of the public key. On [`Verdict::Verified`] the challenge has been
    /// consumed and cannot be used again.
    ///
    /// # Errors
    /// `MalformedInput` when the address, signature encoding or declared
    /// domain length is unusable. Every other failure is a
    /// [`Verdict::Rejected`].
    pub fn verify_proof(
        &self,
        address: &str,
        proof: &TonProof,
        state_init: &[u8],
    ) -> Result<Verdict> {
        Ok(match self.check(address, proof, state_init)? {
            Ok(_) => Verdict::Verified,
            Err(reason) => Verdict::Rejected(reason),
        })
    }

    /// Same checks as [`verify_proof`](Self::verify_proof), yielding the
    /// parsed address and signing key on success
    pub(crate) fn check(
        &self,
        address: &str,
        proof: &TonProof,
        state_init: &[u8],
    ) -> Result<std::result::Result<(Address, [u8; 32]), RejectReason>> {
        let address = Address::parse(address)?;
        let signature = decode_signature(&proof.signature)?;
        let message = build_message(&address, proof)?;

        let outcome = self.evaluate(&address, proof, &signature, &message, state_init);
        match outcome {
            Ok(public_key) => {
                info!(%address, "ton proof verified");
                Ok(Ok((address, public_key)))
            }
            Err(reason) => {
                debug!(%address, %reason, domain = %proof.domain.value, "ton proof rejected");
                Ok(Err(reason))
            }
        }
    }

    fn evaluate(
        &self,
        address: &Address,
        proof: &TonProof,
        signature: &[u8],
        message: &[u8],
        state_init: &[u8],
    ) -> std::result::Result<[u8; 32], RejectReason> {
        if !self.store.is_live(&proof.payload) {
            return Err(RejectReason::ChallengeInvalidOrExpired);
        }

        if proof.domain.value != self.config.expected_domain {
            return Err(RejectReason::InvalidDomain);
        }

        let now = self.clock.now();
        if now.abs_diff(proof.timestamp) > self.config.timestamp_tolerance {
            return Err(RejectReason::TimestampExpired);
        }

        let public_key = extract_public_key(state_init).ok_or(RejectReason::KeyUnavailable)?;

        if self.config.require_address_match
            && state_init_hash(state_init) != Some(address.hash)
        {
            return Err(RejectReason::AddressMismatch);
        }

        if !verify_signature(&public_key, signature, message) {
            return Err(RejectReason::SignatureInvalid);
        }

        // a concurrent request may have used the same proof in the meantime
        if !self.store.consume(&proof.payload) {
            return Err(RejectReason::ChallengeInvalidOrExpired);
        }

        Ok(public_key)
    }
}

fn decode_signature(signature: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(signature)
        .or_else(|_| BASE64_URL_SAFE.decode(signature))
        .map_err(|_| AuthError::MalformedInput("signature is not base64".to_string()))
}
