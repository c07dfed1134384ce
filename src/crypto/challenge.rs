use crate::{
    clock::Clock,
    config::DEFAULT_CHALLENGE_TTL,
    error::{AuthError, Result},
};
use base64::prelude::*;
use parking_lot::Mutex;
use rand::{rngs::OsRng, RngCore};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Generate a cryptographically secure random challenge
///
/// Returns 32 random bytes from the OS entropy source, encoded as unpadded
/// URL-safe base64 so the token can travel in JSON, URLs and headers as is.
///
/// # Example
/// ```rust
/// use ton_proof_jwt::crypto::challenge::generate_challenge;
///
/// let challenge = generate_challenge().unwrap();
/// assert_eq!(challenge.len(), 43);
/// ```
pub fn generate_challenge() -> Result<String> {
    let mut challenge_bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut challenge_bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(challenge_bytes))
}

/// Table size at which `register` first sweeps out expired entries
const SWEEP_FLOOR: usize = 1024;

struct Table {
    entries: HashMap<String, i64>,
    /// Size that triggers the next sweep
    sweep_at: usize,
}

impl Table {
    fn sweep(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| now <= *expires_at);
        self.sweep_at = (self.entries.len() * 2).max(SWEEP_FLOOR);
        before - self.entries.len()
    }
}

/// Issued challenges and their expiry instants
///
/// Every check that removes a token does so under the same lock that reads
/// it, so a token can be consumed at most once no matter how many requests
/// race on it. Tokens nobody comes back for are swept out by `register`
/// whenever the table has doubled since the last sweep.
pub struct ChallengeStore {
    table: Mutex<Table>,
    clock: Arc<dyn Clock>,
    ttl: u64,
}

impl ChallengeStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, DEFAULT_CHALLENGE_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: u64) -> Self {
        Self {
            table: Mutex::new(Table {
                entries: HashMap::new(),
                sweep_at: SWEEP_FLOOR,
            }),
            clock,
            ttl,
        }
    }

    /// Generate a fresh token and start its expiry window
    pub fn issue(&self) -> Result<String> {
        let token = generate_challenge()?;
        self.register(token.clone());
        Ok(token)
    }

    /// Track a token produced elsewhere with the standard expiry window
    pub fn register(&self, token: impl Into<String>) {
        let now = self.clock.now();
        let mut table = self.table.lock();
        if table.entries.len() >= table.sweep_at {
            let removed = table.sweep(now);
            debug!(removed, remaining = table.entries.len(), "swept expired challenges");
        }
        table
            .entries
            .insert(token.into(), now.saturating_add_unsigned(self.ttl));
    }

    /// Whether `token` was issued and has not yet expired
    ///
    /// An expired entry is evicted as a side effect. A live entry is left in
    /// place.
    pub fn is_live(&self, token: &str) -> bool {
        let now = self.clock.now();
        let mut table = self.table.lock();
        match table.entries.get(token).copied() {
            Some(expires_at) if now > expires_at => {
                table.entries.remove(token);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Remove `token`, returning whether it was live at that moment
    pub fn consume(&self, token: &str) -> bool {
        let now = self.clock.now();
        match self.table.lock().entries.remove(token) {
            Some(expires_at) => now <= expires_at,
            None => false,
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.table.lock().sweep(now)
    }

    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
