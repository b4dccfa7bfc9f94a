//! Block hash generation for the simulated ledger.

use std::collections::VecDeque;

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a block hash in hex characters.
pub const BLOCK_HASH_LEN: usize = 16;

/// Produces block hashes. Injected so tests can script the chain.
pub trait HashSource: Send {
    fn next_hash(&mut self) -> String;
}

/// Whether `hash` is exactly 16 lowercase hex characters.
pub fn is_valid_block_hash(hash: &str) -> bool {
    hash.len() == BLOCK_HASH_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// SHA-256 over a random number and the current time, truncated to 16 hex
/// characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomHashSource;

impl HashSource for RandomHashSource {
    fn next_hash(&mut self) -> String {
        let seed: f64 = rand::rng().random();
        let data = format!("{seed}{}", Utc::now().to_rfc3339());
        let digest = format!("{:x}", Sha256::digest(data.as_bytes()));
        digest[..BLOCK_HASH_LEN].to_string()
    }
}

/// Hands out a fixed list of hashes, then empty strings.
#[derive(Debug, Default, Clone)]
pub struct ScriptedHashSource {
    hashes: VecDeque<String>,
}

impl ScriptedHashSource {
    pub fn new<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hashes: hashes.into_iter().map(Into::into).collect(),
        }
    }
}

impl HashSource for ScriptedHashSource {
    fn next_hash(&mut self) -> String {
        self.hashes.pop_front().unwrap_or_default()
    }
}
