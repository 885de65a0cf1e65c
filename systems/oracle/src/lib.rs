#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic oracle that maps string keys to unit-interval samples.
//!
//! Every stochastic decision in Geocoin (whether a cell hosts a cache, how
//! many tokens it may mint, which colour it is drawn in) is answered by
//! hashing a key that names the decision. The same key always yields the same
//! sample, across calls, processes and platforms, so revisiting a cell after a
//! restart reproduces exactly what the player saw before.

use sha2::{Digest, Sha256};

/// Separator placed between the parts of a composite key.
pub const KEY_SEPARATOR: char = ',';

/// Discriminator naming the mint-budget decision of a cache.
pub const INITIAL_VALUE_KEY: &str = "initialValue";

const UNIT_SCALE: f64 = (1u64 << 53) as f64;

/// Seeded oracle. The default seed of zero matches [`luck`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Oracle {
    seed: u64,
}

impl Oracle {
    /// Creates an oracle that mixes `seed` into every key.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed mixed into every key.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Sample in `[0, 1)` for the provided key.
    #[must_use]
    pub fn luck(&self, key: &str) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        // 53 bits fill the f64 mantissa exactly, so the quotient stays below 1.
        (u64::from_le_bytes(bytes) >> 11) as f64 / UNIT_SCALE
    }
}

/// Sample in `[0, 1)` for the provided key using the default seed.
#[must_use]
pub fn luck(key: &str) -> f64 {
    Oracle::default().luck(key)
}

/// Joins key parts with [`KEY_SEPARATOR`].
#[must_use]
pub fn join_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for (index, part) in parts.into_iter().enumerate() {
        if index > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(part.as_ref());
    }
    key
}

/// Key naming the spawn decision of the cell `(i, j)`.
#[must_use]
pub fn cell_key(i: i32, j: i32) -> String {
    join_key([i.to_string(), j.to_string()])
}

/// Key naming a secondary decision about the cell `(i, j)`.
#[must_use]
pub fn cell_key_with(i: i32, j: i32, discriminator: &str) -> String {
    join_key([i.to_string(), j.to_string(), discriminator.to_owned()])
}
