use std::{collections::BTreeMap, hash::Hasher};

use crate::routing::{CellId, Label};

/// A deterministic FNV-1a 64-bit hasher.
///
/// `DefaultHasher` is seeded per process, so it cannot fingerprint results
/// that must match across runs.
#[derive(Debug)]
pub struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Order-sensitive fingerprint of a set of upstream compositions.
///
/// Every cell id, sequence length and label is written as a little-endian
/// `u64`, so the digest is the same on every target.
pub fn composition_digest(hsd_upstr: &BTreeMap<CellId, Vec<Label>>) -> u64 {
    let mut hasher = FnvHasher::new();
    for (cell, labels) in hsd_upstr {
        hasher.write(&(*cell as u64).to_le_bytes());
        hasher.write(&(labels.len() as u64).to_le_bytes());
        for label in labels {
            hasher.write(&label.to_le_bytes());
        }
    }
    hasher.finish()
}
