//! ## Exact representation
//! Counts cardinality exactly in `[0..EXACT_THRESHOLD]` range by storing every distinct 64-bit hash.
//!
//! Once it holds more than `EXACT_THRESHOLD` hashes it costs more memory than
//! the dense registers and the owning `Sketch` migrates it.

use std::mem::{size_of, size_of_val};

use hashbrown::HashSet;

use crate::dense::DenseSketch;

/// Maximum number of hashes kept before migrating to dense representation
pub const EXACT_THRESHOLD: usize = 192;

/// Exact representation container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactSet {
    hashes: HashSet<u64>,
}

impl ExactSet {
    /// Create new empty instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert 64-bit hash.
    /// Returns true if the hash was not present before.
    #[inline]
    pub fn add(&mut self, hash: u64) -> bool {
        self.hashes.insert(hash)
    }

    /// Return exact number of distinct hashes
    #[inline]
    pub fn cardinality(&self) -> u64 {
        self.hashes.len() as u64
    }

    /// Return whether the set outgrew `EXACT_THRESHOLD`
    #[inline]
    pub fn needs_migration(&self) -> bool {
        self.hashes.len() > EXACT_THRESHOLD
    }

    /// Replay every stored hash into `target`.
    ///
    /// `target` may be receiving concurrent `add` calls; registers only ever grow,
    /// so the replay commutes with them.
    pub fn migrate_into(self, target: &DenseSketch) {
        for &hash in self.hashes.iter() {
            target.add(hash);
        }
    }

    /// Return stored hashes sorted in ascending order
    pub fn sorted_hashes(&self) -> Vec<u64> {
        let mut hashes: Vec<u64> = self.hashes.iter().copied().collect();
        hashes.sort_unstable();
        hashes
    }

    /// Return number of stored hashes
    #[inline]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Return whether no hash was stored yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Return memory size of `ExactSet`
    pub fn size_of(&self) -> usize {
        // buckets plus one control byte per bucket
        size_of_val(self) + self.hashes.capacity() * (size_of::<u64>() + 1)
    }
}

impl FromIterator<u64> for ExactSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}
