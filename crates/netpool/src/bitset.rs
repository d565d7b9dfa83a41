//! Fixed-capacity bit pool
//!
//! The allocation primitive behind every resource pool: a bit-indexed map
//! from id to availability, where a set bit means "free" and a cleared bit
//! means "allocated". The word-chunked `next_set` scan implements the
//! first-fit policy — allocation always returns the lowest available index,
//! never round-robin.

use serde::{Deserialize, Serialize};
use tracing::debug;

const WORD_BITS: usize = 64;

/// Fixed-capacity bit vector backing one allocation pool.
///
/// Indexes outside the capacity are tolerated rather than fatal: `set` and
/// `clear` ignore them (logged at debug), `test` reports them as unset.
/// The capacity never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitPool {
    capacity: usize,
    words: Vec<u64>,
}

impl BitPool {
    /// Create a pool of `capacity` bits, all clear
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            words: vec![0; capacity.div_ceil(WORD_BITS)],
        }
    }

    /// Create a pool of `capacity` bits, all set
    #[must_use]
    pub fn all_set(capacity: usize) -> Self {
        let mut pool = Self::new(capacity);
        for word in &mut pool.words {
            *word = u64::MAX;
        }
        pool.mask_tail();
        pool
    }

    /// Number of bits in the pool
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set bit `index` (mark free); out-of-range indexes are ignored
    pub fn set(&mut self, index: usize) {
        if index >= self.capacity {
            debug!("ignoring set of bit {index} beyond capacity {}", self.capacity);
            return;
        }
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    /// Clear bit `index` (mark allocated); out-of-range indexes are ignored
    pub fn clear(&mut self, index: usize) {
        if index >= self.capacity {
            debug!("ignoring clear of bit {index} beyond capacity {}", self.capacity);
            return;
        }
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    /// True when bit `index` is set; out-of-range indexes read as unset
    #[must_use]
    pub fn test(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Lowest set bit at or above `from`, scanning word by word
    #[must_use]
    pub fn next_set(&self, from: usize) -> Option<usize> {
        if from >= self.capacity {
            return None;
        }

        let mut word_index = from / WORD_BITS;
        // Mask off bits below `from` in the first word
        let mut word = self.words[word_index] & (u64::MAX << (from % WORD_BITS));

        loop {
            if word != 0 {
                let index = word_index * WORD_BITS + word.trailing_zeros() as usize;
                return (index < self.capacity).then_some(index);
            }
            word_index += 1;
            if word_index == self.words.len() {
                return None;
            }
            word = self.words[word_index];
        }
    }

    /// Fresh pool with every in-capacity bit flipped.
    ///
    /// Always an independent copy: the two pools diverge freely afterwards.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut flipped = Self {
            capacity: self.capacity,
            words: self.words.iter().map(|word| !word).collect(),
        };
        flipped.mask_tail();
        flipped
    }

    /// Number of set (free) bits
    #[must_use]
    pub fn count_set(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Zero any bits above the capacity in the last word
    fn mask_tail(&mut self) {
        let tail_bits = self.capacity % WORD_BITS;
        if tail_bits == 0 {
            return;
        }
        if let Some(last) = self.words.last_mut() {
            *last &= (1 << tail_bits) - 1;
        }
    }
}
