//! Deduplicating string interner.
//!
//! Distinct strings are appended to one byte arena in first-seen order and
//! addressed by dense `u32` indices. The arena is therefore already the
//! concatenated dictionary an Arrow consumer expects, and `offsets()` gives
//! the matching value offsets.

use ahash::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::ops::Range;

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    arena: String,
    spans: Vec<Range<usize>>,
    // string hash -> indices sharing that hash
    lookup: HashMap<u64, Vec<u32>>,
    hasher: RandomState,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(strings: usize, bytes: usize) -> Self {
        Self {
            arena: String::with_capacity(bytes),
            spans: Vec::with_capacity(strings),
            lookup: HashMap::with_capacity(strings),
            hasher: RandomState::new(),
        }
    }

    /// Index of `s`, assigning the next free index on first sight
    pub fn intern(&mut self, s: &str) -> u32 {
        let hash = self.hasher.hash_one(s);
        if let Some(idx) = self.find(hash, s) {
            return idx;
        }

        let idx = self.spans.len() as u32;
        let start = self.arena.len();
        self.arena.push_str(s);
        self.spans.push(start..self.arena.len());
        self.lookup.entry(hash).or_default().push(idx);
        idx
    }

    /// Index of `s` if it has been interned
    pub fn get(&self, s: &str) -> Option<u32> {
        self.find(self.hasher.hash_one(s), s)
    }

    fn find(&self, hash: u64, s: &str) -> Option<u32> {
        self.lookup
            .get(&hash)?
            .iter()
            .copied()
            .find(|&idx| self.arena[self.spans[idx as usize].clone()] == *s)
    }

    pub fn unintern(&self, idx: u32) -> Option<&str> {
        self.spans
            .get(idx as usize)
            .map(|span| &self.arena[span.clone()])
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans.iter().map(|span| &self.arena[span.clone()])
    }

    /// UTF-8 bytes of every distinct string, concatenated in index order
    pub fn bytes(&self) -> &[u8] {
        self.arena.as_bytes()
    }

    /// Cumulative byte offsets; `len() + 1` entries starting at zero
    pub fn offsets(&self) -> Vec<i32> {
        let mut offsets = Vec::with_capacity(self.spans.len() + 1);
        offsets.push(0);
        offsets.extend(self.spans.iter().map(|span| span.end as i32));
        offsets
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.spans.clear();
        self.lookup.clear();
    }
}
