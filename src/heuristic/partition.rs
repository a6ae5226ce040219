//! Enumeration of all ways to cut a sequence into contiguous pieces
//!
//! A sequence of `L` characters has `L - 1` inner gaps. Choosing `n - 1` of
//! them as cut points yields one partition into `n` pieces, so there are
//! exactly `C(L - 1, n - 1)` partitions. Each partition is returned as a set
//! because consumers only ask whether any piece occurs in a read.

use std::collections::BTreeSet;

use crate::error::{ArgumentError, Result};

/// A lazily enumerated collection of partitions of one sequence
///
/// `Partitions` is a cheap `Copy` view. Every call to [`Partitions::iter`]
/// starts a fresh enumeration, so consumers can iterate independently and
/// as often as they like.
#[derive(Debug, Clone, Copy)]
pub struct Partitions<'a> {
    sequence: &'a str,
    chunks: usize,
    length: usize,
}

/// Creates the partitions of `sequence` into exactly `chunks` pieces
///
/// # Arguments
///
/// * `sequence` - The sequence to split (cut on character boundaries)
/// * `chunks` - The number of pieces, `1 <= chunks <= length(sequence)`
///
/// # Examples
///
/// ```
/// # use trimkit::heuristic::partitions;
/// # fn main() -> trimkit::Result<()> {
/// let all: Vec<_> = partitions("ABCD", 3)?.iter().collect();
/// assert_eq!(all.len(), 3);
/// # Ok(())
/// # }
/// ```
pub fn partitions(sequence: &str, chunks: usize) -> Result<Partitions<'_>> {
    let length = sequence.chars().count();
    if chunks == 0 || chunks > length {
        return Err(ArgumentError::InvalidChunkCount { chunks, length }.into());
    }
    Ok(Partitions {
        sequence,
        chunks,
        length,
    })
}

impl<'a> Partitions<'a> {
    /// The sequence being partitioned
    #[must_use]
    pub fn sequence(&self) -> &'a str {
        self.sequence
    }

    /// The number of pieces in every partition
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Number of partitions, `C(L - 1, chunks - 1)`
    ///
    /// Saturates at `usize::MAX` for very long sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        binomial(self.length - 1, self.chunks - 1)
    }

    /// Always false: a valid sequence has at least one partition
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Starts a new enumeration
    #[must_use]
    pub fn iter(&self) -> PartitionIter<'a> {
        PartitionIter {
            sequence: self.sequence,
            boundaries: char_boundaries(self.sequence),
            cuts: (1..self.chunks).collect(),
            done: false,
        }
    }

    /// Collects every partition into owned sets
    #[must_use]
    pub fn to_owned_sets(&self) -> Vec<BTreeSet<String>> {
        self.iter()
            .map(|set| set.into_iter().map(str::to_string).collect())
            .collect()
    }

    /// The partition whose pieces are as even as possible
    ///
    /// The first `L % chunks` pieces are one character longer than the rest.
    /// Any single partition keeps the pigeonhole guarantee, and the balanced
    /// one maximizes the length of its shortest piece.
    #[must_use]
    pub fn balanced(&self) -> BTreeSet<&'a str> {
        let boundaries = char_boundaries(self.sequence);
        let (short, longer) = (self.length / self.chunks, self.length % self.chunks);
        let mut set = BTreeSet::new();
        let mut start = 0;
        for idx in 0..self.chunks {
            let stop = start + short + usize::from(idx < longer);
            set.insert(&self.sequence[boundaries[start]..boundaries[stop]]);
            start = stop;
        }
        set
    }
}

/// Byte offset of every character boundary, including both ends
fn char_boundaries(sequence: &str) -> Vec<usize> {
    sequence
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(sequence.len()))
        .collect()
}

impl<'a> IntoIterator for &Partitions<'a> {
    type Item = BTreeSet<&'a str>;
    type IntoIter = PartitionIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for Partitions<'a> {
    type Item = BTreeSet<&'a str>;
    type IntoIter = PartitionIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the partitions of a sequence
///
/// Cut points are advanced like an odometer over strictly increasing
/// positions in `1..L`.
#[derive(Debug, Clone)]
pub struct PartitionIter<'a> {
    sequence: &'a str,
    boundaries: Vec<usize>,
    /// Character positions of the current cut points (strictly increasing)
    cuts: Vec<usize>,
    done: bool,
}

impl<'a> PartitionIter<'a> {
    fn current(&self) -> BTreeSet<&'a str> {
        let end = self.length();
        let mut set = BTreeSet::new();
        let mut start = 0;
        for &cut in self.cuts.iter().chain(std::iter::once(&end)) {
            set.insert(&self.sequence[self.boundaries[start]..self.boundaries[cut]]);
            start = cut;
        }
        set
    }

    fn length(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Moves to the next combination of cut points, returning false when exhausted
    fn advance(&mut self) -> bool {
        let n_cuts = self.cuts.len();
        let length = self.length();
        // the i-th cut may go at most to position length - n_cuts + i
        let Some(idx) = (0..n_cuts)
            .rev()
            .find(|&i| self.cuts[i] < length - n_cuts + i)
        else {
            return false;
        };
        self.cuts[idx] += 1;
        for j in idx + 1..n_cuts {
            self.cuts[j] = self.cuts[j - 1] + 1;
        }
        true
    }
}

impl<'a> Iterator for PartitionIter<'a> {
    type Item = BTreeSet<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let set = self.current();
        self.done = !self.advance();
        Some(set)
    }
}

/// Binomial coefficient, saturating on overflow
fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // exact at every step since acc holds C(n, i)
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    acc as usize
}
