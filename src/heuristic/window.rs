//! Read-position windows with mixed start/end-relative coordinates

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A position in a read, counted from one of its two ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Anchor {
    /// `n` characters after the start of the read
    FromStart(usize),
    /// `n` characters before the end of the read
    FromEnd(usize),
}
impl Anchor {
    /// Resolves the anchor against a read of `length` characters, clamped to `0..=length`
    #[must_use]
    pub fn resolve(self, length: usize) -> usize {
        match self {
            Self::FromStart(n) => n.min(length),
            Self::FromEnd(n) => length.saturating_sub(n),
        }
    }
}

/// The exclusive end of a [`SearchWindow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stop {
    Bounded(Anchor),
    /// Extends to the end of the read
    Unbounded,
}
impl Stop {
    #[must_use]
    pub fn resolve(self, length: usize) -> usize {
        match self {
            Self::Bounded(anchor) => anchor.resolve(length),
            Self::Unbounded => length,
        }
    }

    fn reaches_end(self) -> bool {
        matches!(self, Self::Unbounded | Self::Bounded(Anchor::FromEnd(0)))
    }
}

/// A half-open range of read positions
///
/// The window `(FromStart(0), Unbounded)` covers the entire read and
/// therefore contains every other window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SearchWindow {
    pub start: Anchor,
    pub stop: Stop,
}
impl SearchWindow {
    #[must_use]
    pub fn new(start: Anchor, stop: Stop) -> Self {
        Self { start, stop }
    }

    /// The entire read
    #[must_use]
    pub fn whole() -> Self {
        Self::new(Anchor::FromStart(0), Stop::Unbounded)
    }

    /// The last `n` characters of the read
    #[must_use]
    pub fn suffix(n: usize) -> Self {
        Self::new(Anchor::FromEnd(n), Stop::Unbounded)
    }

    /// The first `n` characters of the read
    #[must_use]
    pub fn prefix(n: usize) -> Self {
        Self::new(Anchor::FromStart(0), Stop::Bounded(Anchor::FromStart(n)))
    }

    #[must_use]
    pub fn is_whole(&self) -> bool {
        self.start == Anchor::FromStart(0) && self.stop.reaches_end()
    }

    /// The concrete byte range of this window in a read of `length` characters
    ///
    /// Empty (`start..start`) when the stop lies before the start.
    #[must_use]
    pub fn resolve(&self, length: usize) -> Range<usize> {
        let start = self.start.resolve(length);
        let stop = self.stop.resolve(length).max(start);
        start..stop
    }

    /// Whether this window covers `other` for every possible read length
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        starts_before(self.start, other.start) && stops_after(self.stop, other.stop)
    }
}

/// `a` resolves to a position `<=` that of `b` for all read lengths
fn starts_before(a: Anchor, b: Anchor) -> bool {
    match (a, b) {
        (Anchor::FromStart(0), _) => true,
        (Anchor::FromStart(x), Anchor::FromStart(y)) => x <= y,
        (Anchor::FromEnd(x), Anchor::FromEnd(y)) => x >= y,
        // short reads push the end anchor to zero, long reads push it past any start offset
        (Anchor::FromStart(_), Anchor::FromEnd(_)) | (Anchor::FromEnd(_), Anchor::FromStart(_)) => {
            false
        }
    }
}

/// `a` resolves to a position `>=` that of `b` for all read lengths
fn stops_after(a: Stop, b: Stop) -> bool {
    if a.reaches_end() {
        return true;
    }
    let Stop::Bounded(a) = a else {
        return true;
    };
    match (a, b) {
        (_, Stop::Unbounded) => false,
        (Anchor::FromStart(x), Stop::Bounded(Anchor::FromStart(y))) => x >= y,
        (Anchor::FromEnd(x), Stop::Bounded(Anchor::FromEnd(y))) => x <= y,
        // an end-relative stop can fall to zero on short reads
        (Anchor::FromEnd(_), Stop::Bounded(Anchor::FromStart(y))) => y == 0,
        (Anchor::FromStart(_), Stop::Bounded(Anchor::FromEnd(_))) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(SearchWindow::whole().resolve(10), 0..10);
        assert_eq!(SearchWindow::suffix(3).resolve(10), 7..10);
        assert_eq!(SearchWindow::suffix(30).resolve(10), 0..10);
        assert_eq!(SearchWindow::prefix(4).resolve(10), 0..4);
        assert_eq!(SearchWindow::prefix(40).resolve(10), 0..10);

        let inverted = SearchWindow::new(Anchor::FromStart(8), Stop::Bounded(Anchor::FromEnd(5)));
        assert_eq!(inverted.resolve(10), 8..8);
    }

    #[test]
    fn test_whole_read_contains_everything() {
        let whole = SearchWindow::whole();
        for other in [
            SearchWindow::suffix(19),
            SearchWindow::prefix(10),
            SearchWindow::new(Anchor::FromEnd(4), Stop::Bounded(Anchor::FromEnd(2))),
            SearchWindow::new(Anchor::FromStart(3), Stop::Bounded(Anchor::FromStart(9))),
        ] {
            assert!(whole.contains(&other));
            assert!(!other.contains(&whole));
        }
        let whole_by_end =
            SearchWindow::new(Anchor::FromStart(0), Stop::Bounded(Anchor::FromEnd(0)));
        assert!(whole_by_end.is_whole());
        assert!(whole_by_end.contains(&whole));
    }

    #[test]
    fn test_suffixes_nest() {
        assert!(SearchWindow::suffix(33).contains(&SearchWindow::suffix(19)));
        assert!(!SearchWindow::suffix(19).contains(&SearchWindow::suffix(33)));
    }

    #[test]
    fn test_prefixes_nest() {
        assert!(SearchWindow::prefix(20).contains(&SearchWindow::prefix(10)));
        assert!(!SearchWindow::prefix(10).contains(&SearchWindow::prefix(20)));
    }

    #[test]
    fn test_prefix_and_suffix_are_incomparable() {
        let prefix = SearchWindow::prefix(10);
        let suffix = SearchWindow::suffix(19);
        assert!(!prefix.contains(&suffix));
        assert!(!suffix.contains(&prefix));
    }

    #[test]
    fn test_overlapping_bounded_windows_are_incomparable() {
        let a = SearchWindow::new(Anchor::FromStart(2), Stop::Bounded(Anchor::FromStart(8)));
        let b = SearchWindow::new(Anchor::FromStart(5), Stop::Bounded(Anchor::FromStart(12)));
        assert!(!a.contains(&b));
        assert!(!b.contains(&a));
    }

    #[test]
    fn test_containment_is_reflexive() {
        let window = SearchWindow::new(Anchor::FromEnd(7), Stop::Bounded(Anchor::FromEnd(1)));
        assert!(window.contains(&window));
    }
}
