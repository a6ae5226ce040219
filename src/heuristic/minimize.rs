//! Removal of k-mer searches whose window is covered by another search for the same k-mer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SearchWindow;

/// One exact-match obligation: look for `kmer` inside `window`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KmerSearch {
    pub kmer: String,
    pub window: SearchWindow,
}
impl KmerSearch {
    pub fn new(kmer: impl Into<String>, window: SearchWindow) -> Self {
        Self {
            kmer: kmer.into(),
            window,
        }
    }
}

/// Keeps, for every k-mer, only the windows not contained in another window of that k-mer
///
/// This computes the maximal elements of the containment order per k-mer:
/// windows that are incomparable (for example a bounded prefix and a suffix
/// anchored to the end) are all kept, and duplicates collapse to one entry.
/// The output is sorted by k-mer and window.
///
/// # Examples
///
/// ```
/// # use trimkit::heuristic::{minimize, KmerSearch, SearchWindow};
/// let searches = [
///     KmerSearch::new("ABC", SearchWindow::suffix(33)),
///     KmerSearch::new("ABC", SearchWindow::suffix(19)),
/// ];
/// assert_eq!(minimize(&searches), vec![KmerSearch::new("ABC", SearchWindow::suffix(33))]);
/// ```
#[must_use]
pub fn minimize(searches: &[KmerSearch]) -> Vec<KmerSearch> {
    let mut by_kmer: BTreeMap<&str, Vec<SearchWindow>> = BTreeMap::new();
    for search in searches {
        by_kmer
            .entry(search.kmer.as_str())
            .or_default()
            .push(search.window);
    }

    let mut minimized = Vec::new();
    for (kmer, mut windows) in by_kmer {
        windows.sort_unstable();
        windows.dedup();
        for window in maximal_windows(&windows) {
            minimized.push(KmerSearch::new(kmer, window));
        }
    }
    minimized
}

/// Maximal elements of a deduplicated window list
fn maximal_windows(windows: &[SearchWindow]) -> Vec<SearchWindow> {
    if let Some(whole) = windows.iter().find(|w| w.is_whole()) {
        return vec![*whole];
    }
    windows
        .iter()
        .enumerate()
        .filter(|&(i, window)| {
            !windows.iter().enumerate().any(|(j, other)| {
                // of two mutually containing windows only the first survives
                i != j && other.contains(window) && (!window.contains(other) || j < i)
            })
        })
        .map(|(_, window)| *window)
        .collect()
}
