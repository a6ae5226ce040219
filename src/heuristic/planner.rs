//! Seed planning for adapters that overlap the 3' end of a read
//!
//! An adapter occurrence of length `ℓ` that tolerates `e` errors must contain
//! at least one of `e + 1` pieces of the adapter prefix without errors. The
//! planner groups overlap lengths by their tolerated error count and emits,
//! per group, the pieces of the shortest overlap in that group. Those pieces
//! can only occur inside the last `ℓ` characters of the read, where `ℓ` is the
//! longest overlap in the group.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use memchr::memmem;
use serde::{Deserialize, Serialize};

use super::{minimize, partitions, KmerSearch, Partitions, SearchWindow};
use crate::error::{ArgumentError, Result};

/// Overlaps up to this length are searched as exact k-mers
///
/// Short error-free overlaps are too likely to occur by chance, so each of
/// them gets its own narrow window instead of sharing a band.
pub const MIN_OVERLAP_KMER_LENGTH: usize = 5;

/// One planned search: any piece of any partition must occur inside `window`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTask {
    pub window: SearchWindow,
    pub partitions: Vec<BTreeSet<String>>,
}
impl SeedTask {
    /// The union of the pieces of every partition
    #[must_use]
    pub fn candidates(&self) -> BTreeSet<&str> {
        self.partitions
            .iter()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect()
    }
}

/// A planned task before its partitions are materialized
struct PlannedTask<'a> {
    window: SearchWindow,
    partitions: Partitions<'a>,
}

/// Builds the seed tasks for an adapter overlapping the end of a read
///
/// # Arguments
///
/// * `adapter` - The adapter sequence
/// * `kmer_length` - The shortest overlap that is searched for (`1..=len(adapter)`)
/// * `error_rate` - Tolerated errors per overlapping character, in `[0, 1)`
///
/// The returned tasks are not minimized; [`SeedPlan::back_overlap`] is the
/// minimized form consulted per read.
///
/// # Examples
///
/// ```
/// # use trimkit::heuristic::{build_seed_tasks, SearchWindow};
/// # fn main() -> trimkit::Result<()> {
/// let tasks = build_seed_tasks("ABCDEFGHIJ0123456789", 3, 0.1)?;
/// assert_eq!(tasks.len(), 5);
/// assert_eq!(tasks[0].window, SearchWindow::suffix(3));
/// # Ok(())
/// # }
/// ```
pub fn build_seed_tasks(
    adapter: &str,
    kmer_length: usize,
    error_rate: f64,
) -> Result<Vec<SeedTask>> {
    let tasks = plan(adapter, kmer_length, error_rate)?
        .into_iter()
        .map(|task| SeedTask {
            window: task.window,
            partitions: task.partitions.to_owned_sets(),
        })
        .collect();
    Ok(tasks)
}

fn plan(adapter: &str, kmer_length: usize, error_rate: f64) -> Result<Vec<PlannedTask<'_>>> {
    let length = adapter.chars().count();
    if kmer_length == 0 || kmer_length > length {
        return Err(ArgumentError::InvalidKmerLength {
            kmer_length,
            adapter_length: length,
        }
        .into());
    }
    validate_error_rate(error_rate)?;

    let mut tasks = Vec::new();
    let mut minimum_length = kmer_length;
    for (max_errors, longest) in error_bands(length, error_rate) {
        if minimum_length > longest {
            continue;
        }
        if max_errors == 0 {
            let exact_until = MIN_OVERLAP_KMER_LENGTH.min(longest + 1);
            for overlap in minimum_length..exact_until {
                tasks.push(PlannedTask {
                    window: SearchWindow::suffix(overlap),
                    partitions: partitions(prefix(adapter, overlap), 1)?,
                });
            }
            minimum_length = minimum_length.max(exact_until);
            if minimum_length > longest {
                continue;
            }
        }
        tasks.push(PlannedTask {
            window: SearchWindow::suffix(longest),
            partitions: partitions(prefix(adapter, minimum_length), max_errors + 1)?,
        });
        minimum_length = longest + 1;
    }
    Ok(tasks)
}

/// Splits overlap lengths `0..=length` into runs with equal tolerated errors
///
/// Returns `(max_errors, longest_overlap)` per run, in increasing order.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn error_bands(length: usize, error_rate: f64) -> Vec<(usize, usize)> {
    let tolerated = |overlap: usize| (overlap as f64 * error_rate) as usize;
    let mut bands = Vec::new();
    let mut max_errors = 0;
    for overlap in 0..=length {
        if tolerated(overlap) > max_errors {
            bands.push((max_errors, overlap - 1));
            max_errors += 1;
        }
    }
    bands.push((max_errors, length));
    bands
}

fn validate_error_rate(error_rate: f64) -> Result<()> {
    if (0.0..1.0).contains(&error_rate) {
        Ok(())
    } else {
        Err(ArgumentError::InvalidErrorRate(error_rate).into())
    }
}

/// The first `n` characters of `sequence`
fn prefix(sequence: &str, n: usize) -> &str {
    let end = sequence
        .char_indices()
        .nth(n)
        .map_or(sequence.len(), |(idx, _)| idx);
    &sequence[..end]
}

/// A window together with the k-mers that are searched for inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSet {
    pub window: SearchWindow,
    pub kmers: Vec<String>,
}
impl SearchSet {
    /// Whether any k-mer occurs inside the window resolved against `read`
    #[must_use]
    pub fn matches(&self, read: &[u8]) -> bool {
        let haystack = &read[self.window.resolve(read.len())];
        self.kmers
            .iter()
            .any(|kmer| memmem::find(haystack, kmer.as_bytes()).is_some())
    }
}

/// The minimized seed searches for one adapter
///
/// A plan is plain data and can be cloned into every worker. A read for which
/// [`SeedPlan::may_match`] returns `false` cannot contain the adapter within
/// the error budget, so the alignment can be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPlan {
    sets: Vec<SearchSet>,
}
impl SeedPlan {
    /// Plans the searches for partial adapter occurrences at the end of a read
    pub fn back_overlap(adapter: &str, kmer_length: usize, error_rate: f64) -> Result<Self> {
        let searches = flatten(&plan(adapter, kmer_length, error_rate)?);
        let plan = Self::from_searches(&searches);
        debug!(
            "Planned {} search sets ({} k-mers) for back overlaps of {adapter}",
            plan.sets.len(),
            plan.n_kmers()
        );
        Ok(plan)
    }

    /// Like [`SeedPlan::back_overlap`], plus a whole-read search for full-length occurrences
    pub fn back_adapter(adapter: &str, kmer_length: usize, error_rate: f64) -> Result<Self> {
        let mut searches = flatten(&plan(adapter, kmer_length, error_rate)?);
        let full_length = adapter.chars().count();
        #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
        let max_errors = (full_length as f64 * error_rate) as usize;
        let whole = partitions(adapter, max_errors + 1)?;
        searches.extend(
            whole
                .balanced()
                .into_iter()
                .map(|kmer| KmerSearch::new(kmer, SearchWindow::whole())),
        );
        let plan = Self::from_searches(&searches);
        debug!(
            "Planned {} search sets ({} k-mers) for adapter {adapter}",
            plan.sets.len(),
            plan.n_kmers()
        );
        Ok(plan)
    }

    fn from_searches(searches: &[KmerSearch]) -> Self {
        let mut by_window: BTreeMap<SearchWindow, Vec<String>> = BTreeMap::new();
        for search in minimize(searches) {
            by_window.entry(search.window).or_default().push(search.kmer);
        }
        let sets = by_window
            .into_iter()
            .map(|(window, kmers)| SearchSet { window, kmers })
            .collect();
        Self { sets }
    }

    /// The search sets, ordered by window
    #[must_use]
    pub fn sets(&self) -> &[SearchSet] {
        &self.sets
    }

    /// Total number of k-mer searches in the plan
    #[must_use]
    pub fn n_kmers(&self) -> usize {
        self.sets.iter().map(|set| set.kmers.len()).sum()
    }

    /// Whether the read could contain the adapter
    ///
    /// This is a necessary condition only. A `true` result licenses an
    /// alignment attempt, it never confirms a match.
    #[must_use]
    pub fn may_match(&self, read: &[u8]) -> bool {
        self.sets.iter().any(|set| set.matches(read))
    }
}

/// One search per piece of the balanced partition of every task
///
/// Searching the pieces of a single partition is enough: an occurrence with
/// at most `n - 1` errors leaves one of its `n` pieces intact. The union over
/// all partitions would include single characters and match nearly any read.
fn flatten(tasks: &[PlannedTask<'_>]) -> Vec<KmerSearch> {
    tasks
        .iter()
        .flat_map(|task| {
            task.partitions
                .balanced()
                .into_iter()
                .map(move |kmer| KmerSearch::new(kmer, task.window))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADAPTER: &str = "ABCDEFGHIJ0123456789";
    const ILLUMINA: &str = "AGATCGGAAGAGCACACGTCTGAACTCCAGTCAC";

    fn single(kmer: &str) -> Vec<BTreeSet<String>> {
        vec![BTreeSet::from([kmer.to_string()])]
    }

    #[test]
    fn test_error_bands() {
        assert_eq!(error_bands(20, 0.1), vec![(0, 9), (1, 19), (2, 20)]);
        assert_eq!(error_bands(8, 0.0), vec![(0, 8)]);
        assert_eq!(error_bands(10, 0.25), vec![(0, 3), (1, 7), (2, 10)]);
    }

    #[test]
    fn test_build_seed_tasks() -> Result<()> {
        let tasks = build_seed_tasks(ADAPTER, 3, 0.1)?;
        let expected = vec![
            SeedTask {
                window: SearchWindow::suffix(3),
                partitions: single("ABC"),
            },
            SeedTask {
                window: SearchWindow::suffix(4),
                partitions: single("ABCD"),
            },
            SeedTask {
                window: SearchWindow::suffix(9),
                partitions: single("ABCDE"),
            },
            SeedTask {
                window: SearchWindow::suffix(19),
                partitions: partitions("ABCDEFGHIJ", 2)?.to_owned_sets(),
            },
            SeedTask {
                window: SearchWindow::suffix(20),
                partitions: partitions(ADAPTER, 3)?.to_owned_sets(),
            },
        ];
        assert_eq!(tasks, expected);
        Ok(())
    }

    #[test]
    fn test_short_zero_error_band() -> Result<()> {
        // every overlap of a 4 character adapter is searched exactly
        let tasks = build_seed_tasks("ACGT", 2, 0.1)?;
        let windows: Vec<_> = tasks.iter().map(|task| task.window).collect();
        assert_eq!(
            windows,
            vec![
                SearchWindow::suffix(2),
                SearchWindow::suffix(3),
                SearchWindow::suffix(4)
            ]
        );
        assert_eq!(tasks[2].partitions, single("ACGT"));
        Ok(())
    }

    #[test]
    fn test_long_kmer_skips_exact_searches() -> Result<()> {
        let tasks = build_seed_tasks(ADAPTER, 12, 0.1)?;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].window, SearchWindow::suffix(19));
        assert_eq!(tasks[0].partitions, partitions(prefix(ADAPTER, 12), 2)?.to_owned_sets());
        Ok(())
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            build_seed_tasks(ADAPTER, 0, 0.1),
            Err(crate::Error::ArgumentError(ArgumentError::InvalidKmerLength { .. }))
        ));
        assert!(build_seed_tasks(ADAPTER, 21, 0.1).is_err());
        assert!(build_seed_tasks("", 1, 0.1).is_err());
        for rate in [-0.1, 1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                build_seed_tasks(ADAPTER, 3, rate),
                Err(crate::Error::ArgumentError(ArgumentError::InvalidErrorRate(_)))
            ));
        }
    }

    #[test]
    fn test_candidates_are_union_of_pieces() -> Result<()> {
        let tasks = build_seed_tasks(ADAPTER, 3, 0.1)?;
        let candidates = tasks[3].candidates();
        assert!(candidates.contains("A"));
        assert!(candidates.contains("ABCDEFGHI"));
        assert!(candidates.contains("J"));
        assert!(candidates.contains("BCDEFGHIJ"));
        assert!(!candidates.contains("ABCDEFGHIJ"));
        assert_eq!(candidates.len(), 18);
        Ok(())
    }

    #[test]
    fn test_plan_is_minimized() -> Result<()> {
        let plan = SeedPlan::back_overlap(ADAPTER, 3, 0.1)?;
        let mut seen = BTreeSet::new();
        for set in plan.sets() {
            for kmer in &set.kmers {
                // dominated duplicates were removed
                assert!(seen.insert(kmer.clone()), "{kmer} planned twice");
            }
        }
        // "ABCDE" is also searched in the wider window of the next band
        assert!(plan.sets().iter().all(|set| set.window != SearchWindow::suffix(9)));
        let widest = plan.sets().iter().find(|set| set.window == SearchWindow::suffix(20));
        assert_eq!(
            widest.map(|set| set.kmers.clone()),
            Some(vec!["456789".to_string(), "ABCDEFG".to_string(), "HIJ0123".to_string()])
        );
        Ok(())
    }

    #[test]
    fn test_back_overlap_hits_partial_adapter() -> Result<()> {
        let plan = SeedPlan::back_overlap(ILLUMINA, 3, 0.1)?;
        let read = b"NNNNNNNNNNNNNNNNNNNNNNNNNNNNNNAGATCGG";
        assert!(plan.may_match(read));
        // one mismatch in a ten character overlap
        let read = b"NNNNNNNNNNNNNNNNNNNNNNNNNNNNNNAGATCTGAAG";
        assert!(plan.may_match(read));
        assert!(!plan.may_match(&[b'N'; 60]));
        assert!(!plan.may_match(b""));
        Ok(())
    }

    #[test]
    fn test_adapter_free_reads_are_rejected() -> Result<()> {
        for plan in [
            SeedPlan::back_overlap(ILLUMINA, 3, 0.1)?,
            SeedPlan::back_adapter(ILLUMINA, 3, 0.1)?,
        ] {
            assert!(plan.sets().iter().flat_map(|set| &set.kmers).all(|kmer| kmer.len() >= 3));
            let mut read = vec![b'T'; 59];
            read.push(b'A');
            assert!(!plan.may_match(&read));
            assert!(!plan.may_match("TTGCA".repeat(12).as_bytes()));
            assert!(!plan.may_match("ACGT".repeat(15).as_bytes()));
        }
        Ok(())
    }

    #[test]
    fn test_back_overlap_ignores_internal_occurrence() -> Result<()> {
        let mut read = b"ABCDEFGHIJ".to_vec();
        read.extend_from_slice(&[b'Z'; 40]);
        let overlap = SeedPlan::back_overlap(ADAPTER, 3, 0.1)?;
        assert!(!overlap.may_match(&read));
        let adapter = SeedPlan::back_adapter(ADAPTER, 3, 0.1)?;
        assert!(adapter.may_match(&read));
        assert!(adapter.sets()[0].window.is_whole());
        Ok(())
    }

    #[test]
    fn test_plan_transport() -> Result<()> {
        let plan = SeedPlan::back_adapter(ILLUMINA, 3, 0.1)?;
        let json = serde_json::to_string(&plan).map_err(std::io::Error::other)?;
        let copy: SeedPlan = serde_json::from_str(&json).map_err(std::io::Error::other)?;
        assert_eq!(plan, copy);
        Ok(())
    }
}
