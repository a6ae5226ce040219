//! # heuristic
//!
//! Exact-match seeds that prune reads before error-tolerant adapter alignment.
//!
//! An adapter occurrence with at most `e` errors contains at least one of any
//! `e + 1` non-overlapping pieces of the adapter without errors. This module
//! turns that observation into a [`SeedPlan`]: a list of read windows, each
//! with the k-mers that must occur inside it for an alignment to be worth
//! attempting.
//!
//! ## Usage
//!
//! ```rust
//! use trimkit::heuristic::SeedPlan;
//!
//! let plan = SeedPlan::back_overlap("AGATCGGAAGAGCACACGTCTGAACTCCAGTCAC", 3, 0.1).unwrap();
//!
//! // A read ending in a partial adapter passes the filter
//! assert!(plan.may_match(b"TTGCATTGCATTGCATTGCATTGCAGATCGGAAG"));
//!
//! // A read without any adapter character in its tail is skipped
//! assert!(!plan.may_match(&[b'N'; 50]));
//! ```
//!
//! The building blocks are public as well: [`partitions`] enumerates the ways
//! to cut a sequence, [`SearchWindow`] models read positions counted from
//! either end, and [`minimize`] removes searches covered by wider windows.

mod minimize;
mod partition;
mod planner;
mod window;

pub use minimize::{minimize, KmerSearch};
pub use partition::{partitions, PartitionIter, Partitions};
pub use planner::{build_seed_tasks, SearchSet, SeedPlan, SeedTask, MIN_OVERLAP_KMER_LENGTH};
pub use window::{Anchor, SearchWindow, Stop};
