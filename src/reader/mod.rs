//! # reader
//!
//! Opening of FASTA/FASTQ inputs as forward-only record streams.
//!
//! [`InputPaths`] validates the single-end, paired-end or interleaved layout,
//! [`InputFiles`] owns the opened handles and [`RecordStream`] yields
//! [`Reads`] until the inputs are exhausted.
//!
//! ```rust
//! use trimkit::{FileOpener, InputPaths, Reads};
//!
//! # fn main() -> trimkit::Result<()> {
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("reads.fastq");
//! # std::fs::write(&path, "@r1\nACGT\n+\nIIII\n")?;
//! let opener = FileOpener::default();
//! let mut inputs = InputPaths::new(Some(&path), None, false)?.open(&opener)?;
//! assert!(inputs.detect_format()?.has_qualities());
//!
//! for reads in inputs.open()? {
//!     let Reads::Single(record) = reads? else { unreachable!() };
//!     assert_eq!(record.sequence, b"ACGT");
//! }
//! # Ok(())
//! # }
//! ```

mod format;
mod input;
mod stream;

pub use format::{detect_format, peek_format, FileFormat, BAM_MAGIC};
pub use input::{open_inputs, InputFiles, InputPaths};
pub use stream::{FastxReader, InputSource, Reads, RecordStream};
