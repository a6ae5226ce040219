//! # trimkit
//!
//! Building blocks of a read-trimming pipeline: seed planning for fast
//! adapter pre-filtering, FASTA/FASTQ input streams over compressed files,
//! and an output sink that keeps byte-identical results whether records are
//! written directly or buffered by parallel workers.
//!
//! ## Crate Organization
//!
//! - [`heuristic`]: k-mer seed plans that decide whether an adapter alignment
//!   is worth attempting on a read
//! - [`reader`]: format detection and single-end, paired-end or interleaved
//!   record streams
//! - [`writer`]: direct and proxy writers for records and free-form text
//! - [`OutputFiles`]: the sink owning every real output handle
//! - [`FileOpener`]: compression-aware opening of inputs and outputs
//!
//! ## Example
//!
//! ```rust
//! use trimkit::{FileOpener, OutputFiles, SequenceRecord};
//!
//! # fn main() -> trimkit::Result<()> {
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("trimmed.fastq.gz");
//! let mut outputs = OutputFiles::new(FileOpener::default(), false, true);
//! let mut writer = outputs.open_record_writer(&[&path])?;
//! writer.write(&SequenceRecord::new("r1", "ACGT", Some(b"IIII".to_vec())))?;
//! outputs.close()?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod heuristic;
pub mod opener;
mod output;
pub mod reader;
mod record;
pub mod writer;

pub use error::{ArgumentError, Error, FormatError, OutputError, Result, TransportError};
pub use opener::{FileOpener, InputHandle};
pub use output::OutputFiles;
pub use reader::{FileFormat, InputFiles, InputPaths, Reads, RecordStream};
pub use record::{names_match, FastxRecord, SequenceRecord};
pub use writer::{
    drain_all, Drain, OutputHandle, ProxyConfig, ProxyRecordWriter, ProxyTextWriter, ProxyWriter,
    RecordFormat, RecordOutput, RecordSink, RecordWriter, SharedHandle, TextOutput,
};
