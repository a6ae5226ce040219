use std::path::PathBuf;

use crate::reader::FileFormat;

/// Custom Result type for trimkit operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the trimkit library, encompassing all possible error cases
/// that can occur while planning seeds, reading inputs, or writing outputs.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Malformed construction parameters
    ArgumentError(#[from] ArgumentError),
    /// Errors related to the content of input streams
    FormatError(#[from] FormatError),
    /// Errors raised when proxy writers cross a process boundary
    TransportError(#[from] TransportError),
    /// Errors raised by the output sink and its writers
    OutputError(#[from] OutputError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// Errors from the FASTQ parser
    FastqError(#[from] seq_io::fastq::Error),
    /// Errors from the FASTA parser
    FastaError(#[from] seq_io::fasta::Error),
    /// Errors from compression detection on input handles
    NifflerError(#[from] niffler::Error),
}

/// Invalid arguments handed to a constructor or planner.
///
/// These are never retried.
#[derive(thiserror::Error, Debug)]
pub enum ArgumentError {
    /// A sequence cannot be cut into the requested number of pieces
    ///
    /// # Fields
    /// * `chunks` - The requested number of pieces
    /// * `length` - The number of characters in the sequence
    #[error("Cannot split a sequence of length {length} into {chunks} pieces")]
    InvalidChunkCount { chunks: usize, length: usize },

    /// The k-mer length is zero or longer than the adapter
    #[error("Invalid k-mer length {kmer_length} for an adapter of length {adapter_length}")]
    InvalidKmerLength {
        kmer_length: usize,
        adapter_length: usize,
    },

    /// The error rate is not a finite value in `[0, 1)`
    #[error("Invalid error rate: {0}")]
    InvalidErrorRate(f64),

    /// Compression levels range from 0 to 9
    #[error("Invalid compression level: {0} (expected 0-9)")]
    InvalidCompressionLevel(u32),

    /// Output compression format that cannot be written
    #[error("Writing {0} compressed output is not supported")]
    UnsupportedCompression(String),

    /// Only the second file of a pair was given
    #[error("When giving paths for paired-end files, only providing the second file is not supported")]
    SecondPathOnly,

    /// Interleaved mode stores both mates in one file
    #[error("Interleaved input expects a single file, but two were given")]
    InterleavedPair,

    /// No input path was given at all
    #[error("No input file was given")]
    MissingInput,

    /// More input handles than mates
    #[error("Expected one or two inputs, got {0}")]
    InputArity(usize),

    /// Record writers take one or two outputs
    #[error("Expected one or two outputs for a record writer, got {0}")]
    RecordWriterArity(usize),

    /// Interleaved record writers take exactly one output
    #[error("Interleaved output requires exactly one file, got {0}")]
    InterleavedArity(usize),
}

/// Errors that describe the content of an input stream
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The first bytes of the input match no known record format
    #[error("Input format not recognized (expected FASTA, FASTQ or BAM)")]
    Unrecognized,

    /// The format was recognized but cannot be parsed here
    #[error("Reading {0:?} input is not supported")]
    UnsupportedInput(FileFormat),

    /// A record without qualities was written to a FASTQ writer
    ///
    /// # Arguments
    /// * `String` - The name of the offending record
    #[error("Record {0} has no qualities, but the output format requires them")]
    MissingQualities(String),

    /// One mate file (or the interleaved stream) ended before the other
    #[error("Reads are improperly paired: there are more reads in one of the mate inputs")]
    UnpairedRecords,

    /// Mates whose names disagree
    #[error("Reads are improperly paired: {first} does not match {second}")]
    ImproperPair { first: String, second: String },

    /// The input handles were already consumed or closed
    #[error("Input files have already been opened or closed")]
    NoInput,
}

/// Violations of the proxy transport contract
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// A proxy slot was re-initialized while it still held bytes
    ///
    /// # Arguments
    /// * `usize` - The number of bytes that would have been lost
    #[error("Proxy writer rehydrated with {0} undrained bytes")]
    UndrainedBytes(usize),

    /// A transported record proxy configuration describes an impossible writer
    #[error("Invalid proxy configuration: {0} record files")]
    InvalidFileCount(usize),
}

/// Errors raised by the output sink and the writers it hands out
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// The same destination was requested twice
    #[error("Output path opened twice: {0}")]
    DuplicatePath(PathBuf),

    /// A write reached a handle after the sink closed it
    #[error("Output handle has already been closed")]
    Closed,

    /// A drained batch does not line up with the retained handles
    #[error("Drained {got} chunks, but {expected} output handles are open")]
    ChunkCountMismatch { expected: usize, got: usize },

    /// Single-end record written to a paired writer or the reverse
    #[error("Writer expects {expected} records per write, got {got}")]
    RecordArity { expected: usize, got: usize },
}
