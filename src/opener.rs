//! Opening of input and output files
//!
//! Inputs are decompressed transparently. Outputs are compressed according
//! to their extension. Every open goes through [`open_raise_limit`], which
//! recovers once from running out of file descriptors.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read},
    path::Path,
};

use flate2::{write::GzEncoder, Compression};
use log::{debug, warn};

use crate::{
    error::{ArgumentError, Result},
    writer::OutputHandle,
};

/// Default compression level for compressed outputs
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Upper bound on the default number of compression threads
pub const MAX_DEFAULT_THREADS: usize = 4;

/// How far the soft descriptor limit is raised after running out
pub const LIMIT_INCREMENT: u64 = 8;

/// A decompressed input stream
pub type InputHandle = Box<dyn Read>;

/// Opens files with the configured compression settings
///
/// `threads` is the number of background compression threads used for
/// writing. `None` picks `min(cpus, 4)` and `Some(0)` compresses in the
/// calling thread. Reading never uses background threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOpener {
    compression_level: u32,
    threads: Option<usize>,
}
impl Default for FileOpener {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            threads: None,
        }
    }
}
impl FileOpener {
    /// Creates an opener, validating the compression level (0-9)
    pub fn new(compression_level: u32, threads: Option<usize>) -> Result<Self> {
        if compression_level > 9 {
            return Err(ArgumentError::InvalidCompressionLevel(compression_level).into());
        }
        Ok(Self {
            compression_level,
            threads,
        })
    }

    #[must_use]
    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }

    /// The number of compression threads used for writing
    #[must_use]
    pub fn threads_for_write(&self) -> usize {
        self.threads
            .unwrap_or_else(|| num_cpus::get().min(MAX_DEFAULT_THREADS))
    }

    /// Opens a possibly compressed file for reading
    ///
    /// The compression format (gzip, bzip2, xz, zstd or none) is detected
    /// from the leading bytes of the file.
    pub fn open_read(&self, path: impl AsRef<Path>) -> Result<InputHandle> {
        let path = path.as_ref();
        let file = open_raise_limit(|| File::open(path))?;
        let (handle, format) = niffler::get_reader(Box::new(BufReader::new(file)))?;
        debug!(
            "Opened {} for reading (compression: {format:?}, threads: 0)",
            path.display()
        );
        Ok(handle)
    }

    /// Opens a pair of mate files for reading
    ///
    /// Either both, only the first, or none of the paths may be given.
    pub fn open_pair<P: AsRef<Path>>(
        &self,
        path1: Option<P>,
        path2: Option<P>,
    ) -> Result<(Option<InputHandle>, Option<InputHandle>)> {
        match (path1, path2) {
            (None, Some(_)) => Err(ArgumentError::SecondPathOnly.into()),
            (path1, path2) => {
                let first = path1.map(|path| self.open_read(path)).transpose()?;
                let second = path2.map(|path| self.open_read(path)).transpose()?;
                Ok((first, second))
            }
        }
    }

    /// Opens a file for writing, compressing according to its extension
    ///
    /// `-` writes to standard output. `.gz` and `.zst` outputs are
    /// compressed at the configured level. Only zstd makes use of
    /// background threads.
    pub fn open_write(&self, path: impl AsRef<Path>) -> Result<OutputHandle> {
        let path = path.as_ref();
        if path.as_os_str() == "-" {
            debug!("Opened standard output for writing");
            return Ok(OutputHandle::Stdout(BufWriter::new(io::stdout())));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        if let Some(ext @ ("bz2" | "xz")) = extension.as_deref() {
            return Err(ArgumentError::UnsupportedCompression(ext.to_string()).into());
        }

        let threads = self.threads_for_write();
        let file = open_raise_limit(|| File::create(path)).map(BufWriter::new)?;
        let handle = match extension.as_deref() {
            Some("gz") => {
                if threads > 0 {
                    debug!("Gzip output is compressed inline, ignoring {threads} threads");
                }
                OutputHandle::Gzip(GzEncoder::new(
                    file,
                    Compression::new(self.compression_level),
                ))
            }
            Some("zst") => {
                let mut encoder = zstd::Encoder::new(file, self.compression_level as i32)?;
                if threads > 0 {
                    encoder.multithread(threads as u32)?;
                }
                OutputHandle::Zstd(encoder)
            }
            _ => OutputHandle::Plain(file),
        };
        debug!(
            "Opened {} for writing (level: {}, threads: {threads})",
            path.display(),
            self.compression_level
        );
        Ok(handle)
    }
}

/// Runs `open`, retrying once after raising the descriptor limit if it ran out
///
/// Only "too many open files" failures are retried. A second failure, or
/// any other error, is returned unchanged. Failing to raise the limit is
/// logged and the retry happens regardless.
pub fn open_raise_limit<T, F>(mut open: F) -> io::Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    match open() {
        Err(err) if is_descriptor_exhaustion(&err) => {
            debug!("Out of file descriptors, raising the limit by {LIMIT_INCREMENT}");
            if let Err(err) = raise_open_files_limit(LIMIT_INCREMENT) {
                warn!("Could not raise the open file limit: {err:#}");
            }
            open()
        }
        result => result,
    }
}

/// Whether an error means the process ran out of file descriptors
#[must_use]
pub fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EMFILE)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

/// Raises the soft `RLIMIT_NOFILE` limit by `increment`, bounded by the hard limit
#[cfg(unix)]
pub fn raise_open_files_limit(increment: u64) -> anyhow::Result<()> {
    use anyhow::Context;

    let (soft, hard) = rlimit::getrlimit(rlimit::Resource::NOFILE)?;
    let new_soft = soft.saturating_add(increment).min(hard);
    rlimit::setrlimit(rlimit::Resource::NOFILE, new_soft, hard).with_context(|| {
        format!("failed to raise file limit from {soft} to {new_soft} (hard: {hard})")
    })?;
    debug!("Raised open file limit from {soft} to {new_soft}");
    Ok(())
}

/// Descriptor limits are not configurable on this platform
#[cfg(not(unix))]
pub fn raise_open_files_limit(_increment: u64) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, io::Write};

    use super::*;
    use anyhow::Result;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[cfg(unix)]
    fn exhausted() -> io::Error {
        io::Error::from_raw_os_error(libc::EMFILE)
    }

    #[cfg(unix)]
    #[test]
    fn test_retry_after_exhaustion() -> Result<()> {
        init_logger();
        let attempts = Cell::new(0);
        let value = open_raise_limit(|| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(exhausted())
            } else {
                Ok(42)
            }
        })?;
        assert_eq!(value, 42);
        assert_eq!(attempts.get(), 2);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_second_exhaustion_propagates() {
        init_logger();
        let attempts = Cell::new(0);
        let result: io::Result<()> = open_raise_limit(|| {
            attempts.set(attempts.get() + 1);
            Err(exhausted())
        });
        let err = result.expect_err("both attempts fail");
        assert_eq!(err.raw_os_error(), Some(libc::EMFILE));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let attempts = Cell::new(0);
        let result: io::Result<()> = open_raise_limit(|| {
            attempts.set(attempts.get() + 1);
            Err(io::Error::from(io::ErrorKind::NotFound))
        });
        assert_eq!(result.map_err(|e| e.kind()), Err(io::ErrorKind::NotFound));
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let opener = FileOpener::default();
        assert_eq!(opener.compression_level(), 6);
        assert_eq!(opener.threads_for_write(), num_cpus::get().min(4));
        assert_eq!(FileOpener::new(1, Some(0))?.threads_for_write(), 0);
        assert!(matches!(
            FileOpener::new(10, None),
            Err(crate::Error::ArgumentError(ArgumentError::InvalidCompressionLevel(10)))
        ));
        Ok(())
    }

    fn round_trip(name: &str, opener: FileOpener) -> Result<()> {
        init_logger();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(name);
        let content = "@read1\nACGT\n+\nIIII\n".repeat(100);

        let mut handle = opener.open_write(&path)?;
        handle.write_all(content.as_bytes())?;
        handle.finish()?;

        let mut readback = String::new();
        opener.open_read(&path)?.read_to_string(&mut readback)?;
        assert_eq!(readback, content);
        Ok(())
    }

    #[test]
    fn test_plain_round_trip() -> Result<()> {
        round_trip("reads.fastq", FileOpener::default())
    }

    #[test]
    fn test_gzip_round_trip() -> Result<()> {
        round_trip("reads.fastq.gz", FileOpener::new(1, Some(0))?)
    }

    #[test]
    fn test_zstd_round_trip() -> Result<()> {
        round_trip("reads.fastq.zst", FileOpener::new(3, Some(0))?)?;
        round_trip("reads.fastq.zst", FileOpener::new(3, Some(2))?)
    }

    #[test]
    fn test_gzip_output_is_compressed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.gz");
        let mut handle = FileOpener::default().open_write(&path)?;
        handle.write_all(b"ACGT")?;
        handle.finish()?;
        let raw = std::fs::read(&path)?;
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        Ok(())
    }

    #[test]
    fn test_unsupported_output_compression() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["out.bz2", "out.xz"] {
            assert!(matches!(
                FileOpener::default().open_write(dir.path().join(name)),
                Err(crate::Error::ArgumentError(ArgumentError::UnsupportedCompression(_)))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_open_pair() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("r1.fastq");
        std::fs::write(&path, "@r\nA\n+\nI\n")?;
        let opener = FileOpener::default();

        let (first, second) = opener.open_pair(Some(&path), None)?;
        assert!(first.is_some() && second.is_none());
        let (first, second) = opener.open_pair(Some(&path), Some(&path))?;
        assert!(first.is_some() && second.is_some());
        let (first, second) = opener.open_pair::<&Path>(None, None)?;
        assert!(first.is_none() && second.is_none());
        assert!(matches!(
            opener.open_pair(None, Some(&path)),
            Err(crate::Error::ArgumentError(ArgumentError::SecondPathOnly))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_input() {
        let result = FileOpener::default().open_read("/nonexistent/reads.fastq");
        assert!(matches!(result, Err(crate::Error::IoError(_))));
    }
}
