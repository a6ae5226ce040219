//! The output sink: owner of every real output handle
//!
//! In serial runs the sink hands out writers that write straight through to
//! disk. In proxied runs it still opens every destination eagerly (so running
//! out of descriptors surfaces before any worker starts) but hands out
//! in-memory proxies. The orchestrator then moves the proxies into workers,
//! collects their drains in input-chunk order, and feeds them back through
//! [`OutputFiles::ingest`]. Only the sink ever writes to a real handle.

use std::path::{Path, PathBuf};

use log::debug;

use crate::{
    error::{ArgumentError, OutputError, Result},
    opener::FileOpener,
    writer::{
        ProxyConfig, ProxyRecordWriter, ProxyTextWriter, RecordFormat, RecordOutput,
        RecordWriter, SharedHandle, TextOutput, TextWriter,
    },
};

/// Output files of one run, keyed by destination path
#[derive(Debug)]
pub struct OutputFiles {
    opener: FileOpener,
    proxied: bool,
    qualities: bool,
    /// Retained real handles, in open order
    handles: Vec<SharedHandle>,
    /// Configuration of every proxy issued, in issue order
    proxies: Vec<ProxyConfig>,
}
impl OutputFiles {
    /// Creates an empty sink
    ///
    /// # Arguments
    ///
    /// * `opener` - Opens (and compresses) the destinations
    /// * `proxied` - Hand out proxies instead of direct writers
    /// * `qualities` - Write record outputs as FASTQ rather than FASTA
    #[must_use]
    pub fn new(opener: FileOpener, proxied: bool, qualities: bool) -> Self {
        Self {
            opener,
            proxied,
            qualities,
            handles: Vec::new(),
            proxies: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    #[must_use]
    pub fn qualities(&self) -> bool {
        self.qualities
    }

    /// Opens a free-form text output
    pub fn open_text(&mut self, path: impl AsRef<Path>) -> Result<TextOutput> {
        let path = path.as_ref();
        self.check_unused(&[path])?;
        let handle = self.open_handle(path)?;
        self.handles.push(handle.clone());
        if self.proxied {
            let proxy = ProxyTextWriter::new();
            self.issue(ProxyConfig::Text(proxy.config()));
            Ok(TextOutput::Proxy(proxy))
        } else {
            Ok(TextOutput::Direct(TextWriter::new(handle)))
        }
    }

    /// Opens a record output for one (single-end) or two (paired-end) files
    pub fn open_record_writer<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<RecordOutput> {
        if !matches!(paths.len(), 1 | 2) {
            return Err(ArgumentError::RecordWriterArity(paths.len()).into());
        }
        let paths: Vec<&Path> = paths.iter().map(AsRef::as_ref).collect();
        self.record_output(&paths, RecordFormat::new(self.qualities, false))
    }

    /// Opens a single record output holding both mates of every pair
    pub fn open_interleaved_writer(&mut self, path: impl AsRef<Path>) -> Result<RecordOutput> {
        self.record_output(&[path.as_ref()], RecordFormat::new(self.qualities, true))
    }

    fn record_output(&mut self, paths: &[&Path], format: RecordFormat) -> Result<RecordOutput> {
        self.check_unused(paths)?;
        // a pair is retained only once both mates are open
        let handles = paths
            .iter()
            .map(|path| self.open_handle(path))
            .collect::<Result<Vec<_>>>()?;
        let output = if self.proxied {
            let proxy = ProxyRecordWriter::new(handles.len(), format)?;
            self.issue(ProxyConfig::Record(proxy.config()));
            RecordOutput::Proxy(proxy)
        } else {
            RecordOutput::Direct(RecordWriter::new(handles.clone(), format)?)
        };
        self.handles.extend(handles);
        Ok(output)
    }

    /// Fails if any path is already open or listed twice
    fn check_unused(&self, paths: &[&Path]) -> Result<()> {
        for (idx, path) in paths.iter().enumerate() {
            let repeated = paths[..idx].contains(path);
            if repeated || self.handles.iter().any(|handle| handle.path() == *path) {
                return Err(OutputError::DuplicatePath(PathBuf::from(path)).into());
            }
        }
        Ok(())
    }

    fn open_handle(&self, path: &Path) -> Result<SharedHandle> {
        Ok(SharedHandle::new(path, self.opener.open_write(path)?))
    }

    fn issue(&mut self, config: ProxyConfig) {
        debug!("Issued proxy #{}: {config:?}", self.proxies.len());
        self.proxies.push(config);
    }

    /// The retained real handles, in open order
    #[must_use]
    pub fn binary_handles(&self) -> &[SharedHandle] {
        &self.handles
    }

    /// Every proxy ever issued, in issue order
    #[must_use]
    pub fn proxy_handles(&self) -> &[ProxyConfig] {
        &self.proxies
    }

    /// Flushes every retained handle, e.g. before spawning workers
    pub fn flush(&self) -> Result<()> {
        for handle in &self.handles {
            handle.flush()?;
        }
        Ok(())
    }

    /// Writes one drained batch to the real handles
    ///
    /// `chunks` is the concatenation of the drains of every issued proxy, in
    /// issue order (see [`drain_all`](crate::drain_all)). Batches must be
    /// ingested in the order of the input chunks they were produced from.
    pub fn ingest(&self, chunks: Vec<Vec<u8>>) -> Result<()> {
        if chunks.len() != self.handles.len() {
            return Err(OutputError::ChunkCountMismatch {
                expected: self.handles.len(),
                got: chunks.len(),
            }
            .into());
        }
        let mut n_bytes = 0;
        for (handle, chunk) in self.handles.iter().zip(chunks) {
            if !chunk.is_empty() {
                handle.write_bytes(&chunk)?;
                n_bytes += chunk.len();
            }
        }
        debug!(
            "Ingested {n_bytes} bytes into {} outputs",
            self.handles.len()
        );
        Ok(())
    }

    /// Finishes and releases every retained handle except standard output
    ///
    /// Direct writers fail with [`OutputError::Closed`] afterwards. Closing
    /// twice is a no-op. Every handle is closed even if an earlier one fails;
    /// the first failure is returned.
    pub fn close(&mut self) -> Result<()> {
        let mut first_error = None;
        for handle in &self.handles {
            if let Err(err) = handle.close() {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
