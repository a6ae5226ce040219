//! In-memory stand-ins for output files, drained by the process that owns the real handles
//!
//! A worker writes into proxies and periodically hands the drained chunks back
//! to the [`OutputFiles`](crate::OutputFiles) that issued them. Proxies cross
//! process boundaries through their configuration only: serializing a proxy
//! produces its [`ProxyConfig`] and deserializing rehydrates a fresh, empty
//! writer. Buffered bytes are never transported.

use std::fmt;

use auto_impl::auto_impl;
use log::debug;
use serde::{Deserialize, Serialize, Serializer};

use super::{RecordFormat, RecordSink, RecordWriter};
use crate::{
    error::{Result, TransportError},
    record::FastxRecord,
};

/// Writers whose accumulated bytes can be taken out
#[auto_impl(&mut, Box)]
pub trait Drain {
    /// Returns the bytes written since the previous drain, one chunk per
    /// underlying buffer, and empties the buffers
    fn drain(&mut self) -> Vec<Vec<u8>>;
}

/// Concatenates the drains of several proxies, in order
///
/// This is the batch layout expected by [`OutputFiles::ingest`](crate::OutputFiles::ingest)
/// when the proxies are passed in the order they were issued.
pub fn drain_all<'a, I, D>(proxies: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = &'a mut D>,
    D: Drain + ?Sized + 'a,
{
    proxies.into_iter().flat_map(Drain::drain).collect()
}

/// Transported state of a [`ProxyTextWriter`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProxyConfig;

/// Transported state of a [`ProxyRecordWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordProxyConfig {
    pub n_files: usize,
    pub format: RecordFormat,
}

/// Construction parameters of any proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyConfig {
    Text(TextProxyConfig),
    Record(RecordProxyConfig),
}
impl ProxyConfig {
    /// Builds a fresh, empty proxy with these parameters
    pub fn rehydrate(self) -> Result<ProxyWriter> {
        match self {
            Self::Text(config) => Ok(ProxyWriter::Text(config.into())),
            Self::Record(config) => Ok(ProxyWriter::Record(config.try_into()?)),
        }
    }

    /// Number of chunks a drain of this proxy yields
    #[must_use]
    pub fn n_chunks(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::Record(config) => config.n_files,
        }
    }
}

/// Buffers text output in memory
///
/// Like [`TextWriter`](super::TextWriter), it supports `write!`/`writeln!`.
#[derive(Default, Deserialize)]
#[serde(from = "TextProxyConfig")]
pub struct ProxyTextWriter {
    buffer: Vec<u8>,
}
impl ProxyTextWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(&self) -> TextProxyConfig {
        TextProxyConfig
    }

    /// Number of bytes written since the last drain
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.buffer.extend_from_slice(text.as_bytes());
        Ok(())
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        std::io::Write::write_fmt(&mut self.buffer, args)?;
        Ok(())
    }
}

impl Drain for ProxyTextWriter {
    fn drain(&mut self) -> Vec<Vec<u8>> {
        vec![std::mem::take(&mut self.buffer)]
    }
}

impl From<TextProxyConfig> for ProxyTextWriter {
    fn from(_: TextProxyConfig) -> Self {
        Self::new()
    }
}

impl Serialize for ProxyTextWriter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.config().serialize(serializer)
    }
}

impl fmt::Debug for ProxyTextWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyTextWriter")
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

/// Buffers FASTA/FASTQ records in memory, one buffer per output file
#[derive(Debug, Deserialize)]
#[serde(try_from = "RecordProxyConfig")]
pub struct ProxyRecordWriter {
    writer: RecordWriter<Vec<u8>>,
}
impl ProxyRecordWriter {
    /// Creates a proxy for `n_files` outputs written in `format`
    ///
    /// # Arguments
    ///
    /// * `n_files` - 1 for single-end or interleaved output, 2 for paired-end output
    /// * `format` - The format of the destination files
    pub fn new(n_files: usize, format: RecordFormat) -> Result<Self> {
        let writer = RecordWriter::new(vec![Vec::new(); n_files], format)?;
        Ok(Self { writer })
    }

    #[must_use]
    pub fn config(&self) -> RecordProxyConfig {
        RecordProxyConfig {
            n_files: self.writer.n_sinks(),
            format: self.writer.format(),
        }
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.writer.sinks().iter().map(Vec::len).sum()
    }

    pub fn write<R: FastxRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        self.writer.write(record)
    }

    pub fn write_pair<R1, R2>(&mut self, first: &R1, second: &R2) -> Result<()>
    where
        R1: FastxRecord + ?Sized,
        R2: FastxRecord + ?Sized,
    {
        self.writer.write_pair(first, second)
    }
}

impl Drain for ProxyRecordWriter {
    fn drain(&mut self) -> Vec<Vec<u8>> {
        self.writer
            .sinks_mut()
            .iter_mut()
            .map(std::mem::take)
            .collect()
    }
}

impl RecordSink for ProxyRecordWriter {
    fn write_record(&mut self, record: &dyn FastxRecord) -> Result<()> {
        self.write(record)
    }

    fn write_record_pair(
        &mut self,
        first: &dyn FastxRecord,
        second: &dyn FastxRecord,
    ) -> Result<()> {
        self.write_pair(first, second)
    }
}

impl TryFrom<RecordProxyConfig> for ProxyRecordWriter {
    type Error = TransportError;

    fn try_from(config: RecordProxyConfig) -> std::result::Result<Self, Self::Error> {
        let n_files = config.n_files;
        let valid = if config.format.interleaved {
            n_files == 1
        } else {
            matches!(n_files, 1 | 2)
        };
        if !valid {
            return Err(TransportError::InvalidFileCount(n_files));
        }
        Self::new(n_files, config.format).map_err(|_| TransportError::InvalidFileCount(n_files))
    }
}

impl Serialize for ProxyRecordWriter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.config().serialize(serializer)
    }
}

/// Either kind of proxy, as issued by a proxied [`OutputFiles`](crate::OutputFiles)
#[derive(Debug, Deserialize)]
#[serde(try_from = "ProxyConfig")]
pub enum ProxyWriter {
    Text(ProxyTextWriter),
    Record(ProxyRecordWriter),
}
impl ProxyWriter {
    /// Snapshot of the construction parameters
    #[must_use]
    pub fn config(&self) -> ProxyConfig {
        match self {
            Self::Text(proxy) => ProxyConfig::Text(proxy.config()),
            Self::Record(proxy) => ProxyConfig::Record(proxy.config()),
        }
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize {
        match self {
            Self::Text(proxy) => proxy.buffered_len(),
            Self::Record(proxy) => proxy.buffered_len(),
        }
    }

    /// Replaces this proxy by a fresh one built from a transported configuration
    ///
    /// The proxy must have been drained: any buffered bytes would be lost,
    /// which fails with [`TransportError::UndrainedBytes`].
    pub fn reset_to(&mut self, config: ProxyConfig) -> Result<()> {
        let buffered = self.buffered_len();
        if buffered > 0 {
            return Err(TransportError::UndrainedBytes(buffered).into());
        }
        *self = config.rehydrate()?;
        debug!("Proxy reset to {config:?}");
        Ok(())
    }
}

impl Drain for ProxyWriter {
    fn drain(&mut self) -> Vec<Vec<u8>> {
        match self {
            Self::Text(proxy) => proxy.drain(),
            Self::Record(proxy) => proxy.drain(),
        }
    }
}

impl TryFrom<ProxyConfig> for ProxyWriter {
    type Error = TransportError;

    fn try_from(config: ProxyConfig) -> std::result::Result<Self, Self::Error> {
        match config {
            ProxyConfig::Text(config) => Ok(Self::Text(config.into())),
            ProxyConfig::Record(config) => Ok(Self::Record(config.try_into()?)),
        }
    }
}

impl Serialize for ProxyWriter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.config().serialize(serializer)
    }
}

impl From<ProxyTextWriter> for ProxyWriter {
    fn from(proxy: ProxyTextWriter) -> Self {
        Self::Text(proxy)
    }
}

impl From<ProxyRecordWriter> for ProxyWriter {
    fn from(proxy: ProxyRecordWriter) -> Self {
        Self::Record(proxy)
    }
}
