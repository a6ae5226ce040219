//! # writer
//!
//! Record and text writers handed out by [`OutputFiles`](crate::OutputFiles).
//!
//! Every writer comes in two flavors. Direct writers write through a
//! [`SharedHandle`] to the real destination. Proxy writers buffer in memory
//! and are drained by the orchestrator, which feeds the chunks back to the
//! sink in input order. [`TextOutput`] and [`RecordOutput`] wrap either flavor
//! so that pipeline code does not need to know which mode it runs in.

mod handle;
mod proxy;
mod record;
mod text;

use std::fmt;

pub use handle::{OutputHandle, SharedHandle};
pub use proxy::{
    drain_all, Drain, ProxyConfig, ProxyRecordWriter, ProxyTextWriter, ProxyWriter,
    RecordProxyConfig, TextProxyConfig,
};
pub use record::{RecordFormat, RecordSink, RecordWriter};
pub use text::TextWriter;

use crate::{
    error::{OutputError, Result},
    record::FastxRecord,
};

/// A record writer over the sink's retained handles
pub type DirectRecordWriter = RecordWriter<SharedHandle>;

/// A text output as returned by [`OutputFiles::open_text`](crate::OutputFiles::open_text)
#[derive(Debug)]
pub enum TextOutput {
    Direct(TextWriter),
    Proxy(ProxyTextWriter),
}
impl TextOutput {
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        match self {
            Self::Direct(writer) => writer.write_str(text),
            Self::Proxy(proxy) => proxy.write_str(text),
        }
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        match self {
            Self::Direct(writer) => writer.write_fmt(args),
            Self::Proxy(proxy) => proxy.write_fmt(args),
        }
    }

    /// Flushes a direct writer; proxies are flushed by draining
    pub fn flush(&mut self) -> Result<()> {
        match self {
            Self::Direct(writer) => writer.flush(),
            Self::Proxy(_) => Ok(()),
        }
    }

    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// The proxy, if this output is proxied
    #[must_use]
    pub fn into_proxy(self) -> Option<ProxyWriter> {
        match self {
            Self::Direct(_) => None,
            Self::Proxy(proxy) => Some(proxy.into()),
        }
    }
}

impl Drain for TextOutput {
    /// Direct writers hold no buffered chunks
    fn drain(&mut self) -> Vec<Vec<u8>> {
        match self {
            Self::Direct(_) => Vec::new(),
            Self::Proxy(proxy) => proxy.drain(),
        }
    }
}

/// A record output as returned by [`OutputFiles::open_record_writer`](crate::OutputFiles::open_record_writer)
#[derive(Debug)]
pub enum RecordOutput {
    Direct(DirectRecordWriter),
    Proxy(ProxyRecordWriter),
}
impl RecordOutput {
    #[must_use]
    pub fn format(&self) -> RecordFormat {
        match self {
            Self::Direct(writer) => writer.format(),
            Self::Proxy(proxy) => proxy.config().format,
        }
    }

    pub fn write<R: FastxRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        match self {
            Self::Direct(writer) => {
                ensure_open(writer)?;
                writer.write(record)
            }
            Self::Proxy(proxy) => proxy.write(record),
        }
    }

    pub fn write_pair<R1, R2>(&mut self, first: &R1, second: &R2) -> Result<()>
    where
        R1: FastxRecord + ?Sized,
        R2: FastxRecord + ?Sized,
    {
        match self {
            Self::Direct(writer) => {
                ensure_open(writer)?;
                writer.write_pair(first, second)
            }
            Self::Proxy(proxy) => proxy.write_pair(first, second),
        }
    }

    /// Flushes a direct writer; proxies are flushed by draining
    pub fn flush(&mut self) -> Result<()> {
        match self {
            Self::Direct(writer) => writer.flush(),
            Self::Proxy(_) => Ok(()),
        }
    }

    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// The proxy, if this output is proxied
    #[must_use]
    pub fn into_proxy(self) -> Option<ProxyWriter> {
        match self {
            Self::Direct(_) => None,
            Self::Proxy(proxy) => Some(proxy.into()),
        }
    }
}

fn ensure_open(writer: &DirectRecordWriter) -> Result<()> {
    if writer.sinks().iter().any(SharedHandle::is_closed) {
        return Err(OutputError::Closed.into());
    }
    Ok(())
}

impl RecordSink for RecordOutput {
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

impl Drain for RecordOutput {
    /// Direct writers hold no buffered chunks
    fn drain(&mut self) -> Vec<Vec<u8>> {
        match self {
            Self::Direct(_) => Vec::new(),
            Self::Proxy(proxy) => proxy.drain(),
        }
    }
}
