//! Real output destinations and the shared handle direct writers write through

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use flate2::write::GzEncoder;
use parking_lot::Mutex;

use crate::error::{OutputError, Result};

/// An opened output destination, possibly compressing
pub enum OutputHandle {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Zstd(zstd::Encoder<'static, BufWriter<File>>),
    /// The process's standard output, which is flushed but never closed
    Stdout(BufWriter<io::Stdout>),
}
impl OutputHandle {
    #[must_use]
    pub fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout(_))
    }

    /// Writes any trailing compression frames and flushes the destination
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut inner) => inner.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
            Self::Zstd(encoder) => encoder.finish()?.flush(),
            Self::Stdout(mut inner) => inner.flush(),
        }
    }
}

impl Write for OutputHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(inner) => inner.write(buf),
            Self::Gzip(inner) => inner.write(buf),
            Self::Zstd(inner) => inner.write(buf),
            Self::Stdout(inner) => inner.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Plain(inner) => inner.write_all(buf),
            Self::Gzip(inner) => inner.write_all(buf),
            Self::Zstd(inner) => inner.write_all(buf),
            Self::Stdout(inner) => inner.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(inner) => inner.flush(),
            Self::Gzip(inner) => inner.flush(),
            Self::Zstd(inner) => inner.flush(),
            Self::Stdout(inner) => inner.flush(),
        }
    }
}

impl fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Plain(_) => "Plain",
            Self::Gzip(_) => "Gzip",
            Self::Zstd(_) => "Zstd",
            Self::Stdout(_) => "Stdout",
        };
        f.debug_tuple("OutputHandle").field(&kind).finish()
    }
}

/// An output handle retained by the sink and shared with direct writers
///
/// Cloning is cheap and every clone refers to the same destination. Once
/// [`SharedHandle::close`] ran, every write fails with [`OutputError::Closed`].
#[derive(Debug, Clone)]
pub struct SharedHandle {
    path: PathBuf,
    inner: Arc<Mutex<Option<OutputHandle>>>,
}
impl SharedHandle {
    pub fn new(path: impl Into<PathBuf>, handle: OutputHandle) -> Self {
        Self {
            path: path.into(),
            inner: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// The destination this handle was opened for
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }

    #[must_use]
    pub fn is_stdout(&self) -> bool {
        self.inner.lock().as_ref().is_some_and(OutputHandle::is_stdout)
    }

    /// Writes the whole buffer under a single lock
    pub fn write_bytes(&self, buf: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock();
        let handle = guard.as_mut().ok_or(OutputError::Closed)?;
        handle.write_all(buf)?;
        Ok(())
    }

    /// Flushes the destination, a no-op once closed
    pub fn flush(&self) -> Result<()> {
        if let Some(handle) = self.inner.lock().as_mut() {
            handle.flush()?;
        }
        Ok(())
    }

    /// Finishes and releases the destination
    ///
    /// Standard output is only flushed. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let Some(handle) = self.inner.lock().take() else {
            return Ok(());
        };
        handle.finish()?;
        Ok(())
    }
}

impl Write for SharedHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all(buf)?;
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self.inner.lock().as_mut() {
            Some(handle) => handle.write_all(buf),
            None => Err(io::Error::other(OutputError::Closed)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.lock().as_mut() {
            Some(handle) => handle.flush(),
            None => Ok(()),
        }
    }
}
