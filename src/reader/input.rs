use std::{
    io::BufReader,
    path::{Path, PathBuf},
};

use log::debug;

use super::{peek_format, FastxReader, FileFormat, InputSource, RecordStream};
use crate::{
    error::{ArgumentError, FormatError, Result},
    opener::{FileOpener, InputHandle},
};

/// Validated input paths for a single-end, paired-end or interleaved run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    paths: Vec<PathBuf>,
    interleaved: bool,
}
impl InputPaths {
    /// Creates the input paths
    ///
    /// # Arguments
    ///
    /// * `path1` - The first (or only) input
    /// * `path2` - The second mate input, only valid together with `path1`
    /// * `interleaved` - Whether `path1` holds both mates, alternating
    pub fn new<P: Into<PathBuf>>(
        path1: Option<P>,
        path2: Option<P>,
        interleaved: bool,
    ) -> Result<Self> {
        let paths = match (path1, path2) {
            (None, Some(_)) => return Err(ArgumentError::SecondPathOnly.into()),
            (None, None) => return Err(ArgumentError::MissingInput.into()),
            (Some(_), Some(_)) if interleaved => return Err(ArgumentError::InterleavedPair.into()),
            (Some(path1), None) => vec![path1.into()],
            (Some(path1), Some(path2)) => vec![path1.into(), path2.into()],
        };
        Ok(Self { paths, interleaved })
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn interleaved(&self) -> bool {
        self.interleaved
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.interleaved || self.paths.len() == 2
    }

    /// Opens every path for reading
    pub fn open(&self, opener: &FileOpener) -> Result<InputFiles> {
        let handles = self
            .paths
            .iter()
            .map(|path| opener.open_read(path))
            .collect::<Result<Vec<_>>>()?;
        InputFiles::new(handles, self.interleaved)
    }
}

/// One or two opened read inputs
///
/// The handles are owned until [`InputFiles::open`] moves them into a
/// [`RecordStream`] or [`InputFiles::close`] releases them.
pub struct InputFiles {
    sources: Option<Vec<InputSource>>,
    interleaved: bool,
    paired: bool,
}
impl InputFiles {
    pub fn new(handles: Vec<InputHandle>, interleaved: bool) -> Result<Self> {
        match (handles.len(), interleaved) {
            (0, _) => return Err(ArgumentError::MissingInput.into()),
            (2, true) => return Err(ArgumentError::InterleavedPair.into()),
            (1 | 2, _) => {}
            (n, _) => return Err(ArgumentError::InputArity(n).into()),
        }
        let paired = interleaved || handles.len() == 2;
        let sources = handles.into_iter().map(BufReader::new).collect();
        Ok(Self {
            sources: Some(sources),
            interleaved,
            paired,
        })
    }

    #[must_use]
    pub fn interleaved(&self) -> bool {
        self.interleaved
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.paired
    }

    /// Whether the handles were moved into a stream or released
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sources.is_none()
    }

    /// Detects the format of the first input without consuming it
    pub fn detect_format(&mut self) -> Result<FileFormat> {
        let first = self
            .sources
            .as_mut()
            .and_then(|sources| sources.first_mut())
            .ok_or(FormatError::NoInput)?;
        peek_format(first)?.ok_or_else(|| FormatError::Unrecognized.into())
    }

    /// Moves the handles into a forward-only record stream
    pub fn open(&mut self) -> Result<RecordStream> {
        let sources = self.sources.take().ok_or(FormatError::NoInput)?;
        let readers = sources
            .into_iter()
            .map(FastxReader::new)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Opened a record stream over {} input(s) (interleaved: {})",
            readers.len(),
            self.interleaved
        );
        Ok(RecordStream::new(readers, self.interleaved))
    }

    /// Releases all handles still owned, closing twice is a no-op
    pub fn close(&mut self) {
        self.sources = None;
    }
}

impl std::fmt::Debug for InputFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFiles")
            .field("open_handles", &self.sources.as_ref().map_or(0, Vec::len))
            .field("interleaved", &self.interleaved)
            .finish()
    }
}

/// Opens one or two paths through `opener`, the shortcut for [`InputPaths::open`]
pub fn open_inputs<P: AsRef<Path>>(
    opener: &FileOpener,
    path1: P,
    path2: Option<P>,
    interleaved: bool,
) -> Result<InputFiles> {
    let paths = InputPaths::new(
        Some(path1.as_ref().to_path_buf()),
        path2.map(|path| path.as_ref().to_path_buf()),
        interleaved,
    )?;
    paths.open(opener)
}
