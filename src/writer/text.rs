use std::{fmt, path::Path};

use super::SharedHandle;
use crate::error::Result;

/// Free-form text output written straight through to a retained handle
///
/// Supports `write!`/`writeln!` through its inherent `write_fmt`.
#[derive(Debug, Clone)]
pub struct TextWriter {
    handle: SharedHandle,
}
impl TextWriter {
    #[must_use]
    pub fn new(handle: SharedHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.handle.write_bytes(text.as_bytes())
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(text) => self.write_str(text),
            None => self.write_str(&args.to_string()),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.handle.flush()
    }
}
