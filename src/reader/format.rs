use std::{
    io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom},
    mem,
};

use byteorder::{ByteOrder, LittleEndian};

use super::InputSource;
use crate::opener::InputHandle;

/// The magic number at the start of a decompressed BAM stream (`BAM\x01`)
pub const BAM_MAGIC: u32 = 0x014D_4142;

/// Record formats that can be recognized from the first bytes of an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Fasta,
    Fastq,
    Bam,
}
impl FileFormat {
    /// Whether records of this format carry per-base qualities
    #[must_use]
    pub fn has_qualities(&self) -> bool {
        matches!(self, Self::Fastq | Self::Bam)
    }

    /// Classifies a stream from (at most) its first four bytes
    ///
    /// An empty stream counts as FASTQ. Returns `None` for unknown content.
    #[must_use]
    pub fn from_prefix(prefix: &[u8]) -> Option<Self> {
        match prefix.first() {
            None | Some(b'@') => Some(Self::Fastq),
            Some(b'>' | b'#') => Some(Self::Fasta),
            _ if prefix.len() >= 4 && LittleEndian::read_u32(prefix) == BAM_MAGIC => {
                Some(Self::Bam)
            }
            _ => None,
        }
    }
}

/// Detects the format of a seekable stream, rewinding to where it started
pub fn detect_format<R: Read + Seek>(reader: &mut R) -> io::Result<Option<FileFormat>> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match reader.read(&mut prefix[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    reader.seek(SeekFrom::Current(-(filled as i64)))?;
    Ok(FileFormat::from_prefix(&prefix[..filled]))
}

/// Detects the format of an input source without consuming any bytes
///
/// Decompressors may hand out fewer than four bytes per read. When the
/// buffered bytes are not decisive, the prefix is read to completion and put
/// back in front of the remaining stream.
pub fn peek_format(source: &mut InputSource) -> io::Result<Option<FileFormat>> {
    let buffer = source.fill_buf()?;
    if buffer.len() < 4 && FileFormat::from_prefix(buffer).is_none() {
        let mut prefix = Vec::with_capacity(4);
        source.by_ref().take(4).read_to_end(&mut prefix)?;
        let capacity = source.capacity();
        let empty: InputHandle = Box::new(io::empty());
        let rest = mem::replace(source, BufReader::new(empty));
        let rejoined: InputHandle = Box::new(Cursor::new(prefix).chain(rest));
        *source = BufReader::with_capacity(capacity, rejoined);
    }
    let buffer = source.fill_buf()?;
    let end = buffer.len().min(4);
    Ok(FileFormat::from_prefix(&buffer[..end]))
}
