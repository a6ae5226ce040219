//! Forward-only record streams over one or two decompressed inputs

use std::io::{self, BufRead, BufReader};

use seq_io::{fasta, fastq};

use super::{peek_format, FileFormat};
use crate::{
    error::{FormatError, Result},
    opener::InputHandle,
    record::{names_match, FastxRecord, SequenceRecord},
};

/// A buffered input ready for format detection
pub type InputSource = BufReader<InputHandle>;

/// Parses FASTA or FASTQ records from one input
pub enum FastxReader {
    Fastq(fastq::Reader<InputSource>),
    Fasta(fasta::Reader<InputSource>),
}
impl FastxReader {
    /// Detects the format of `source` and creates the matching parser
    ///
    /// Comment lines (`#`) in front of the first FASTA record are skipped.
    pub fn new(mut source: InputSource) -> Result<Self> {
        match peek_format(&mut source)? {
            Some(FileFormat::Fastq) => Ok(Self::Fastq(fastq::Reader::new(source))),
            Some(FileFormat::Fasta) => {
                skip_comments(&mut source)?;
                Ok(Self::Fasta(fasta::Reader::new(source)))
            }
            Some(format @ FileFormat::Bam) => Err(FormatError::UnsupportedInput(format).into()),
            None => Err(FormatError::Unrecognized.into()),
        }
    }

    #[must_use]
    pub fn format(&self) -> FileFormat {
        match self {
            Self::Fastq(_) => FileFormat::Fastq,
            Self::Fasta(_) => FileFormat::Fasta,
        }
    }

    /// The next record, or `None` at the end of the input
    pub fn next_record(&mut self) -> Option<Result<SequenceRecord>> {
        match self {
            Self::Fastq(reader) => reader.next().map(|record| {
                record
                    .map(|record| record.to_owned_record().into())
                    .map_err(Into::into)
            }),
            Self::Fasta(reader) => reader.next().map(|record| {
                record
                    .map(|record| record.to_owned_record().into())
                    .map_err(Into::into)
            }),
        }
    }
}

fn skip_comments<R: BufRead>(source: &mut R) -> io::Result<()> {
    let mut line = Vec::new();
    while source.fill_buf()?.first() == Some(&b'#') {
        line.clear();
        source.read_until(b'\n', &mut line)?;
    }
    Ok(())
}

/// One step of a record stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reads {
    Single(SequenceRecord),
    Pair(SequenceRecord, SequenceRecord),
}
impl Reads {
    #[must_use]
    pub fn is_paired(&self) -> bool {
        matches!(self, Self::Pair(..))
    }
}

/// Iterates single reads or read pairs
///
/// Paired streams read one record from each mate input, interleaved
/// streams read two consecutive records from a single input. Mates must
/// have matching names and the same number of records. The stream ends
/// after the first error.
pub struct RecordStream {
    readers: Vec<FastxReader>,
    interleaved: bool,
    finished: bool,
}
impl RecordStream {
    pub(crate) fn new(readers: Vec<FastxReader>, interleaved: bool) -> Self {
        Self {
            readers,
            interleaved,
            finished: false,
        }
    }

    /// Format of the first input
    #[must_use]
    pub fn format(&self) -> Option<FileFormat> {
        self.readers.first().map(FastxReader::format)
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.interleaved || self.readers.len() == 2
    }

    fn next_reads(&mut self) -> Option<Result<Reads>> {
        match self.readers.as_mut_slice() {
            [reader] if self.interleaved => {
                let first = match reader.next_record()? {
                    Ok(record) => record,
                    Err(err) => return Some(Err(err)),
                };
                Some(match reader.next_record() {
                    None => Err(FormatError::UnpairedRecords.into()),
                    Some(second) => second.and_then(|second| pair(first, second)),
                })
            }
            [reader] => reader.next_record().map(|record| record.map(Reads::Single)),
            [reader1, reader2] => match (reader1.next_record(), reader2.next_record()) {
                (None, None) => None,
                (Some(_), None) | (None, Some(_)) => Some(Err(FormatError::UnpairedRecords.into())),
                (Some(first), Some(second)) => {
                    Some(first.and_then(|first| second.and_then(|second| pair(first, second))))
                }
            },
            _ => None,
        }
    }
}

fn pair(first: SequenceRecord, second: SequenceRecord) -> Result<Reads> {
    if names_match(&first.name, &second.name) {
        Ok(Reads::Pair(first, second))
    } else {
        Err(FormatError::ImproperPair {
            first: String::from_utf8_lossy(first.id()).into_owned(),
            second: String::from_utf8_lossy(second.id()).into_owned(),
        }
        .into())
    }
}

impl Iterator for RecordStream {
    type Item = Result<Reads>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_reads();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn source(content: &'static [u8]) -> InputSource {
        BufReader::new(Box::new(content))
    }

    fn stream(inputs: &[&'static [u8]], interleaved: bool) -> Result<RecordStream> {
        let readers = inputs
            .iter()
            .map(|content| FastxReader::new(source(content)))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(RecordStream::new(readers, interleaved))
    }

    #[test]
    fn test_single_fastq() -> Result<()> {
        let stream = stream(&[b"@r1 c\nACGT\n+\nIIII\n@r2\nGG\n+\n##\n"], false)?;
        assert_eq!(stream.format(), Some(FileFormat::Fastq));
        assert!(!stream.is_paired());
        let reads = stream.collect::<crate::Result<Vec<_>>>()?;
        assert_eq!(
            reads,
            vec![
                Reads::Single(SequenceRecord::new("r1 c", "ACGT", Some(b"IIII".to_vec()))),
                Reads::Single(SequenceRecord::new("r2", "GG", Some(b"##".to_vec()))),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_fasta_with_comments() -> Result<()> {
        let mut stream = stream(&[b"# made by hand\n#\n>r1\nACGT\nTT\n>r2\nCC\n"], false)?;
        assert_eq!(stream.format(), Some(FileFormat::Fasta));
        let first = stream.next().transpose()?;
        assert_eq!(first, Some(Reads::Single(SequenceRecord::new("r1", "ACGTTT", None))));
        assert_eq!(stream.count(), 1);
        Ok(())
    }

    #[test]
    fn test_paired() -> Result<()> {
        let stream = stream(
            &[b"@f/1\nAC\n+\nII\n@g/1\nA\n+\nI\n", b"@f/2\nGT\n+\nII\n@g/2\nC\n+\nI\n"],
            false,
        )?;
        assert!(stream.is_paired());
        let reads = stream.collect::<crate::Result<Vec<_>>>()?;
        assert_eq!(reads.len(), 2);
        assert!(reads.iter().all(Reads::is_paired));
        Ok(())
    }

    #[test]
    fn test_interleaved() -> Result<()> {
        let stream = stream(&[b">f/1\nAC\n>f/2\nGT\n"], true)?;
        let reads = stream.collect::<crate::Result<Vec<_>>>()?;
        assert_eq!(
            reads,
            vec![Reads::Pair(
                SequenceRecord::new("f/1", "AC", None),
                SequenceRecord::new("f/2", "GT", None)
            )]
        );
        Ok(())
    }

    #[test]
    fn test_unequal_mate_counts() -> Result<()> {
        let mut paired = stream(&[b">a\nA\n>b\nC\n", b">a\nA\n"], false)?;
        assert!(paired.next().transpose()?.is_some());
        assert!(matches!(
            paired.next(),
            Some(Err(crate::Error::FormatError(FormatError::UnpairedRecords)))
        ));
        assert!(paired.next().is_none());

        let mut interleaved = stream(&[b">a/1\nA\n>a/2\nA\n>b/1\nC\n"], true)?;
        assert!(interleaved.next().transpose()?.is_some());
        assert!(matches!(
            interleaved.next(),
            Some(Err(crate::Error::FormatError(FormatError::UnpairedRecords)))
        ));
        Ok(())
    }

    #[test]
    fn test_improper_pair() -> Result<()> {
        let mut paired = stream(&[b">a/1 x\nA\n", b">b/2 x\nA\n"], false)?;
        match paired.next() {
            Some(Err(crate::Error::FormatError(FormatError::ImproperPair { first, second }))) => {
                assert_eq!(first, "a/1");
                assert_eq!(second, "b/2");
            }
            other => panic!("expected an improper pair, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_unsupported_and_unknown_input() {
        assert!(matches!(
            FastxReader::new(source(b"BAM\x01rest")),
            Err(crate::Error::FormatError(FormatError::UnsupportedInput(FileFormat::Bam)))
        ));
        assert!(matches!(
            FastxReader::new(source(b"ACGT\n")),
            Err(crate::Error::FormatError(FormatError::Unrecognized))
        ));
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let mut stream = stream(&[b""], false)?;
        assert_eq!(stream.format(), Some(FileFormat::Fastq));
        assert!(stream.next().is_none());
        Ok(())
    }
}
