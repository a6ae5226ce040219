//! FASTA/FASTQ record writing over one or two byte sinks

use std::io::Write;

use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ArgumentError, FormatError, OutputError, Result},
    record::FastxRecord,
};

/// Layout of a record output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordFormat {
    /// Write FASTQ (with qualities) instead of FASTA
    pub qualities: bool,
    /// Write both mates of a pair into a single output, alternating
    pub interleaved: bool,
}
impl RecordFormat {
    #[must_use]
    pub fn new(qualities: bool, interleaved: bool) -> Self {
        Self {
            qualities,
            interleaved,
        }
    }

    /// Number of sinks a writer with this format needs for `n_mates` mates
    #[must_use]
    pub fn n_files(&self, n_mates: usize) -> usize {
        if self.interleaved {
            1
        } else {
            n_mates
        }
    }
}

/// Anything that accepts single reads or read pairs
#[auto_impl(&mut, Box)]
pub trait RecordSink {
    fn write_record(&mut self, record: &dyn FastxRecord) -> Result<()>;
    fn write_record_pair(&mut self, first: &dyn FastxRecord, second: &dyn FastxRecord)
        -> Result<()>;
}

/// Writes records in FASTA or FASTQ format
///
/// A writer holds one sink for single-end or interleaved output and two
/// sinks for paired-end output. The sinks are any [`Write`] implementor, so
/// the same writer backs real files and in-memory proxy buffers.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    sinks: Vec<W>,
    format: RecordFormat,
}
impl<W: Write> RecordWriter<W> {
    /// Creates a record writer
    ///
    /// # Arguments
    ///
    /// * `sinks` - One sink, or two for paired non-interleaved output
    /// * `format` - Quality and interleaving options
    ///
    /// # Examples
    ///
    /// ```
    /// # use trimkit::{RecordFormat, RecordWriter, SequenceRecord};
    /// # fn main() -> trimkit::Result<()> {
    /// let sinks: Vec<Vec<u8>> = vec![Vec::new()];
    /// let mut writer = RecordWriter::new(sinks, RecordFormat::new(true, false))?;
    /// writer.write(&SequenceRecord::new("r1", "ACGT", Some(b"IIII".to_vec())))?;
    /// assert_eq!(writer.into_inner()[0], b"@r1\nACGT\n+\nIIII\n");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(sinks: Vec<W>, format: RecordFormat) -> Result<Self> {
        match (format.interleaved, sinks.len()) {
            (true, 1) | (false, 1 | 2) => Ok(Self { sinks, format }),
            (true, n) => Err(ArgumentError::InterleavedArity(n).into()),
            (false, n) => Err(ArgumentError::RecordWriterArity(n).into()),
        }
    }

    #[must_use]
    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Whether this writer expects pairs of records
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.format.interleaved || self.sinks.len() == 2
    }

    #[must_use]
    pub fn n_sinks(&self) -> usize {
        self.sinks.len()
    }

    /// Writes a single-end record
    pub fn write<R: FastxRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        if self.is_paired() {
            return Err(OutputError::RecordArity {
                expected: 2,
                got: 1,
            }
            .into());
        }
        write_record(&mut self.sinks[0], record, self.format.qualities)
    }

    /// Writes both mates of a pair, interleaved or to their own sinks
    pub fn write_pair<R1, R2>(&mut self, first: &R1, second: &R2) -> Result<()>
    where
        R1: FastxRecord + ?Sized,
        R2: FastxRecord + ?Sized,
    {
        let qualities = self.format.qualities;
        match self.sinks.as_mut_slice() {
            [sink] if self.format.interleaved => {
                write_record(sink, first, qualities)?;
                write_record(sink, second, qualities)
            }
            [sink1, sink2] => {
                write_record(sink1, first, qualities)?;
                write_record(sink2, second, qualities)
            }
            _ => Err(OutputError::RecordArity {
                expected: 1,
                got: 2,
            }
            .into()),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    /// The sinks, in mate order
    #[must_use]
    pub fn sinks(&self) -> &[W] {
        &self.sinks
    }

    /// Mutable access to the sinks, in mate order
    pub fn sinks_mut(&mut self) -> &mut [W] {
        &mut self.sinks
    }

    pub fn into_inner(self) -> Vec<W> {
        self.sinks
    }
}

impl<W: Write> RecordSink for RecordWriter<W> {
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

fn write_record<W, R>(sink: &mut W, record: &R, qualities: bool) -> Result<()>
where
    W: Write,
    R: FastxRecord + ?Sized,
{
    if qualities {
        let qual = record.qualities().ok_or_else(|| {
            FormatError::MissingQualities(String::from_utf8_lossy(record.name()).into_owned())
        })?;
        seq_io::fastq::write_to(sink, record.name(), record.sequence(), qual)?;
    } else {
        seq_io::fasta::write_to(sink, record.name(), record.sequence())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequenceRecord;

    fn sinks(n: usize) -> Vec<Vec<u8>> {
        vec![Vec::new(); n]
    }

    fn fastq(name: &str, seq: &str) -> SequenceRecord {
        SequenceRecord::new(name, seq, Some(vec![b'I'; seq.len()]))
    }

    #[test]
    fn test_single_fastq() -> Result<()> {
        let mut writer = RecordWriter::new(sinks(1), RecordFormat::new(true, false))?;
        writer.write(&fastq("r1", "ACGT"))?;
        writer.write(&fastq("r2 comment", "GG"))?;
        assert!(!writer.is_paired());
        assert_eq!(
            writer.into_inner(),
            vec![b"@r1\nACGT\n+\nIIII\n@r2 comment\nGG\n+\nII\n".to_vec()]
        );
        Ok(())
    }

    #[test]
    fn test_fasta_drops_qualities() -> Result<()> {
        let mut writer = RecordWriter::new(sinks(1), RecordFormat::new(false, false))?;
        writer.write(&fastq("r1", "ACGT"))?;
        writer.write(&SequenceRecord::new("r2", "TT", None))?;
        assert_eq!(writer.into_inner()[0], b">r1\nACGT\n>r2\nTT\n");
        Ok(())
    }

    #[test]
    fn test_missing_qualities() -> Result<()> {
        let mut writer = RecordWriter::new(sinks(1), RecordFormat::new(true, false))?;
        let result = writer.write(&SequenceRecord::new("r1", "ACGT", None));
        assert!(matches!(
            result,
            Err(crate::Error::FormatError(FormatError::MissingQualities(name))) if name == "r1"
        ));
        Ok(())
    }

    #[test]
    fn test_paired_and_interleaved() -> Result<()> {
        let (r1, r2) = (fastq("frag/1", "AC"), fastq("frag/2", "GT"));

        let mut paired = RecordWriter::new(sinks(2), RecordFormat::new(true, false))?;
        paired.write_pair(&r1, &r2)?;
        assert_eq!(
            paired.into_inner(),
            vec![b"@frag/1\nAC\n+\nII\n".to_vec(), b"@frag/2\nGT\n+\nII\n".to_vec()]
        );

        let mut interleaved = RecordWriter::new(sinks(1), RecordFormat::new(true, true))?;
        assert!(interleaved.is_paired());
        interleaved.write_pair(&r1, &r2)?;
        assert_eq!(
            interleaved.into_inner(),
            vec![b"@frag/1\nAC\n+\nII\n@frag/2\nGT\n+\nII\n".to_vec()]
        );
        Ok(())
    }

    #[test]
    fn test_arity_errors() -> Result<()> {
        let record = fastq("r", "A");
        let mut single = RecordWriter::new(sinks(1), RecordFormat::default())?;
        assert!(matches!(
            single.write_pair(&record, &record),
            Err(crate::Error::OutputError(OutputError::RecordArity { expected: 1, got: 2 }))
        ));
        let mut paired = RecordWriter::new(sinks(2), RecordFormat::default())?;
        assert!(matches!(
            paired.write(&record),
            Err(crate::Error::OutputError(OutputError::RecordArity { expected: 2, got: 1 }))
        ));

        assert!(RecordWriter::<Vec<u8>>::new(vec![], RecordFormat::default()).is_err());
        assert!(RecordWriter::new(vec![Vec::<u8>::new(); 3], RecordFormat::default()).is_err());
        assert!(matches!(
            RecordWriter::new(vec![Vec::<u8>::new(); 2], RecordFormat::new(true, true)),
            Err(crate::Error::ArgumentError(ArgumentError::InterleavedArity(2)))
        ));
        Ok(())
    }

    #[test]
    fn test_dyn_sink() -> Result<()> {
        let mut writer = RecordWriter::new(sinks(1), RecordFormat::new(false, false))?;
        {
            let mut sink: Box<dyn RecordSink + '_> = Box::new(&mut writer);
            sink.write_record(&SequenceRecord::new("r", "ACGT", None))?;
        }
        assert_eq!(writer.into_inner()[0], b">r\nACGT\n");
        Ok(())
    }
}
