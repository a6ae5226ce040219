use auto_impl::auto_impl;

/// A sequencing read that can be written to a FASTA or FASTQ output
#[auto_impl(&, Box)]
pub trait FastxRecord {
    /// The full header line without its leading `@` or `>`
    fn name(&self) -> &[u8];

    /// The nucleotide sequence
    fn sequence(&self) -> &[u8];

    /// Per-base quality scores, if the record carries them
    fn qualities(&self) -> Option<&[u8]>;

    /// The header up to the first whitespace
    fn id(&self) -> &[u8] {
        let name = self.name();
        let end = name
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(name.len());
        &name[..end]
    }
}

/// An owned read as produced by the input stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: Vec<u8>,
    pub sequence: Vec<u8>,
    pub qualities: Option<Vec<u8>>,
}
impl SequenceRecord {
    pub fn new(
        name: impl Into<Vec<u8>>,
        sequence: impl Into<Vec<u8>>,
        qualities: Option<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            qualities,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl FastxRecord for SequenceRecord {
    fn name(&self) -> &[u8] {
        &self.name
    }
    fn sequence(&self) -> &[u8] {
        &self.sequence
    }
    fn qualities(&self) -> Option<&[u8]> {
        self.qualities.as_deref()
    }
}

impl FastxRecord for seq_io::fastq::RefRecord<'_> {
    fn name(&self) -> &[u8] {
        seq_io::fastq::Record::head(self)
    }
    fn sequence(&self) -> &[u8] {
        seq_io::fastq::Record::seq(self)
    }
    fn qualities(&self) -> Option<&[u8]> {
        Some(seq_io::fastq::Record::qual(self))
    }
}

impl From<seq_io::fastq::OwnedRecord> for SequenceRecord {
    fn from(record: seq_io::fastq::OwnedRecord) -> Self {
        Self {
            name: record.head,
            sequence: record.seq,
            qualities: Some(record.qual),
        }
    }
}

impl From<seq_io::fasta::OwnedRecord> for SequenceRecord {
    fn from(record: seq_io::fasta::OwnedRecord) -> Self {
        Self {
            name: record.head,
            sequence: record.seq,
            qualities: None,
        }
    }
}

/// Whether two mate headers name the same fragment
///
/// Headers are compared up to the first whitespace. A trailing mate number
/// (`1`, `2` or `3`) on both identifiers is ignored, so `frag/1` matches
/// `frag/2`.
#[must_use]
pub fn names_match(first: &[u8], second: &[u8]) -> bool {
    let id = |name: &'_ [u8]| -> Vec<u8> {
        name.iter()
            .copied()
            .take_while(|c| !c.is_ascii_whitespace())
            .collect()
    };
    let (mut first, mut second) = (id(first), id(second));
    let is_mate_digit = |id: &[u8]| matches!(id.last(), Some(b'1' | b'2' | b'3'));
    if is_mate_digit(&first) && is_mate_digit(&second) {
        first.pop();
        second.pop();
    }
    first == second
}
