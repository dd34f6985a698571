//! Reference FASTA input.

use crate::error::{SeqError, SeqResult};
use crate::seq::record::SeqRecord;
use crate::seq::traits::SeqBytes;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::iter::{Enumerate, Peekable};
use std::marker::PhantomData;
use std::path::Path;

const MISSING_HEADER: &str = "expected header line starting with '>'";

/// Streaming FASTA parser yielding one record per header. Sequence lines are
/// concatenated with whitespace removed.
pub struct FastaRecords<R: BufRead, S> {
    lines: Peekable<Enumerate<Lines<R>>>,
    _marker: PhantomData<S>,
}

impl<R: BufRead, S: SeqBytes> FastaRecords<R, S> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines().enumerate().peekable(),
            _marker: PhantomData,
        }
    }

    fn next_record(&mut self) -> SeqResult<Option<SeqRecord<S>>> {
        let (line_no, header) = loop {
            let Some((idx, line)) = self.lines.next() else {
                return Ok(None);
            };
            let line = line?;
            if line.starts_with('>') {
                break (idx + 1, line);
            }
            if !line.trim().is_empty() {
                return Err(SeqError::FastaFormat {
                    msg: MISSING_HEADER,
                    line: idx + 1,
                });
            }
        };
        let (id, desc) = parse_header(&header, line_no)?;

        let mut seq = Vec::new();
        while let Some((_, line)) = self
            .lines
            .next_if(|(_, l)| !matches!(l, Ok(l) if l.starts_with('>')))
        {
            seq.extend(line?.bytes().filter(|b| !b.is_ascii_whitespace()));
        }
        Ok(Some(SeqRecord {
            id,
            desc,
            seq: S::from_bytes(seq)?,
        }))
    }
}

impl<R: BufRead, S: SeqBytes> Iterator for FastaRecords<R, S> {
    type Item = SeqResult<SeqRecord<S>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

pub fn read_fasta_records_from_reader<R: BufRead, S: SeqBytes>(
    reader: R,
) -> SeqResult<Vec<SeqRecord<S>>> {
    FastaRecords::new(reader).collect()
}

pub fn read_fasta_records_from_path<S: SeqBytes>(
    path: impl AsRef<Path>,
) -> SeqResult<Vec<SeqRecord<S>>> {
    read_fasta_records_from_reader(BufReader::new(File::open(path)?))
}

pub fn read_fasta_records_from_bytes<S: SeqBytes>(data: &[u8]) -> SeqResult<Vec<SeqRecord<S>>> {
    read_fasta_records_from_reader(data)
}

/// Split `>id description` at the first whitespace.
fn parse_header(line: &str, line_no: usize) -> SeqResult<(Box<str>, Option<Box<str>>)> {
    let header = line
        .strip_prefix('>')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SeqError::FastaFormat {
            msg: "empty header",
            line: line_no,
        })?;
    Ok(match header.split_once(char::is_whitespace) {
        Some((id, desc)) => {
            let desc = desc.trim();
            (id.into(), (!desc.is_empty()).then(|| desc.into()))
        }
        None => (header.into(), None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::RefSeq;

    #[test]
    fn parse_seed_and_coordinate_records() {
        let data = b">HIV1B-env seed\nACGT\nacgt\n>V3LOOP\nCTRPNNNTRK\n";
        let records = read_fasta_records_from_bytes::<RefSeq>(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "HIV1B-env");
        assert_eq!(records[0].desc(), Some("seed"));
        assert_eq!(records[0].seq().as_bytes(), b"ACGTACGT");
        assert_eq!(records[1].id(), "V3LOOP");
        assert_eq!(records[1].seq().as_bytes(), b"CTRPNNNTRK");
    }

    #[test]
    fn blank_lines_before_first_header_are_skipped() {
        let data = b"\n\n>seq1\r\nAC\r\n";
        let records = read_fasta_records_from_bytes::<RefSeq>(data).unwrap();
        assert_eq!(records[0].id(), "seq1");
        assert_eq!(records[0].seq().as_bytes(), b"AC");
    }

    #[test]
    fn empty_sequence_allowed() {
        let data = b">seq1\n>seq2\nA\n";
        let records = read_fasta_records_from_bytes::<RefSeq>(data).unwrap();
        assert_eq!(records[0].seq().as_bytes(), b"");
        assert_eq!(records[1].seq().as_bytes(), b"A");
    }

    #[test]
    fn invalid_format_before_header() {
        let err = read_fasta_records_from_bytes::<RefSeq>(b"ACGT\n>seq1\nAC\n").unwrap_err();
        match err {
            SeqError::FastaFormat { line: 1, .. } => {}
            other => panic!("expected fasta format error, got {other:?}"),
        }
    }

    #[test]
    fn streams_records_from_a_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b">R1\nACGT\n>R2\nAC#\n>R3\nGG\n").unwrap();
        let reader = BufReader::new(File::open(file.path()).unwrap());
        let mut records = FastaRecords::<_, RefSeq>::new(reader);

        let first = records.next().unwrap().unwrap();
        assert_eq!(first.id(), "R1");
        assert_eq!(first.seq().as_bytes(), b"ACGT");
        assert!(matches!(
            records.next(),
            Some(Err(SeqError::InvalidChar { ch: '#', .. }))
        ));
        let third = records.next().unwrap().unwrap();
        assert_eq!(third.id(), "R3");
        assert!(records.next().is_none());
    }

    #[test]
    fn invalid_sequence_char() {
        let err = read_fasta_records_from_bytes::<RefSeq>(b">seq1\nAC#\n").unwrap_err();
        assert!(matches!(err, SeqError::InvalidChar { ch: '#', .. }));
    }
}
