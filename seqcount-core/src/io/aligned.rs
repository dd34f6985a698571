use crate::error::SeqResult;
use crate::io::csv::TableReader;
use std::io::Read;

/// One distinct read variant: nucleotides starting `offset` bases into the
/// seed's coordinates, seen `count` times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignedRead {
    pub offset: usize,
    pub count: u64,
    pub seq: Vec<u8>,
}

impl AlignedRead {
    pub fn new(offset: usize, count: u64, seq: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            count,
            seq: seq.into(),
        }
    }
}

/// All contiguous rows sharing `(refname, qcut)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadGroup {
    pub seed: String,
    pub qcut: String,
    pub reads: Vec<AlignedRead>,
    /// Summed field lengths of the group's rows.
    pub bytes: u64,
}

struct Columns {
    refname: usize,
    qcut: usize,
    count: usize,
    offset: usize,
    seq: usize,
}

/// Streaming iterator over read groups. Rows are never reordered; a key that
/// reappears after another key starts a new group.
pub struct AlignedReadGroups<R> {
    table: TableReader<R>,
    columns: Columns,
    pending: Option<ReadGroup>,
    done: bool,
}

impl<R: Read> AlignedReadGroups<R> {
    pub fn new(reader: R, source: &str) -> SeqResult<Self> {
        let table = TableReader::new(reader, source)?;
        let columns = Columns {
            refname: table.column("refname")?,
            qcut: table.column("qcut")?,
            count: table.column("count")?,
            offset: table.column("offset")?,
            seq: table.column("seq")?,
        };
        Ok(Self {
            table,
            columns,
            pending: None,
            done: false,
        })
    }

    fn read_row(&mut self) -> SeqResult<Option<ReadGroup>> {
        if !self.table.advance()? {
            return Ok(None);
        }
        let cols = &self.columns;
        let read = AlignedRead {
            offset: self.table.integer(cols.offset, "offset")?,
            count: self.table.integer(cols.count, "count")?,
            seq: self.table.text(cols.seq, "seq")?.as_bytes().to_vec(),
        };
        Ok(Some(ReadGroup {
            seed: self.table.text(cols.refname, "refname")?.to_string(),
            qcut: self.table.text(cols.qcut, "qcut")?.to_string(),
            reads: vec![read],
            bytes: self.table.row_size(),
        }))
    }

    fn next_group(&mut self) -> SeqResult<Option<ReadGroup>> {
        let mut group = match self.pending.take() {
            Some(group) => group,
            None => match self.read_row()? {
                Some(group) => group,
                None => return Ok(None),
            },
        };
        while let Some(row) = self.read_row()? {
            if row.seed == group.seed && row.qcut == group.qcut {
                group.bytes += row.bytes;
                group.reads.extend(row.reads);
            } else {
                self.pending = Some(row);
                break;
            }
        }
        Ok(Some(group))
    }
}

impl<R: Read> Iterator for AlignedReadGroups<R> {
    type Item = SeqResult<ReadGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_group();
        if !matches!(next, Ok(Some(_))) {
            self.done = true;
        }
        next.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeqError;

    const ALIGNED: &str = "\
refname,qcut,rank,count,offset,seq
R1,15,0,9,0,AAATTT
R1,15,1,1,3,TTT
R1,30,0,2,0,AAA
R2,15,0,5,6,GCT
";

    #[test]
    fn groups_contiguous_rows() {
        let groups: Vec<ReadGroup> = AlignedReadGroups::new(ALIGNED.as_bytes(), "aligned.csv")
            .unwrap()
            .collect::<SeqResult<_>>()
            .unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!((groups[0].seed.as_str(), groups[0].qcut.as_str()), ("R1", "15"));
        assert_eq!(
            groups[0].reads,
            vec![AlignedRead::new(0, 9, "AAATTT"), AlignedRead::new(3, 1, "TTT")]
        );
        assert_eq!((groups[1].seed.as_str(), groups[1].qcut.as_str()), ("R1", "30"));
        assert_eq!(groups[2].reads, vec![AlignedRead::new(6, 5, "GCT")]);
        assert_eq!(groups[0].bytes, 13 + 10);
    }

    #[test]
    fn rank_column_is_optional() {
        let data = "refname,qcut,count,offset,seq\nR1,15,3,0,ACG\n";
        let groups: Vec<ReadGroup> = AlignedReadGroups::new(data.as_bytes(), "aligned.csv")
            .unwrap()
            .collect::<SeqResult<_>>()
            .unwrap();
        assert_eq!(groups[0].reads[0].count, 3);
    }

    #[test]
    fn missing_seq_column_is_fatal() {
        let err = AlignedReadGroups::new("refname,qcut,count,offset\n".as_bytes(), "a.csv")
            .err()
            .unwrap();
        assert!(matches!(err, SeqError::CsvMissingColumn { .. }));
    }

    #[test]
    fn negative_offset_is_fatal_and_stops_iteration() {
        let data = "refname,qcut,count,offset,seq\nR1,15,3,-2,ACG\nR1,15,3,0,ACG\n";
        let mut groups = AlignedReadGroups::new(data.as_bytes(), "aligned.csv").unwrap();
        assert!(matches!(
            groups.next(),
            Some(Err(SeqError::CsvInvalidInteger { row: 1, .. }))
        ));
        assert!(groups.next().is_none());
    }
}
