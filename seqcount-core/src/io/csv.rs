use crate::error::{SeqError, SeqResult};
use csv::{ReaderBuilder, StringRecord};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::str::FromStr;

/// Counts keyed by 1-based sample nucleotide position.
pub type PositionCounts = HashMap<i64, u64>;

/// Row-at-a-time access to a headed CSV table with columns looked up by name.
pub(crate) struct TableReader<R> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    record: StringRecord,
    source: String,
    row: usize,
}

impl<R: Read> TableReader<R> {
    pub(crate) fn new(reader: R, source: impl Into<String>) -> SeqResult<Self> {
        let source = source.into();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| SeqError::CsvParse {
                path: source.clone(),
                source: e,
            })?
            .clone();
        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            source,
            row: 0,
        })
    }

    pub(crate) fn column(&self, name: &str) -> SeqResult<usize> {
        self.optional_column(name)
            .ok_or_else(|| SeqError::CsvMissingColumn {
                name: name.to_string(),
                headers: self.headers.iter().map(|s| s.to_string()).collect(),
                path: self.source.clone(),
            })
    }

    pub(crate) fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Advance to the next data row. Returns `false` at end of input.
    pub(crate) fn advance(&mut self) -> SeqResult<bool> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .map_err(|e| SeqError::CsvParse {
                path: self.source.clone(),
                source: e,
            })?;
        if more {
            self.row += 1;
        }
        Ok(more)
    }

    pub(crate) fn text(&self, idx: usize, column: &str) -> SeqResult<&str> {
        self.record
            .get(idx)
            .ok_or_else(|| SeqError::CsvMissingField {
                row: self.row,
                column: column.to_string(),
                path: self.source.clone(),
            })
    }

    pub(crate) fn integer<T: FromStr>(&self, idx: usize, column: &str) -> SeqResult<T> {
        let value = self.text(idx, column)?.trim();
        value.parse().map_err(|_| SeqError::CsvInvalidInteger {
            row: self.row,
            column: column.to_string(),
            value: value.to_string(),
            path: self.source.clone(),
        })
    }

    /// Total length of the current row's fields, used for progress accounting.
    pub(crate) fn row_size(&self) -> u64 {
        self.record.iter().map(|f| f.len() as u64).sum()
    }
}

/// Soft-clip counts: `refname,pos,count`, summed per seed and position.
pub fn read_clipping<R: Read>(
    reader: R,
    source: &str,
) -> SeqResult<HashMap<String, PositionCounts>> {
    let mut table = TableReader::new(reader, source)?;
    let refname = table.column("refname")?;
    let pos = table.column("pos")?;
    let count = table.column("count")?;

    let mut out: HashMap<String, PositionCounts> = HashMap::new();
    while table.advance()? {
        let seed = table.text(refname, "refname")?.to_string();
        let position: i64 = table.integer(pos, "pos")?;
        let n: u64 = table.integer(count, "count")?;
        *out.entry(seed).or_default().entry(position).or_default() += n;
    }
    Ok(out)
}

/// Insertions relative to the sample consensus: `refname,qname,pos`.
/// Each distinct read name counts once per position.
pub fn read_conseq_insertions<R: Read>(
    reader: R,
    source: &str,
) -> SeqResult<HashMap<String, PositionCounts>> {
    let mut table = TableReader::new(reader, source)?;
    let refname = table.column("refname")?;
    let qname = table.column("qname")?;
    let pos = table.column("pos")?;

    let mut names: HashMap<String, HashMap<i64, HashSet<String>>> = HashMap::new();
    while table.advance()? {
        let seed = table.text(refname, "refname")?.to_string();
        let position: i64 = table.integer(pos, "pos")?;
        let name = table.text(qname, "qname")?.to_string();
        names
            .entry(seed)
            .or_default()
            .entry(position)
            .or_default()
            .insert(name);
    }
    Ok(names
        .into_iter()
        .map(|(seed, positions)| {
            let counts = positions
                .into_iter()
                .map(|(position, qnames)| (position, qnames.len() as u64))
                .collect();
            (seed, counts)
        })
        .collect())
}

/// Remap-stage consensus sequences: `region,sequence`.
pub fn read_remap_conseqs<R: Read>(reader: R, source: &str) -> SeqResult<HashMap<String, Vec<u8>>> {
    let mut table = TableReader::new(reader, source)?;
    let region = table.column("region")?;
    let sequence = table.column("sequence")?;

    let mut out = HashMap::new();
    while table.advance()? {
        let name = table.text(region, "region")?.to_string();
        let seq = table.text(sequence, "sequence")?.trim().as_bytes().to_vec();
        out.insert(name, seq);
    }
    Ok(out)
}

/// Seed to coordinate reference assignments: `seed,coordinate_region`, in
/// file order.
pub fn read_coordinate_regions<R: Read>(reader: R, source: &str) -> SeqResult<Vec<(String, String)>> {
    let mut table = TableReader::new(reader, source)?;
    let seed = table.column("seed")?;
    let region = table.column("coordinate_region")?;

    let mut out = Vec::new();
    while table.advance()? {
        out.push((
            table.text(seed, "seed")?.trim().to_string(),
            table.text(region, "coordinate_region")?.trim().to_string(),
        ));
    }
    Ok(out)
}
