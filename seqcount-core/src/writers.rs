use crate::alphabets::protein::AMINO_ALPHABET;
use crate::consensus::MixtureCutoff;
use crate::error::SeqResult;
use std::fmt::Display;
use std::io::Write;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AminoRow {
    pub seed: String,
    pub region: String,
    pub qcut: String,
    /// 1-based sample position of the codon's first base.
    pub query_nuc_pos: Option<i64>,
    pub refseq_aa_pos: usize,
    /// Counts in `AMINO_ALPHABET` order.
    pub counts: [u64; 21],
    pub low_quality: u64,
    pub partial: u64,
    pub deletions: u64,
    pub insertions: u64,
    pub clip: u64,
    pub v3_overlap: u64,
    pub coverage: u64,
}

impl AminoRow {
    pub fn count(&self, amino: u8) -> u64 {
        AMINO_ALPHABET
            .iter()
            .position(|&a| a == amino)
            .map_or(0, |idx| self.counts[idx])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NucRow {
    pub seed: String,
    pub region: String,
    pub qcut: String,
    pub query_nuc_pos: Option<i64>,
    pub refseq_nuc_pos: Option<usize>,
    /// Counts of `A,C,G,T,N`.
    pub counts: [u64; 5],
    pub deletions: u64,
    pub insertions: u64,
    pub clip: u64,
    pub v3_overlap: u64,
    pub coverage: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsensusRow {
    pub region: String,
    pub qcut: String,
    pub cutoff: MixtureCutoff,
    pub offset: i64,
    pub sequence: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertionRecord {
    pub seed: String,
    pub region: String,
    pub qcut: String,
    pub left: i64,
    pub insert: Vec<u8>,
    pub count: u64,
    pub before: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRow {
    pub seed: String,
    pub region: String,
    pub qcut: String,
    pub queryseq: Vec<u8>,
    pub refseq: Vec<u8>,
}

/// Region with the highest mean amino count per position.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSummary {
    pub avg_coverage: f64,
    pub coverage_region: String,
    pub region_width: usize,
}

pub trait ReportSink {
    fn amino(&mut self, row: &AminoRow) -> SeqResult<()>;
    fn nucleotide(&mut self, row: &NucRow) -> SeqResult<()>;
    fn consensus(&mut self, row: &ConsensusRow) -> SeqResult<()>;
    fn insertion(&mut self, row: &InsertionRecord) -> SeqResult<()>;
    fn failure(&mut self, row: &FailureRow) -> SeqResult<()>;
    /// Called once after the last group.
    fn finish(&mut self, coverage: Option<&CoverageSummary>) -> SeqResult<()>;
}

/// Keeps every row in memory.
#[derive(Clone, Debug, Default)]
pub struct CollectedRows {
    pub amino: Vec<AminoRow>,
    pub nucleotide: Vec<NucRow>,
    pub consensus: Vec<ConsensusRow>,
    pub insertions: Vec<InsertionRecord>,
    pub failures: Vec<FailureRow>,
    pub coverage: Option<CoverageSummary>,
}

impl ReportSink for CollectedRows {
    fn amino(&mut self, row: &AminoRow) -> SeqResult<()> {
        self.amino.push(row.clone());
        Ok(())
    }

    fn nucleotide(&mut self, row: &NucRow) -> SeqResult<()> {
        self.nucleotide.push(row.clone());
        Ok(())
    }

    fn consensus(&mut self, row: &ConsensusRow) -> SeqResult<()> {
        self.consensus.push(row.clone());
        Ok(())
    }

    fn insertion(&mut self, row: &InsertionRecord) -> SeqResult<()> {
        self.insertions.push(row.clone());
        Ok(())
    }

    fn failure(&mut self, row: &FailureRow) -> SeqResult<()> {
        self.failures.push(row.clone());
        Ok(())
    }

    fn finish(&mut self, coverage: Option<&CoverageSummary>) -> SeqResult<()> {
        self.coverage = coverage.cloned();
        Ok(())
    }
}

type TableWriter = csv::Writer<Box<dyn Write>>;

/// Writes each configured table as headed CSV. Tables left unset are skipped.
#[derive(Default)]
pub struct CsvReportWriter {
    amino: Option<TableWriter>,
    nucleotide: Option<TableWriter>,
    consensus: Option<TableWriter>,
    insertions: Option<TableWriter>,
    failures: Option<TableWriter>,
    coverage: Option<TableWriter>,
}

fn table(out: Box<dyn Write>, header: &[&str]) -> SeqResult<TableWriter> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header)?;
    Ok(writer)
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Whole numbers keep one decimal place, e.g. `9.0`.
fn decimal(x: f64) -> String {
    if x.fract() == 0.0 && x.is_finite() {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

impl CsvReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amino(mut self, out: Box<dyn Write>) -> SeqResult<Self> {
        let mut header = vec![
            "seed",
            "region",
            "q-cutoff",
            "query.nuc.pos",
            "refseq.aa.pos",
        ];
        let letters: Vec<String> = AMINO_ALPHABET.iter().map(|&a| (a as char).to_string()).collect();
        header.extend(letters.iter().map(String::as_str));
        header.extend(["X", "partial", "del", "ins", "clip", "v3_overlap", "coverage"]);
        self.amino = Some(table(out, &header)?);
        Ok(self)
    }

    pub fn with_nucleotide(mut self, out: Box<dyn Write>) -> SeqResult<Self> {
        self.nucleotide = Some(table(
            out,
            &[
                "seed",
                "region",
                "q-cutoff",
                "query.nuc.pos",
                "refseq.nuc.pos",
                "A",
                "C",
                "G",
                "T",
                "N",
                "del",
                "ins",
                "clip",
                "v3_overlap",
                "coverage",
            ],
        )?);
        Ok(self)
    }

    pub fn with_consensus(mut self, out: Box<dyn Write>) -> SeqResult<Self> {
        self.consensus = Some(table(
            out,
            &[
                "region",
                "q-cutoff",
                "consensus-percent-cutoff",
                "offset",
                "sequence",
            ],
        )?);
        Ok(self)
    }

    pub fn with_insertions(mut self, out: Box<dyn Write>) -> SeqResult<Self> {
        self.insertions = Some(table(
            out,
            &["seed", "region", "qcut", "left", "insert", "count", "before"],
        )?);
        Ok(self)
    }

    pub fn with_failures(mut self, out: Box<dyn Write>) -> SeqResult<Self> {
        self.failures = Some(table(
            out,
            &["seed", "region", "qcut", "queryseq", "refseq"],
        )?);
        Ok(self)
    }

    pub fn with_coverage(mut self, out: Box<dyn Write>) -> SeqResult<Self> {
        self.coverage = Some(table(
            out,
            &["avg_coverage", "coverage_region", "region_width"],
        )?);
        Ok(self)
    }
}

impl ReportSink for CsvReportWriter {
    fn amino(&mut self, row: &AminoRow) -> SeqResult<()> {
        let Some(writer) = self.amino.as_mut() else {
            return Ok(());
        };
        let mut record = vec![
            row.seed.clone(),
            row.region.clone(),
            row.qcut.clone(),
            opt(row.query_nuc_pos),
            row.refseq_aa_pos.to_string(),
        ];
        record.extend(row.counts.iter().map(u64::to_string));
        record.extend(
            [
                row.low_quality,
                row.partial,
                row.deletions,
                row.insertions,
                row.clip,
                row.v3_overlap,
                row.coverage,
            ]
            .iter()
            .map(u64::to_string),
        );
        writer.write_record(&record)?;
        Ok(())
    }

    fn nucleotide(&mut self, row: &NucRow) -> SeqResult<()> {
        let Some(writer) = self.nucleotide.as_mut() else {
            return Ok(());
        };
        let mut record = vec![
            row.seed.clone(),
            row.region.clone(),
            row.qcut.clone(),
            opt(row.query_nuc_pos),
            opt(row.refseq_nuc_pos),
        ];
        record.extend(row.counts.iter().map(u64::to_string));
        record.extend(
            [
                row.deletions,
                row.insertions,
                row.clip,
                row.v3_overlap,
                row.coverage,
            ]
            .iter()
            .map(u64::to_string),
        );
        writer.write_record(&record)?;
        Ok(())
    }

    fn consensus(&mut self, row: &ConsensusRow) -> SeqResult<()> {
        if let Some(writer) = self.consensus.as_mut() {
            writer.write_record([
                row.region.clone(),
                row.qcut.clone(),
                row.cutoff.to_string(),
                row.offset.to_string(),
                text(&row.sequence),
            ])?;
        }
        Ok(())
    }

    fn insertion(&mut self, row: &InsertionRecord) -> SeqResult<()> {
        if let Some(writer) = self.insertions.as_mut() {
            writer.write_record([
                row.seed.clone(),
                row.region.clone(),
                row.qcut.clone(),
                row.left.to_string(),
                text(&row.insert),
                row.count.to_string(),
                row.before.to_string(),
            ])?;
        }
        Ok(())
    }

    fn failure(&mut self, row: &FailureRow) -> SeqResult<()> {
        if let Some(writer) = self.failures.as_mut() {
            writer.write_record([
                row.seed.clone(),
                row.region.clone(),
                row.qcut.clone(),
                text(&row.queryseq),
                text(&row.refseq),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self, coverage: Option<&CoverageSummary>) -> SeqResult<()> {
        if let (Some(writer), Some(summary)) = (self.coverage.as_mut(), coverage) {
            writer.write_record([
                decimal(summary.avg_coverage),
                summary.coverage_region.clone(),
                summary.region_width.to_string(),
            ])?;
        }
        for writer in [
            &mut self.amino,
            &mut self.nucleotide,
            &mut self.consensus,
            &mut self.insertions,
            &mut self.failures,
            &mut self.coverage,
        ]
        .into_iter()
        .flatten()
        {
            writer.flush()?;
        }
        Ok(())
    }
}
