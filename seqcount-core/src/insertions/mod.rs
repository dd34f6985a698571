//! Insertions relative to a coordinate reference, read from the group's
//! retained reads.

pub mod multiset;

pub use multiset::{DiskMultiset, MemoryMultiset, SequenceMultiset};

use crate::alphabets::dna::{is_unambiguous, GAP};
use crate::coordinate::ReportAmino;
use crate::error::SeqResult;
use crate::seq::codon::translate;
use std::collections::{BTreeSet, HashMap};

/// One translated variant found in an insertion run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertionRow {
    /// 1-based sample nucleotide position of the run's first base.
    pub left: i64,
    pub insert: Vec<u8>,
    pub count: u64,
    /// Coordinate reference position the run precedes.
    pub before: usize,
}

pub struct InsertionTracker {
    reads: Box<dyn SequenceMultiset>,
    /// Per region, insertion counts keyed by the position before the insert.
    pos_counts: HashMap<String, HashMap<usize, u64>>,
}

impl Default for InsertionTracker {
    fn default() -> Self {
        Self::new(Box::new(MemoryMultiset::new()))
    }
}

impl InsertionTracker {
    pub fn new(reads: Box<dyn SequenceMultiset>) -> Self {
        Self {
            reads,
            pos_counts: HashMap::new(),
        }
    }

    /// Forget the previous group's reads and insertion counts.
    pub fn start_group(&mut self) -> SeqResult<()> {
        self.pos_counts.clear();
        self.reads.clear()
    }

    /// Retain a read, padded with `offset` gaps into sample coordinates.
    pub fn add_read(&mut self, seq: &[u8], offset: usize, count: u64) -> SeqResult<()> {
        let mut padded = Vec::with_capacity(offset + seq.len());
        padded.resize(offset, GAP);
        padded.extend_from_slice(seq);
        self.reads.add(&padded, count)
    }

    /// Insertion count recorded against a coordinate position of `region`.
    pub fn insertion_count(&self, region: &str, position: usize) -> u64 {
        self.pos_counts
            .get(region)
            .and_then(|counts| counts.get(&position))
            .copied()
            .unwrap_or(0)
    }

    /// Tally the retained reads over each run of `inserts` and report the
    /// variants of runs that fall inside the reference.
    pub fn insertions(
        &mut self,
        region: &str,
        inserts: &BTreeSet<i64>,
        report_aminos: &[ReportAmino],
    ) -> SeqResult<Vec<InsertionRow>> {
        if inserts.is_empty() {
            return Ok(Vec::new());
        }
        let ranges = insert_ranges(inserts);

        let mut tallies: Vec<HashMap<Vec<u8>, u64>> = vec![HashMap::new(); ranges.len()];
        for entry in self.reads.iter()? {
            let (seq, count) = entry?;
            for (&(left, right), tally) in ranges.iter().zip(tallies.iter_mut()) {
                if let Some(aminos) = translate_insert(&seq, left, right) {
                    *tally.entry(aminos).or_default() += count;
                }
            }
        }

        let pos_counts = self.pos_counts.entry(region.to_string()).or_default();
        let mut rows = Vec::new();
        for ((left, right), tally) in ranges.into_iter().zip(tallies) {
            let before = report_aminos
                .iter()
                .find(|r| r.seed_amino.consensus_nuc_index == Some(right))
                .map(|r| r.position);
            let Some(before) = before.filter(|&b| b != 1) else {
                continue;
            };
            let mut variants: Vec<(Vec<u8>, u64)> = tally.into_iter().collect();
            variants.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            for (insert, count) in variants {
                *pos_counts.entry(before - 1).or_default() += count;
                rows.push(InsertionRow {
                    left: left + 1,
                    insert,
                    count,
                    before,
                });
            }
        }
        Ok(rows)
    }
}

/// Merge codon indexes into contiguous `[left, right)` runs.
fn insert_ranges(inserts: &BTreeSet<i64>) -> Vec<(i64, i64)> {
    let mut ranges: Vec<(i64, i64)> = Vec::new();
    for &insert in inserts {
        match ranges.last_mut() {
            Some((_, right)) if *right == insert => *right += 3,
            _ => ranges.push((insert, insert + 3)),
        }
    }
    ranges
}

/// Translate the run `[left, right)` of a read, if it is fully sequenced.
fn translate_insert(seq: &[u8], left: i64, right: i64) -> Option<Vec<u8>> {
    let left = usize::try_from(left).ok()?;
    let right = usize::try_from(right).ok()?.min(seq.len());
    let nucs = seq.get(left..right)?;
    if nucs.is_empty() || !nucs.iter().all(|&b| is_unambiguous(b)) {
        return None;
    }
    let aminos = translate(nucs);
    (!aminos.is_empty()).then_some(aminos)
}
