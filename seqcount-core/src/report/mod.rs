//! One pass over grouped aligned reads, producing every output table.

pub mod config;

pub use config::ReportConfig;


use crate::align::{GotohAligner, PairAligner};
use crate::consensus::seed_consensus;
use crate::coordinate::{CoordinateMapper, CoordinateMapping, MappingOutcome, ReportAmino};
use crate::counting::{FrameCounters, SeedAmino};
use crate::deletions::{align_deletions, load_reading_frames};
use crate::error::SeqResult;
use crate::insertions::{InsertionTracker, SequenceMultiset};
use crate::io::csv::PositionCounts;
use crate::io::ReadGroup;
use crate::progress::{ProgressReporter, ProgressSink};
use crate::projects::ProjectConfig;
use crate::writers::{
    AminoRow, ConsensusRow, CoverageSummary, FailureRow, InsertionRecord, NucRow, ReportSink,
};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// Which input stream a group came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    /// Regular aligned reads. The overlap region is mapped but held back.
    Main,
    /// G2P reads. The held-back overlap mapping is folded into their counts.
    G2p,
}

pub struct SequenceReport {
    projects: ProjectConfig,
    config: ReportConfig,
    aligner: Box<dyn PairAligner>,
    clipping: HashMap<String, PositionCounts>,
    conseq_insertions: HashMap<String, PositionCounts>,
    remap_conseqs: Option<HashMap<String, Vec<u8>>>,
    insertions: InsertionTracker,
    progress: Option<ProgressReporter>,
    coverage: Option<CoverageSummary>,
    counters: FrameCounters,
    overlap: Option<Vec<ReportAmino>>,
}

impl SequenceReport {
    pub fn new(projects: ProjectConfig, config: ReportConfig) -> SeqResult<Self> {
        config.validate()?;
        Ok(Self {
            projects,
            config,
            aligner: Box::new(GotohAligner::default()),
            clipping: HashMap::new(),
            conseq_insertions: HashMap::new(),
            remap_conseqs: None,
            insertions: InsertionTracker::default(),
            progress: None,
            coverage: None,
            counters: FrameCounters::new(),
            overlap: None,
        })
    }

    pub fn with_aligner(mut self, aligner: Box<dyn PairAligner>) -> Self {
        self.aligner = aligner;
        self
    }

    /// Soft-clip counts per seed and 1-based sample position.
    pub fn with_clipping(mut self, clipping: HashMap<String, PositionCounts>) -> Self {
        self.clipping = clipping;
        self
    }

    /// Insertions relative to the sample consensus, per seed and position.
    pub fn with_conseq_insertions(mut self, counts: HashMap<String, PositionCounts>) -> Self {
        self.conseq_insertions = counts;
        self
    }

    /// Remap consensus per seed. Enables deletion realignment.
    pub fn with_remap_conseqs(mut self, conseqs: HashMap<String, Vec<u8>>) -> Self {
        self.remap_conseqs = Some(conseqs);
        self
    }

    pub fn with_read_store(mut self, store: Box<dyn SequenceMultiset>) -> Self {
        self.insertions = InsertionTracker::new(store);
        self
    }

    /// Report progress through `total_bytes` of aligned reads.
    pub fn with_progress(mut self, sink: Box<dyn ProgressSink>, total_bytes: u64) -> Self {
        let mut reporter = ProgressReporter::new(sink, total_bytes);
        if let Some(interval) = self.config.progress_interval {
            reporter = reporter.with_interval(interval);
        }
        self.progress = Some(reporter);
        self
    }

    /// Process the main stream, then the optional G2P stream, then close the
    /// sink with the coverage summary.
    pub fn process_reads<I, J>(
        &mut self,
        aligned: I,
        g2p_aligned: Option<J>,
        sink: &mut dyn ReportSink,
    ) -> SeqResult<()>
    where
        I: IntoIterator<Item = SeqResult<ReadGroup>>,
        J: IntoIterator<Item = SeqResult<ReadGroup>>,
    {
        info!("extracting statistics from alignments");
        for group in aligned {
            self.process_group(group?, Stream::Main, sink)?;
        }
        if let Some(g2p_aligned) = g2p_aligned {
            if let Some(conseqs) = self.remap_conseqs.as_mut() {
                let g2p_ref = self.projects.reference(&self.config.g2p_seed)?;
                conseqs.insert(self.config.g2p_seed.clone(), g2p_ref.as_bytes().to_vec());
            }
            info!("extracting statistics from G2P alignments");
            for group in g2p_aligned {
                self.process_group(group?, Stream::G2p, sink)?;
            }
        }
        if let Some(progress) = self.progress.as_mut() {
            progress.finish();
        }
        sink.finish(self.coverage.as_ref())
    }

    /// Count one group and emit its rows.
    pub fn process_group(
        &mut self,
        mut group: ReadGroup,
        stream: Stream,
        sink: &mut dyn ReportSink,
    ) -> SeqResult<()> {
        if let Some(progress) = self.progress.as_mut() {
            progress.add(group.bytes);
        }
        debug!(
            "counting {} distinct reads for {} at q-cutoff {}",
            group.reads.len(),
            group.seed,
            group.qcut
        );

        self.realign_deletions(&mut group)?;

        self.counters.clear();
        self.insertions.start_group()?;
        for read in &group.reads {
            self.insertions.add_read(&read.seq, read.offset, read.count)?;
            self.counters.count_read(&read.seq, read.offset, read.count);
        }

        let coordinate_refs: Vec<(String, Vec<u8>)> = self
            .projects
            .coordinate_references(&group.seed)?
            .into_iter()
            .map(|(name, seq)| (name.to_string(), seq.as_bytes().to_vec()))
            .collect();

        if coordinate_refs.is_empty() {
            let seed_len = self.projects.reference(&group.seed)?.len();
            self.counters.pad_frame0(seed_len);
            for amino in self.counters.frame(0) {
                for row in self.nuc_rows(&group, &group.seed, amino, None) {
                    sink.nucleotide(&row)?;
                }
            }
        } else {
            let mapper =
                CoordinateMapper::new(self.aligner.as_ref(), self.config.gap_open, self.config.gap_extend);
            let mut mappings: BTreeMap<String, CoordinateMapping> = BTreeMap::new();
            let mut failures = Vec::new();
            for (region, coord_ref) in &coordinate_refs {
                let is_overlap = *region == self.config.overlap_region;
                let overlap = match stream {
                    Stream::G2p if is_overlap => self.overlap.as_deref(),
                    _ => None,
                };
                let outcome = mapper.map(&self.counters, coord_ref, overlap)?;
                let hold_back = is_overlap && stream == Stream::Main;
                match outcome {
                    MappingOutcome::Mapped(mapping) if hold_back => {
                        self.overlap = Some(mapping.report_aminos);
                    }
                    MappingOutcome::Mapped(mapping) => {
                        mappings.insert(region.clone(), mapping);
                    }
                    MappingOutcome::Failed { consensus } => {
                        warn!(
                            "{} at q-cutoff {} failed to align to {region}",
                            group.seed, group.qcut
                        );
                        if hold_back {
                            self.overlap = None;
                        }
                        failures.push(FailureRow {
                            seed: group.seed.clone(),
                            region: region.clone(),
                            qcut: group.qcut.clone(),
                            queryseq: consensus,
                            refseq: coord_ref.clone(),
                        });
                    }
                }
            }
            self.write_mapped(&group, &mut mappings, sink)?;
            for failure in &failures {
                sink.failure(failure)?;
            }
        }

        for cutoff in self.config.cutoffs() {
            let consensus = seed_consensus(
                self.counters.frame(0),
                cutoff,
                self.config.consensus_min_coverage,
            );
            if let Some((offset, sequence)) = consensus {
                sink.consensus(&ConsensusRow {
                    region: group.seed.clone(),
                    qcut: group.qcut.clone(),
                    cutoff,
                    offset,
                    sequence,
                })?;
            }
        }
        Ok(())
    }

    fn realign_deletions(&self, group: &mut ReadGroup) -> SeqResult<()> {
        let Some(conseqs) = &self.remap_conseqs else {
            return Ok(());
        };
        let Some(conseq) = conseqs.get(&group.seed) else {
            debug!("no remap consensus for {}, deletions left in place", group.seed);
            return Ok(());
        };
        let coordinate_refs = self.projects.coordinate_references(&group.seed)?;
        let refs: Vec<&[u8]> = coordinate_refs.iter().map(|(_, seq)| seq.as_bytes()).collect();
        let frames = load_reading_frames(
            self.aligner.as_ref(),
            conseq,
            &refs,
            self.config.gap_open,
            self.config.gap_extend,
        )?;
        for read in &mut group.reads {
            align_deletions(&mut read.seq, read.offset, &frames);
        }
        Ok(())
    }

    fn write_mapped(
        &mut self,
        group: &ReadGroup,
        mappings: &mut BTreeMap<String, CoordinateMapping>,
        sink: &mut dyn ReportSink,
    ) -> SeqResult<()> {
        for (region, mapping) in mappings.iter() {
            let rows =
                self.insertions
                    .insertions(region, &mapping.inserts, &mapping.report_aminos)?;
            for row in rows {
                sink.insertion(&InsertionRecord {
                    seed: group.seed.clone(),
                    region: region.clone(),
                    qcut: group.qcut.clone(),
                    left: row.left,
                    insert: row.insert,
                    count: row.count,
                    before: row.before,
                })?;
            }
        }

        for (region, mapping) in mappings.iter_mut() {
            for report_amino in &mut mapping.report_aminos {
                let rows = self.nuc_rows(group, region, &report_amino.seed_amino, Some(report_amino.position));
                report_amino.max_clip_count = rows.iter().map(|r| r.clip).max().unwrap_or(0);
                report_amino.insertion_count = rows.iter().map(|r| r.insertions).sum();
                for row in &rows {
                    sink.nucleotide(row)?;
                }
            }
        }

        for (region, mapping) in mappings.iter() {
            let mut amino_sum = 0u64;
            for report_amino in &mapping.report_aminos {
                let row = amino_row(group, region, report_amino);
                amino_sum += row.counts.iter().sum::<u64>();
                sink.amino(&row)?;
            }
            self.update_coverage(region, amino_sum, mapping.report_aminos.len());
        }
        Ok(())
    }

    fn update_coverage(&mut self, region: &str, amino_sum: u64, width: usize) {
        if width == 0 {
            return;
        }
        let avg = amino_sum as f64 / width as f64;
        if self.coverage.as_ref().map_or(true, |c| avg > c.avg_coverage) {
            self.coverage = Some(CoverageSummary {
                avg_coverage: avg,
                coverage_region: region.to_string(),
                region_width: width,
            });
        }
    }

    /// Nucleotide rows for one codon. `position` is the 1-based coordinate
    /// position, absent when reporting raw seed coordinates.
    fn nuc_rows(
        &self,
        group: &ReadGroup,
        region: &str,
        amino: &SeedAmino,
        position: Option<usize>,
    ) -> Vec<NucRow> {
        let clipping = self.clipping.get(&group.seed);
        let seed_insertions = self.conseq_insertions.get(&group.seed);
        let lookup = |counts: Option<&PositionCounts>, pos: i64| {
            counts.and_then(|c| c.get(&pos)).copied().unwrap_or(0)
        };

        amino
            .nucleotides
            .iter()
            .enumerate()
            .map(|(i, nuc)| {
                let query_nuc_pos = amino.consensus_nuc_index.map(|index| index + i as i64 + 1);
                let (clip, mut insertions) = match query_nuc_pos {
                    Some(pos) => (lookup(clipping, pos), lookup(seed_insertions, pos)),
                    None => (0, 0),
                };
                if let (2, Some(position)) = (i, position) {
                    insertions += self.insertions.insertion_count(region, position);
                }
                let counts = [
                    nuc.get(b'A'),
                    nuc.get(b'C'),
                    nuc.get(b'G'),
                    nuc.get(b'T'),
                    nuc.get(b'N'),
                ];
                NucRow {
                    seed: group.seed.clone(),
                    region: region.to_string(),
                    qcut: group.qcut.clone(),
                    query_nuc_pos,
                    refseq_nuc_pos: position.map(|p| i + 3 * p - 2),
                    counts,
                    deletions: nuc.deletions(),
                    insertions,
                    clip,
                    v3_overlap: nuc.v3_overlap,
                    coverage: nuc.coverage(),
                }
            })
            .collect()
    }
}

fn amino_row(group: &ReadGroup, region: &str, report_amino: &ReportAmino) -> AminoRow {
    let amino = &report_amino.seed_amino;
    AminoRow {
        seed: group.seed.clone(),
        region: region.to_string(),
        qcut: group.qcut.clone(),
        query_nuc_pos: amino.consensus_nuc_index.map(|index| index + 1),
        refseq_aa_pos: report_amino.position,
        counts: *amino.amino_counts(),
        low_quality: amino.low_quality,
        partial: amino.partial,
        deletions: amino.deletions,
        insertions: report_amino.insertion_count,
        clip: report_amino.max_clip_count,
        v3_overlap: amino.v3_overlap,
        coverage: amino.coverage(),
    }
}
