//! Reading frame selection and mapping of sample codons onto a coordinate
//! reference.

use crate::align::{PairAligner, PairAlignment, ALIGN_GAP};
use crate::alphabets::dna::GAP;
use crate::consensus::amino_consensus;
use crate::counting::{FrameCounters, SeedAmino};
use crate::error::SeqResult;
use log::debug;
use std::collections::BTreeSet;

const FRAMES: [usize; 3] = [0, 1, 2];

/// Codon counts reported at a 1-based coordinate reference position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportAmino {
    pub seed_amino: SeedAmino,
    pub position: usize,
    pub insertion_count: u64,
    pub max_clip_count: u64,
}

impl ReportAmino {
    pub fn new(seed_amino: SeedAmino, position: usize) -> Self {
        Self {
            seed_amino,
            position,
            insertion_count: 0,
            max_clip_count: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateMapping {
    pub reading_frame: usize,
    /// Amino consensus of the chosen frame.
    pub consensus: Vec<u8>,
    /// One entry per coordinate reference position.
    pub report_aminos: Vec<ReportAmino>,
    /// Codon nucleotide indexes of the chosen frame with no reference
    /// position, strictly inside the mapped span.
    pub inserts: BTreeSet<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MappingOutcome {
    Mapped(CoordinateMapping),
    /// No frame reached the minimum score. Carries the frame 0 consensus.
    Failed { consensus: Vec<u8> },
}

struct FrameAlignment {
    frame: usize,
    consensus: Vec<u8>,
    alignment: PairAlignment,
}

pub struct CoordinateMapper<'a, A: PairAligner + ?Sized> {
    aligner: &'a A,
    gap_open: f32,
    gap_extend: f32,
}

impl<'a, A: PairAligner + ?Sized> CoordinateMapper<'a, A> {
    pub fn new(aligner: &'a A, gap_open: f32, gap_extend: f32) -> Self {
        Self {
            aligner,
            gap_open,
            gap_extend,
        }
    }

    /// Align each frame's consensus to `coordinate_ref` and map the best one.
    ///
    /// When `overlap` holds an earlier mapping of the same reference, each
    /// reported position also gains that mapping's base counts as overlap.
    pub fn map(
        &self,
        counters: &FrameCounters,
        coordinate_ref: &[u8],
        overlap: Option<&[ReportAmino]>,
    ) -> SeqResult<MappingOutcome> {
        let covered = counters
            .frame(0)
            .iter()
            .filter(|amino| amino.has_amino_counts())
            .count();
        let mut max_score = covered.min(coordinate_ref.len()) as f32;

        let alignments: SeqResult<Vec<FrameAlignment>> =
            par_try_map!(FRAMES[..], |&frame| -> SeqResult<FrameAlignment> {
            let consensus = amino_consensus(counters.frame(frame));
            // Uncovered codons are unknown residues to the aligner.
            let query: Vec<u8> = consensus
                .iter()
                .map(|&aa| if aa == GAP { b'X' } else { aa })
                .collect();
            let alignment = self.aligner.align(
                coordinate_ref,
                &query,
                self.gap_open,
                self.gap_extend,
                true,
            )?;
            Ok(FrameAlignment {
                frame,
                consensus,
                alignment,
            })
        });

        let mut best: Option<FrameAlignment> = None;
        let mut frame0_consensus = Vec::new();
        for candidate in alignments? {
            if candidate.frame == 0 {
                frame0_consensus = candidate.consensus.clone();
            }
            debug!(
                "frame {} scored {} against floor {}",
                candidate.frame, candidate.alignment.score, max_score
            );
            if candidate.alignment.score < max_score {
                continue;
            }
            max_score = candidate.alignment.score;
            best = Some(candidate);
        }

        let Some(best) = best else {
            return Ok(MappingOutcome::Failed {
                consensus: frame0_consensus,
            });
        };
        let coord_to_conseq = index_map(&best.alignment, coordinate_ref.len());
        Ok(MappingOutcome::Mapped(build_mapping(
            best.frame,
            best.consensus,
            counters.frame(best.frame),
            &coord_to_conseq,
            overlap,
        )))
    }
}

/// For each reference position, the consensus index aligned to it.
pub fn index_map(alignment: &PairAlignment, ref_len: usize) -> Vec<Option<usize>> {
    let mut map = vec![None; ref_len];
    let mut ref_index = 0usize;
    let mut conseq_index = 0usize;
    for (&r, &q) in alignment
        .aligned_reference
        .iter()
        .zip(&alignment.aligned_query)
    {
        let ref_residue = r != ALIGN_GAP;
        let conseq_residue = q != ALIGN_GAP;
        if ref_residue && conseq_residue && ref_index < ref_len {
            map[ref_index] = Some(conseq_index);
        }
        if ref_residue {
            ref_index += 1;
        }
        if conseq_residue {
            conseq_index += 1;
        }
    }
    map
}

fn build_mapping(
    reading_frame: usize,
    consensus: Vec<u8>,
    frame_aminos: &[SeedAmino],
    coord_to_conseq: &[Option<usize>],
    overlap: Option<&[ReportAmino]>,
) -> CoordinateMapping {
    let mut inserts: BTreeSet<i64> = (0..consensus.len() as i64)
        .map(|i| 3 * i - reading_frame as i64)
        .collect();
    let mut report_aminos = Vec::with_capacity(coord_to_conseq.len());
    let mut prev_conseq_index: Option<usize> = None;
    let mut last_nuc_index: Option<i64> = None;

    for (coord_index, &conseq_index) in coord_to_conseq.iter().enumerate() {
        let mut seed_amino = match conseq_index {
            None => match prev_conseq_index {
                Some(prev) if prev + 1 < frame_aminos.len() => {
                    let deletions = frame_aminos[prev]
                        .coverage()
                        .min(frame_aminos[prev + 1].coverage());
                    SeedAmino::synthetic(deletions)
                }
                _ => SeedAmino::new(None),
            },
            Some(index) => {
                let seed_amino = frame_aminos[index].clone();
                if prev_conseq_index.is_none() {
                    if let Some(first) = seed_amino.consensus_nuc_index {
                        inserts = inserts.split_off(&first);
                    }
                }
                prev_conseq_index = Some(index);
                seed_amino
            }
        };
        if let Some(other) = overlap.and_then(|o| o.get(coord_index)) {
            seed_amino.count_overlap(&other.seed_amino);
        }
        if let Some(nuc_index) = seed_amino.consensus_nuc_index {
            inserts.remove(&nuc_index);
            last_nuc_index = Some(nuc_index);
        }
        report_aminos.push(ReportAmino::new(seed_amino, coord_index + 1));
    }

    match last_nuc_index {
        None => inserts.clear(),
        Some(last) => {
            inserts.split_off(&(last + 1));
        }
    }

    CoordinateMapping {
        reading_frame,
        consensus,
        report_aminos,
        inserts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::GotohAligner;
    use proptest::prelude::*;

    fn counters(reads: &[(&[u8], usize, u64)]) -> FrameCounters {
        let mut counters = FrameCounters::new();
        for &(seq, offset, count) in reads {
            counters.count_read(seq, offset, count);
        }
        counters
    }

    fn mapped(outcome: MappingOutcome) -> CoordinateMapping {
        match outcome {
            MappingOutcome::Mapped(mapping) => mapping,
            MappingOutcome::Failed { consensus } => {
                panic!("alignment failed for {}", String::from_utf8_lossy(&consensus))
            }
        }
    }

    #[test]
    fn maps_in_frame_reads() {
        let aligner = GotohAligner::default();
        let mapper = CoordinateMapper::new(&aligner, 40.0, 10.0);
        let counters = counters(&[(b"AAATTTGCT", 0, 9)]);
        let mapping = mapped(mapper.map(&counters, b"KFA", None).unwrap());
        assert_eq!(mapping.reading_frame, 0);
        assert_eq!(mapping.consensus, b"KFA");
        let positions: Vec<(usize, Option<i64>)> = mapping
            .report_aminos
            .iter()
            .map(|r| (r.position, r.seed_amino.consensus_nuc_index))
            .collect();
        assert_eq!(positions, vec![(1, Some(0)), (2, Some(3)), (3, Some(6))]);
        assert!(mapping.inserts.is_empty());
    }

    #[test]
    fn picks_the_frame_that_matches() {
        let aligner = GotohAligner::default();
        let mapper = CoordinateMapper::new(&aligner, 40.0, 10.0);
        // One leading base puts the coding sequence in frame 2.
        let counters = counters(&[(b"CAAATTTGCTCATGGC", 0, 5)]);
        let mapping = mapped(mapper.map(&counters, b"KFAHG", None).unwrap());
        assert_eq!(mapping.reading_frame, 2);
        assert_eq!(mapping.report_aminos[0].seed_amino.consensus_nuc_index, Some(1));
        assert_eq!(mapping.report_aminos[0].seed_amino.amino_count(b'K'), 5);
    }

    #[test]
    fn missing_codon_becomes_synthetic_deletion() {
        let aligner = GotohAligner::default();
        let mapper = CoordinateMapper::new(&aligner, 40.0, 10.0);
        let counters = counters(&[(b"TGGTGCCATTATCCGAAATGGTGCCATTTT", 0, 4)]);
        // Reference has an extra E between K and W.
        let mapping = mapped(mapper.map(&counters, b"WCHYPKEWCHF", None).unwrap());
        let synthetic = &mapping.report_aminos[6];
        assert_eq!(synthetic.position, 7);
        assert_eq!(synthetic.seed_amino.consensus_nuc_index, None);
        assert_eq!(synthetic.seed_amino.deletions, 4);
        assert_eq!(synthetic.seed_amino.nucleotides[0].deletions(), 4);
    }

    #[test]
    fn unrelated_consensus_fails() {
        let aligner = GotohAligner::default();
        let mapper = CoordinateMapper::new(&aligner, 40.0, 10.0);
        let counters = counters(&[(b"AAATTTGCT", 0, 9)]);
        match mapper.map(&counters, b"WWWWWWWWWW", None).unwrap() {
            MappingOutcome::Failed { consensus } => assert_eq!(consensus, b"KFA"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn inserted_codon_is_an_insert_candidate() {
        let aligner = GotohAligner::default();
        let mapper = CoordinateMapper::new(&aligner, 40.0, 10.0);
        // MWCHYPKWCH + A + FYWPCHMWYC
        let counters = counters(&[(
            b"ATGTGGTGCCATTATCCGAAATGGTGCCATGCTTTTTATTGGCCGTGCCATATGTGGTATTGC",
            0,
            3,
        )]);
        let mapping = mapped(mapper.map(&counters, b"MWCHYPKWCHFYWPCHMWYC", None).unwrap());
        assert_eq!(mapping.reading_frame, 0);
        assert_eq!(mapping.inserts.iter().copied().collect::<Vec<_>>(), vec![30]);
        assert_eq!(mapping.report_aminos[10].seed_amino.consensus_nuc_index, Some(33));
    }

    #[test]
    fn overlap_counts_come_from_previous_mapping() {
        let aligner = GotohAligner::default();
        let mapper = CoordinateMapper::new(&aligner, 40.0, 10.0);
        let first = mapped(mapper.map(&counters(&[(b"AAATTTGCT", 0, 9)]), b"KFA", None).unwrap());
        let second = counters(&[(b"AAATTTGCT", 0, 2)]);
        let mapping = mapped(
            mapper
                .map(&second, b"KFA", Some(&first.report_aminos))
                .unwrap(),
        );
        assert!(mapping.report_aminos.iter().all(|r| r.seed_amino.v3_overlap == 9));
    }

    proptest! {
        #[test]
        fn prop_index_map_is_monotone(
            reference in proptest::collection::vec(proptest::sample::select(b"ACDEFGHIKLMNPQRSTVWY".to_vec()), 1..20),
            query in proptest::collection::vec(proptest::sample::select(b"ACDEFGHIKLMNPQRSTVWY".to_vec()), 0..20),
        ) {
            let aligner = GotohAligner::default();
            let alignment = aligner.align(&reference, &query, 40.0, 10.0, true).unwrap();
            let map = index_map(&alignment, reference.len());
            let mapped: Vec<usize> = map.iter().flatten().copied().collect();
            prop_assert!(mapped.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(mapped.iter().all(|&i| i < query.len()));
        }
    }
}
