use super::*;
use proptest::prelude::*;

fn frame_consensus(counters: &FrameCounters, frame: usize) -> Vec<u8> {
    counters.frame(frame).iter().map(SeedAmino::consensus).collect()
}

#[test]
fn whole_codons_are_translated() {
    let mut counters = FrameCounters::new();
    counters.count_read(b"AAATTTGCT", 0, 9);
    let frame0 = counters.frame(0);
    assert_eq!(frame0.len(), 3);
    assert_eq!(frame0[0].amino_count(b'K'), 9);
    assert_eq!(frame0[1].amino_count(b'F'), 9);
    assert_eq!(frame0[2].amino_count(b'A'), 9);
    assert_eq!(frame_consensus(&counters, 0), b"KFA");
    assert_eq!(frame0[2].nucleotides[1].get(b'C'), 9);
}

#[test]
fn ambiguity_codes_fold_into_n() {
    let mut amino = SeedAmino::new(Some(0));
    amino.count_codon(b"ARy", 2);
    assert_eq!(amino.low_quality, 2);
    assert!(!amino.has_amino_counts());
    assert_eq!(amino.nucleotides[0].get(b'A'), 2);
    assert_eq!(amino.nucleotides[1].get(b'N'), 2);
    assert_eq!(amino.nucleotides[2].get(b'N'), 2);
    assert_eq!(amino.nucleotides[1].coverage(), 0);
}

#[test]
fn frames_get_shifted_nucleotide_indexes() {
    let mut counters = FrameCounters::new();
    counters.count_read(b"AAATTTGCT", 0, 1);
    let indexes = |frame: usize| -> Vec<Option<i64>> {
        counters
            .frame(frame)
            .iter()
            .map(|a| a.consensus_nuc_index)
            .collect()
    };
    assert_eq!(indexes(0), vec![Some(0), Some(3), Some(6)]);
    assert_eq!(indexes(1), vec![Some(-1), Some(2), Some(5), Some(8)]);
    assert_eq!(indexes(2), vec![Some(-2), Some(1), Some(4), Some(7)]);
    // Frame 1 reads " AA", "ATT", "TGC", "T  ".
    assert_eq!(frame_consensus(&counters, 1), b"-IC-");
}

#[test]
fn offset_reads_skip_leading_codons() {
    let mut counters = FrameCounters::new();
    counters.count_read(b"TTT", 3, 4);
    let frame0 = counters.frame(0);
    assert_eq!(frame0.len(), 2);
    assert!(!frame0[0].has_amino_counts());
    assert_eq!(frame0[0].nucleotides[0].total(), 0);
    assert_eq!(frame0[1].amino_count(b'F'), 4);
}

#[test]
fn codon_classification() {
    let mut amino = SeedAmino::new(Some(0));
    amino.count_codon(b"ANA", 1);
    amino.count_codon(b"---", 2);
    amino.count_codon(b"A-A", 3);
    amino.count_codon(b"AA ", 4);
    amino.count_codon(b"AnA", 5);
    amino.count_codon(b"aaa", 6);
    assert_eq!(amino.low_quality, 1);
    assert_eq!(amino.deletions, 2);
    assert_eq!(amino.partial, 3);
    assert_eq!(amino.amino_total(), 6);
    assert_eq!(amino.amino_count(b'K'), 6);

    let first = &amino.nucleotides[0];
    assert_eq!(first.get(b'A'), 1 + 3 + 4 + 5 + 6);
    assert_eq!(first.deletions(), 2);
    let second = &amino.nucleotides[1];
    assert_eq!(second.get(b'N'), 1);
    assert_eq!(second.deletions(), 2 + 3);
    assert_eq!(second.total(), 1 + 2 + 3 + 4 + 6);
    let third = &amino.nucleotides[2];
    assert_eq!(third.total(), 1 + 2 + 3 + 5 + 6);
}

#[test]
fn ambiguous_bases_count_as_n() {
    let mut amino = SeedAmino::new(Some(0));
    amino.count_codon(b"ARA", 2);
    assert_eq!(amino.low_quality, 2);
    assert_eq!(amino.nucleotides[1].get(b'N'), 2);
    assert_eq!(amino.nucleotides[1].coverage(), 0);
}

#[test]
fn deletion_codon_counts() {
    let mut counters = FrameCounters::new();
    counters.count_read(b"AAA---GCT", 0, 2);
    counters.count_read(b"AAATTTGCT", 0, 8);
    let middle = &counters.frame(0)[1];
    assert_eq!(middle.deletions, 2);
    assert_eq!(middle.amino_count(b'F'), 8);
    assert_eq!(middle.coverage(), 10);
    assert_eq!(middle.nucleotides[0].deletions(), 2);
    assert_eq!(middle.nucleotides[0].coverage(), 10);
}

#[test]
fn consensus_ties_follow_alphabet_order() {
    let mut amino = SeedAmino::new(Some(0));
    amino.count_codon(b"TTT", 3); // F
    amino.count_codon(b"GCT", 3); // A
    assert_eq!(amino.consensus(), b'A');
    assert_eq!(SeedAmino::new(Some(0)).consensus(), b'-');
}

#[test]
fn synthetic_positions_carry_deletions() {
    let amino = SeedAmino::synthetic(7);
    assert_eq!(amino.consensus_nuc_index, None);
    assert_eq!(amino.deletions, 7);
    assert!(amino.nucleotides.iter().all(|n| n.deletions() == 7));
}

#[test]
fn overlap_takes_max_of_nucleotides() {
    let mut main = SeedAmino::new(Some(0));
    let mut other = SeedAmino::new(Some(0));
    other.count_codon(b"AC-", 4);
    other.count_codon(b"ACG", 1);
    main.count_overlap(&other);
    assert_eq!(main.nucleotides[0].v3_overlap, 5);
    assert_eq!(main.nucleotides[2].v3_overlap, 1);
    assert_eq!(main.v3_overlap, 5);
}

#[test]
fn pad_frame0_covers_seed() {
    let mut counters = FrameCounters::new();
    counters.count_read(b"AAA", 0, 1);
    counters.pad_frame0(10);
    let frame0 = counters.frame(0);
    assert_eq!(frame0.len(), 4);
    assert_eq!(frame0[3].consensus_nuc_index, Some(9));
}

proptest! {
    #[test]
    fn prop_nucleotide_totals_match_read_bases(
        reads in proptest::collection::vec(
            (proptest::collection::vec(proptest::sample::select(b"ACGT-N".to_vec()), 1..30), 0usize..10, 1u64..5),
            1..8,
        )
    ) {
        let mut counters = FrameCounters::new();
        let mut expected = 0u64;
        for (seq, offset, count) in &reads {
            counters.count_read(seq, *offset, *count);
            expected += seq.len() as u64 * count;
        }
        for frame in 0..3 {
            let tallied: u64 = counters
                .frame(frame)
                .iter()
                .flat_map(|a| a.nucleotides.iter())
                .map(SeedNucleotide::total)
                .sum();
            prop_assert_eq!(tallied, expected);
        }
    }

    #[test]
    fn prop_consensus_is_idempotent(
        seq in proptest::collection::vec(proptest::sample::select(b"ACGT-".to_vec()), 0..40),
        offset in 0usize..9,
    ) {
        let mut counters = FrameCounters::new();
        counters.count_read(&seq, offset, 3);
        for frame in 0..3 {
            prop_assert_eq!(frame_consensus(&counters, frame), frame_consensus(&counters, frame));
        }
    }
}
