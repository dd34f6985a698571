use super::*;
use proptest::prelude::*;

fn rescore(alignment: &PairAlignment, aligner: &GotohAligner, gap_open: f32, gap_extend: f32, terminal: bool) -> f32 {
    let reference = &alignment.aligned_reference;
    let query = &alignment.aligned_query;
    let len = reference.len();
    let mut score = 0.0f32;
    let mut col = 0usize;
    while col < len {
        let ref_gap = reference[col] == ALIGN_GAP;
        let query_gap = query[col] == ALIGN_GAP;
        if !ref_gap && !query_gap {
            let r = PROTEIN_ALPHABET.iter().position(|&b| b == reference[col]).unwrap();
            let q = PROTEIN_ALPHABET.iter().position(|&b| b == query[col]).unwrap();
            score += aligner.matrix[q * PROTEIN_ALPHABET.len() + r] as f32;
            col += 1;
            continue;
        }
        let start = col;
        while col < len
            && (reference[col] == ALIGN_GAP) == ref_gap
            && (query[col] == ALIGN_GAP) == query_gap
        {
            col += 1;
        }
        let run = (col - start) as f32;
        let at_end = start == 0 || col == len;
        let (open, extend) = if terminal && at_end {
            (aligner.terminal_gap_open, aligner.terminal_gap_extend)
        } else {
            (gap_open, gap_extend)
        };
        score -= open + extend * (run - 1.0);
    }
    score
}

fn ungapped(seq: &[u8]) -> Vec<u8> {
    seq.iter().copied().filter(|&b| b != ALIGN_GAP).collect()
}

#[test]
fn identical_sequences_align_without_gaps() {
    let aligner = GotohAligner::default();
    let res = aligner.align(b"KFA", b"KFA", 40.0, 10.0, true).unwrap();
    assert_eq!(res.score, 15.0);
    assert_eq!(res.aligned_reference, b"KFA");
    assert_eq!(res.aligned_query, b"KFA");
}

#[test]
fn short_reference_sits_inside_longer_query_for_free() {
    let aligner = GotohAligner::default();
    let res = aligner.align(b"FAGH", b"KKKFAGHKKK", 40.0, 10.0, true).unwrap();
    assert_eq!(res.score, 24.0);
    assert_eq!(res.aligned_reference, b"---FAGH---");
    assert_eq!(res.aligned_query, b"KKKFAGHKKK");
}

#[test]
fn terminal_gaps_cost_like_internal_ones_when_disabled() {
    let aligner = GotohAligner::default();
    let res = aligner.align(b"FAGH", b"KFAGH", 40.0, 10.0, false).unwrap();
    // One leading gap in the reference: F+A+G+H = 24, minus the open cost.
    assert_eq!(res.score, 24.0 - 40.0);
    assert_eq!(res.aligned_reference, b"-FAGH");
}

#[test]
fn inserted_residue_opens_a_reference_gap() {
    let aligner = GotohAligner::default();
    let reference = b"MWCHYPKWCHFYWPCHMWYC";
    let query = b"MWCHYPKWCHAFYWPCHMWYC";
    let res = aligner.align(reference, query, 40.0, 10.0, true).unwrap();
    assert_eq!(res.aligned_reference, b"MWCHYPKWCH-FYWPCHMWYC".to_vec());
    assert_eq!(res.aligned_query, query.to_vec());
}

#[test]
fn empty_query_is_all_deletion() {
    let aligner = GotohAligner::default();
    let res = aligner.align(b"KFA", b"", 40.0, 10.0, false).unwrap();
    assert_eq!(res.aligned_query, b"---");
    assert_eq!(res.score, -(40.0 + 10.0 * 2.0));
}

#[test]
fn rejects_unknown_residues() {
    let aligner = GotohAligner::default();
    let err = aligner.align(b"KFA", b"K-A", 40.0, 10.0, true).unwrap_err();
    match err {
        SeqError::InvalidChar { ch: '-', pos: 1 } => {}
        other => panic!("expected invalid char error, got {other:?}"),
    }
}

#[test]
fn rejects_negative_penalties() {
    let aligner = GotohAligner::default();
    assert!(matches!(
        aligner.align(b"KFA", b"KFA", -1.0, 10.0, true),
        Err(SeqError::InvalidScoring { .. })
    ));
}

#[test]
fn configured_terminal_penalty_charges_end_gaps() {
    let aligner = GotohAligner::default().with_terminal_gap_penalty(40.0, 10.0);
    let res = aligner.align(b"FAGH", b"KFAGH", 40.0, 10.0, true).unwrap();
    assert_eq!(res.score, 24.0 - 40.0);
    assert_eq!(res.aligned_reference, b"-FAGH");
    assert_eq!(res.aligned_query, b"KFAGH");

    let res = aligner.align(b"FAGH", b"KFAGH", 40.0, 10.0, false).unwrap();
    assert_eq!(res.score, 24.0 - 40.0);
}

#[test]
fn negative_terminal_penalty_is_rejected() {
    let aligner = GotohAligner::default().with_terminal_gap_penalty(-1.0, 0.0);
    assert!(matches!(
        aligner.align(b"KFA", b"KFA", 40.0, 10.0, true),
        Err(SeqError::InvalidScoring { .. })
    ));
}

#[test]
fn cigar_push_merges_runs() {
    let mut cigar = Cigar::default();
    cigar.push(CigarOp::Match, 2);
    cigar.push(CigarOp::Match, 3);
    cigar.push(CigarOp::Ins, 0);
    cigar.push(CigarOp::Del, 1);
    assert_eq!(cigar.ops, vec![(CigarOp::Match, 5), (CigarOp::Del, 1)]);
    assert_eq!(cigar.len(), 6);
}

fn protein_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(proptest::sample::select(b"ACDEFGHIKLMNPQRSTVWY".to_vec()), 0..24)
}

proptest! {
    #[test]
    fn prop_alignment_preserves_both_sequences(
        reference in protein_strategy(),
        query in protein_strategy(),
        terminal in any::<bool>(),
    ) {
        let aligner = GotohAligner::default();
        let res = aligner.align(&reference, &query, 40.0, 10.0, terminal).unwrap();
        prop_assert_eq!(res.aligned_reference.len(), res.aligned_query.len());
        prop_assert_eq!(ungapped(&res.aligned_reference), reference);
        prop_assert_eq!(ungapped(&res.aligned_query), query);
    }

    #[test]
    fn prop_score_matches_rescored_alignment(
        reference in protein_strategy(),
        query in protein_strategy(),
        terminal in any::<bool>(),
    ) {
        prop_assume!(!reference.is_empty() && !query.is_empty());
        let aligner = GotohAligner::default();
        let res = aligner.align(&reference, &query, 12.0, 2.0, terminal).unwrap();
        prop_assert_eq!(res.score, rescore(&res, &aligner, 12.0, 2.0, terminal));
    }
}
