//! Amino acid consensus per reading frame and nucleotide mixture consensus.

use crate::alphabets::dna::{mixture_code, GAP};
use crate::counting::{SeedAmino, SeedNucleotide, NUC_SYMBOLS};
use std::fmt;
use std::str::FromStr;

/// Minimum share of reads a base needs to join a consensus mixture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MixtureCutoff {
    /// Only the most common base (ties become a mixture).
    Max,
    Fraction(f64),
}

impl fmt::Display for MixtureCutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixtureCutoff::Max => f.write_str("MAX"),
            MixtureCutoff::Fraction(x) => write!(f, "{x:.3}"),
        }
    }
}

impl FromStr for MixtureCutoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("max") {
            return Ok(MixtureCutoff::Max);
        }
        let x: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid mixture cutoff '{s}'"))?;
        if !(0.0..=1.0).contains(&x) {
            return Err(format!("mixture cutoff {x} is outside 0..=1"));
        }
        Ok(MixtureCutoff::Fraction(x))
    }
}

/// Amino acid consensus of one reading frame.
pub fn amino_consensus(aminos: &[SeedAmino]) -> Vec<u8> {
    aminos.iter().map(SeedAmino::consensus).collect()
}

/// Consensus symbol for one nucleotide position, `None` when nothing was read.
pub fn nucleotide_consensus(nuc: &SeedNucleotide, cutoff: MixtureCutoff) -> Option<u8> {
    let counts = nuc.counts();
    let mut observed: Vec<(u8, u64)> = NUC_SYMBOLS
        .iter()
        .zip(counts)
        .filter(|(_, &count)| count > 0)
        .map(|(&sym, &count)| (sym, count))
        .collect();
    if observed.is_empty() {
        return None;
    }
    // Stable sort keeps NUC_SYMBOLS order among ties.
    observed.sort_by(|a, b| b.1.cmp(&a.1));

    // N and deletions only stand if nothing else was seen.
    let mut i = observed.len();
    while i > 0 && observed.len() > 1 {
        i -= 1;
        if matches!(observed[i].0, b'N' | GAP) {
            observed.remove(i);
        }
    }

    let threshold = match cutoff {
        MixtureCutoff::Max => observed[0].1 as f64,
        MixtureCutoff::Fraction(x) => nuc.total() as f64 * x,
    };
    let mut mixture: Vec<u8> = observed
        .iter()
        .filter(|(_, count)| *count as f64 >= threshold)
        .map(|(sym, _)| *sym)
        .collect();

    Some(match mixture.len() {
        0 => b'N',
        1 => mixture[0],
        _ => {
            mixture.sort_unstable();
            mixture_code(&mixture)
        }
    })
}

/// Nucleotide consensus of frame 0 counters at one cutoff.
///
/// Leading codons whose amino coverage is zero or below `min_coverage` are
/// skipped; the returned offset is the first kept codon's nucleotide index.
/// Positions read fewer than `min_coverage` times become `-`. Returns `None`
/// when no codon qualifies.
pub fn seed_consensus(
    aminos: &[SeedAmino],
    cutoff: MixtureCutoff,
    min_coverage: u64,
) -> Option<(i64, Vec<u8>)> {
    let mut offset = None;
    let mut sequence = Vec::with_capacity(aminos.len() * 3);
    for amino in aminos {
        if offset.is_none() {
            let coverage = amino.amino_total();
            if coverage == 0 || coverage < min_coverage {
                continue;
            }
            let Some(index) = amino.consensus_nuc_index else {
                continue;
            };
            offset = Some(index);
        }
        for nuc in &amino.nucleotides {
            if nuc.total() < min_coverage {
                sequence.push(GAP);
            } else if let Some(symbol) = nucleotide_consensus(nuc, cutoff) {
                sequence.push(symbol);
            }
        }
    }
    offset.map(|offset| (offset, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::FrameCounters;

    fn nucleotide(counts: &[(u8, u64)]) -> SeedNucleotide {
        let mut nuc = SeedNucleotide::default();
        for &(sym, count) in counts {
            nuc.count(sym, count);
        }
        nuc
    }

    #[test]
    fn cutoff_labels() {
        assert_eq!(MixtureCutoff::Max.to_string(), "MAX");
        assert_eq!(MixtureCutoff::Fraction(0.1).to_string(), "0.100");
        assert_eq!(MixtureCutoff::Fraction(0.25).to_string(), "0.250");
        assert_eq!("max".parse::<MixtureCutoff>().unwrap(), MixtureCutoff::Max);
        assert_eq!(
            "0.02".parse::<MixtureCutoff>().unwrap(),
            MixtureCutoff::Fraction(0.02)
        );
        assert!("1.5".parse::<MixtureCutoff>().is_err());
        assert!("x".parse::<MixtureCutoff>().is_err());
    }

    #[test]
    fn kfa_consensus_at_max() {
        let mut counters = FrameCounters::new();
        counters.count_read(b"AAATTTGCT", 0, 9);
        assert_eq!(amino_consensus(counters.frame(0)), b"KFA");
        let (offset, seq) = seed_consensus(counters.frame(0), MixtureCutoff::Max, 9).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(seq, b"AAATTTGCT");
    }

    #[test]
    fn minority_base_joins_mixture_above_cutoff() {
        let nuc = nucleotide(&[(b'A', 1), (b'G', 8)]);
        assert_eq!(nucleotide_consensus(&nuc, MixtureCutoff::Max), Some(b'G'));
        assert_eq!(nucleotide_consensus(&nuc, MixtureCutoff::Fraction(0.1)), Some(b'R'));
        assert_eq!(nucleotide_consensus(&nuc, MixtureCutoff::Fraction(0.2)), Some(b'G'));
    }

    #[test]
    fn max_ties_become_a_mixture() {
        let nuc = nucleotide(&[(b'C', 4), (b'T', 4)]);
        assert_eq!(nucleotide_consensus(&nuc, MixtureCutoff::Max), Some(b'Y'));
    }

    #[test]
    fn gaps_and_n_yield_to_bases() {
        let nuc = nucleotide(&[(b'-', 8), (b'N', 5), (b'A', 2)]);
        assert_eq!(nucleotide_consensus(&nuc, MixtureCutoff::Max), Some(b'A'));
        let gaps = nucleotide(&[(b'-', 8)]);
        assert_eq!(nucleotide_consensus(&gaps, MixtureCutoff::Max), Some(b'-'));
        let both = nucleotide(&[(b'-', 8), (b'N', 2)]);
        assert_eq!(nucleotide_consensus(&both, MixtureCutoff::Max), Some(b'-'));
    }

    #[test]
    fn nothing_passing_the_cutoff_is_n() {
        // Four bases at 25% each, none reaching 30%.
        let nuc = nucleotide(&[(b'A', 1), (b'C', 1), (b'G', 1), (b'T', 1)]);
        assert_eq!(nucleotide_consensus(&nuc, MixtureCutoff::Fraction(0.3)), Some(b'N'));
        assert_eq!(nucleotide_consensus(&SeedNucleotide::default(), MixtureCutoff::Max), None);
    }

    #[test]
    fn low_coverage_positions_are_masked_and_leading_codons_trimmed() {
        let mut counters = FrameCounters::new();
        counters.count_read(b"AAA", 0, 2);
        counters.count_read(b"TTTGC", 3, 10);
        let (offset, seq) = seed_consensus(counters.frame(0), MixtureCutoff::Max, 5).unwrap();
        assert_eq!(offset, 3);
        // Third base of the last codon was never read.
        assert_eq!(seq, b"TTTGC-");
        assert!(seed_consensus(counters.frame(0), MixtureCutoff::Max, 100).is_none());
    }

    #[test]
    fn deletion_consensus() {
        let mut counters = FrameCounters::new();
        counters.count_read(b"AAA---GCT", 0, 8);
        counters.count_read(b"AAATTTGCT", 0, 2);
        let frame0 = counters.frame(0);
        assert_eq!(frame0[1].deletions, 8);
        // Deletions give way to any observed base, which must still pass the cutoff.
        let (_, seq) = seed_consensus(frame0, MixtureCutoff::Fraction(0.1), 10).unwrap();
        assert_eq!(seq, b"AAATTTGCT");
        let (_, seq) = seed_consensus(frame0, MixtureCutoff::Fraction(0.25), 10).unwrap();
        assert_eq!(seq, b"AAANNNGCT");

        let mut counters = FrameCounters::new();
        counters.count_read(b"AAA---GCT", 0, 10);
        let (_, seq) = seed_consensus(counters.frame(0), MixtureCutoff::Max, 10).unwrap();
        assert_eq!(seq, b"AAA---GCT");
    }
}
