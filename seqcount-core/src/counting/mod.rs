//! Per-codon and per-base frequency tallies in all three reading frames.

use crate::alphabets::dna::{BLANK, GAP, PAIR_GAP};
use crate::alphabets::protein::{amino_index, AMINO_ALPHABET};
use crate::seq::codon::translate_codon;

#[cfg(test)]
mod tests;

/// Column order of nucleotide counts.
pub const NUC_SYMBOLS: &[u8; 6] = b"ACGTN-";

#[inline]
fn nuc_slot(nuc: u8) -> usize {
    match nuc {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' => 3,
        GAP => 5,
        _ => 4,
    }
}

/// Upper-case a read character, leaving the read-pair gap marker alone.
#[inline]
fn normalize(nuc: u8) -> u8 {
    if nuc == PAIR_GAP {
        nuc
    } else {
        nuc.to_ascii_uppercase()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedNucleotide {
    counts: [u64; 6],
    pub v3_overlap: u64,
}

impl SeedNucleotide {
    /// Tally one read character. Blanks and the pair gap are ignored; any
    /// symbol outside `ACGT-` counts as `N`.
    pub fn count(&mut self, nuc: u8, count: u64) {
        let nuc = normalize(nuc);
        if nuc == BLANK || nuc == PAIR_GAP {
            return;
        }
        self.counts[nuc_slot(nuc)] += count;
    }

    pub fn get(&self, nuc: u8) -> u64 {
        self.counts[nuc_slot(nuc)]
    }

    pub fn deletions(&self) -> u64 {
        self.counts[5]
    }

    /// Counts per symbol in `NUC_SYMBOLS` order.
    pub fn counts(&self) -> &[u64; 6] {
        &self.counts
    }

    /// Every tallied read, including `N` and deletions.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `A+C+G+T+del`.
    pub fn coverage(&self) -> u64 {
        self.total() - self.counts[4]
    }

    pub fn count_overlap(&mut self, other: &SeedNucleotide) {
        self.v3_overlap += other.counts[..4].iter().sum::<u64>();
    }
}

/// Counts for one codon position of one reading frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedAmino {
    /// Zero-based nucleotide index of the codon's first base in the sample's
    /// coordinates. `None` for synthetic positions.
    pub consensus_nuc_index: Option<i64>,
    counts: [u64; 21],
    pub low_quality: u64,
    pub partial: u64,
    pub deletions: u64,
    pub nucleotides: [SeedNucleotide; 3],
    pub v3_overlap: u64,
}

impl SeedAmino {
    pub fn new(consensus_nuc_index: Option<i64>) -> Self {
        Self {
            consensus_nuc_index,
            counts: [0; 21],
            low_quality: 0,
            partial: 0,
            deletions: 0,
            nucleotides: Default::default(),
            v3_overlap: 0,
        }
    }

    /// Classify a three-character codon window and tally it.
    pub fn count_codon(&mut self, codon: &[u8], count: u64) {
        let mut window = [BLANK; 3];
        for (slot, &nuc) in window.iter_mut().zip(codon) {
            *slot = normalize(nuc);
        }

        let ambiguous = window
            .iter()
            .any(|&b| !matches!(b, b'A' | b'C' | b'G' | b'T' | GAP | BLANK | PAIR_GAP));
        if ambiguous {
            self.low_quality += count;
        } else if window == [GAP; 3] {
            self.deletions += count;
        } else if window.contains(&GAP) {
            self.partial += count;
        } else if let Some(idx) = translate_codon(&window).and_then(amino_index) {
            self.counts[idx] += count;
        }

        for (nuc, &b) in self.nucleotides.iter_mut().zip(&window) {
            nuc.count(b, count);
        }
    }

    pub fn amino_count(&self, amino: u8) -> u64 {
        amino_index(amino).map_or(0, |idx| self.counts[idx])
    }

    /// Counts per amino acid in `AMINO_ALPHABET` order.
    pub fn amino_counts(&self) -> &[u64; 21] {
        &self.counts
    }

    pub fn amino_total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn has_amino_counts(&self) -> bool {
        self.counts.iter().any(|&c| c > 0)
    }

    /// Amino counts plus full-codon deletions.
    pub fn coverage(&self) -> u64 {
        self.amino_total() + self.deletions
    }

    /// Most frequent amino acid, earliest in `AMINO_ALPHABET` on ties, or `-`
    /// when nothing was translated here.
    pub fn consensus(&self) -> u8 {
        let mut best: Option<(usize, u64)> = None;
        for (idx, &count) in self.counts.iter().enumerate() {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((idx, count));
            }
        }
        best.map_or(GAP, |(idx, _)| AMINO_ALPHABET[idx])
    }

    /// Stand-in for a reference position that no codon mapped to.
    pub fn synthetic(deletions: u64) -> Self {
        let mut amino = Self::new(None);
        amino.deletions = deletions;
        for nuc in &mut amino.nucleotides {
            nuc.count(GAP, deletions);
        }
        amino
    }

    pub fn count_overlap(&mut self, other: &SeedAmino) {
        for (nuc, other_nuc) in self.nucleotides.iter_mut().zip(&other.nucleotides) {
            nuc.count_overlap(other_nuc);
            self.v3_overlap = self.v3_overlap.max(nuc.v3_overlap);
        }
    }
}

/// Codon counters for reading frames 0, 1 and 2.
#[derive(Clone, Debug, Default)]
pub struct FrameCounters {
    frames: [Vec<SeedAmino>; 3],
}

impl FrameCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self, frame: usize) -> &[SeedAmino] {
        &self.frames[frame]
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        for frame in &mut self.frames {
            frame.clear();
        }
    }

    /// Tally a read that starts `offset` bases into the sample's coordinates.
    pub fn count_read(&mut self, seq: &[u8], offset: usize, count: u64) {
        for (frame, aminos) in self.frames.iter_mut().enumerate() {
            let lead = frame + offset;
            let padded_len = (lead + seq.len()).div_ceil(3) * 3;
            let at = |pos: usize| {
                pos.checked_sub(lead)
                    .and_then(|i| seq.get(i).copied())
                    .unwrap_or(BLANK)
            };
            let start = offset - offset % 3;
            for nuc_pos in (start..padded_len).step_by(3) {
                let codon_index = nuc_pos / 3;
                grow(aminos, codon_index + 1, frame);
                let codon = [at(nuc_pos), at(nuc_pos + 1), at(nuc_pos + 2)];
                aminos[codon_index].count_codon(&codon, count);
            }
        }
    }

    /// Extend frame 0 until it spans `seed_len` nucleotides.
    pub fn pad_frame0(&mut self, seed_len: usize) {
        let needed = seed_len.div_ceil(3);
        grow(&mut self.frames[0], needed, 0);
    }
}

fn grow(aminos: &mut Vec<SeedAmino>, len: usize, frame: usize) {
    while aminos.len() < len {
        let index = 3 * aminos.len() as i64 - frame as i64;
        aminos.push(SeedAmino::new(Some(index)));
    }
}
