pub mod encode;
pub mod matrices;
pub mod scalar_ref;
pub mod types;

pub use encode::{encode_protein, EncodedSeq, PROTEIN_ALPHABET};
pub use types::{AlignmentResult, Cigar, CigarOp, Scoring};

use crate::error::{SeqError, SeqResult};

#[cfg(test)]
mod tests;

/// Gap character in aligned strings.
pub const ALIGN_GAP: u8 = b'-';

/// Two sequences padded with gaps to a common length, plus the alignment score.
#[derive(Clone, Debug, PartialEq)]
pub struct PairAlignment {
    pub aligned_reference: Vec<u8>,
    pub aligned_query: Vec<u8>,
    pub score: f32,
}

/// Global affine-gap alignment of amino acid sequences.
///
/// Penalties are given as positive costs. With `use_terminal_gap_penalty`,
/// leading and trailing gaps are charged the aligner's terminal gap penalty
/// instead of the internal one. [`GotohAligner`] sets that penalty to zero
/// unless configured, so end gaps are free by default.
pub trait PairAligner: Sync {
    fn align(
        &self,
        reference: &[u8],
        query: &[u8],
        gap_open: f32,
        gap_extend: f32,
        use_terminal_gap_penalty: bool,
    ) -> SeqResult<PairAlignment>;
}

/// Scalar Gotoh aligner over BLOSUM62.
#[derive(Clone, Debug)]
pub struct GotohAligner {
    matrix: Vec<i16>,
    terminal_gap_open: f32,
    terminal_gap_extend: f32,
}

impl Default for GotohAligner {
    fn default() -> Self {
        Self {
            matrix: matrices::BLOSUM62.to_vec(),
            terminal_gap_open: 0.0,
            terminal_gap_extend: 0.0,
        }
    }
}

impl GotohAligner {
    /// Costs charged for leading and trailing gaps when an alignment asks
    /// for terminal gap penalties.
    pub fn with_terminal_gap_penalty(mut self, open: f32, extend: f32) -> Self {
        self.terminal_gap_open = open;
        self.terminal_gap_extend = extend;
        self
    }

    fn scoring(
        &self,
        gap_open: f32,
        gap_extend: f32,
        use_terminal_gap_penalty: bool,
    ) -> SeqResult<Scoring> {
        let penalties = [
            gap_open,
            gap_extend,
            self.terminal_gap_open,
            self.terminal_gap_extend,
        ];
        if penalties.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(SeqError::InvalidScoring {
                msg: format!("gap penalties must be finite and non-negative, got {penalties:?}"),
            });
        }
        let scoring = Scoring::with_matrix(
            self.matrix.clone(),
            PROTEIN_ALPHABET.len(),
            -gap_open,
            -gap_extend,
        );
        Ok(if use_terminal_gap_penalty {
            scoring.with_end_gaps(-self.terminal_gap_open, -self.terminal_gap_extend)
        } else {
            scoring
        })
    }
}

impl PairAligner for GotohAligner {
    fn align(
        &self,
        reference: &[u8],
        query: &[u8],
        gap_open: f32,
        gap_extend: f32,
        use_terminal_gap_penalty: bool,
    ) -> SeqResult<PairAlignment> {
        let scoring = self.scoring(gap_open, gap_extend, use_terminal_gap_penalty)?;
        let target = encode_protein(reference)?;
        let encoded_query = encode_protein(query)?;
        let result = scalar_ref::align_global_scalar(&encoded_query, &target, &scoring);
        let (aligned_reference, aligned_query) = gapped_pair(reference, query, &result.cigar);
        Ok(PairAlignment {
            aligned_reference,
            aligned_query,
            score: result.score,
        })
    }
}

/// Expand a CIGAR into gapped copies of target and query.
pub fn gapped_pair(target: &[u8], query: &[u8], cigar: &Cigar) -> (Vec<u8>, Vec<u8>) {
    let len = cigar.len();
    let mut aligned_t = Vec::with_capacity(len);
    let mut aligned_q = Vec::with_capacity(len);
    let mut ti = 0usize;
    let mut qi = 0usize;
    for &(op, n) in &cigar.ops {
        match op {
            CigarOp::Match => {
                aligned_t.extend_from_slice(&target[ti..ti + n]);
                aligned_q.extend_from_slice(&query[qi..qi + n]);
                ti += n;
                qi += n;
            }
            CigarOp::Ins => {
                aligned_t.resize(aligned_t.len() + n, ALIGN_GAP);
                aligned_q.extend_from_slice(&query[qi..qi + n]);
                qi += n;
            }
            CigarOp::Del => {
                aligned_t.extend_from_slice(&target[ti..ti + n]);
                aligned_q.resize(aligned_q.len() + n, ALIGN_GAP);
                ti += n;
            }
        }
    }
    (aligned_t, aligned_q)
}
