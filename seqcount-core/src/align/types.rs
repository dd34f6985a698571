/// CIGAR operations consume sequence coordinates.
/// Ins consumes query (gap in target), Del consumes target (gap in query).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CigarOp {
    /// Consumes query and target.
    Match,
    /// Consumes query, gap in target.
    Ins,
    /// Consumes target, gap in query.
    Del,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Cigar {
    pub ops: Vec<(CigarOp, usize)>,
}

impl Cigar {
    pub fn push(&mut self, op: CigarOp, len: usize) {
        if len == 0 {
            return;
        }
        if let Some((last_op, last_len)) = self.ops.last_mut() {
            if *last_op == op {
                *last_len += len;
                return;
            }
        }
        self.ops.push((op, len));
    }

    pub fn len(&self) -> usize {
        self.ops.iter().map(|(_, n)| *n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentResult {
    pub score: f32,
    pub cigar: Cigar,
}

#[derive(Clone, Debug)]
pub struct Scoring {
    pub gap_open: f32,
    pub gap_extend: f32,
    pub matrix: Vec<i16>,
    pub alphabet_size: usize,
    /// Score leading and trailing gaps with `end_gap_open`/`end_gap_extend`.
    pub end_gap: bool,
    pub end_gap_open: f32,
    pub end_gap_extend: f32,
}

impl Scoring {
    pub fn with_matrix(
        matrix: Vec<i16>,
        alphabet_size: usize,
        gap_open: f32,
        gap_extend: f32,
    ) -> Self {
        assert!(gap_open <= 0.0, "gap_open must be <= 0");
        assert!(gap_extend <= 0.0, "gap_extend must be <= 0");
        assert_eq!(
            matrix.len(),
            alphabet_size * alphabet_size,
            "scoring matrix must be square over the alphabet"
        );
        Self {
            gap_open,
            gap_extend,
            matrix,
            alphabet_size,
            end_gap: false,
            end_gap_open: gap_open,
            end_gap_extend: gap_extend,
        }
    }

    pub fn with_end_gaps(mut self, end_gap_open: f32, end_gap_extend: f32) -> Self {
        self.end_gap = true;
        self.end_gap_open = end_gap_open;
        self.end_gap_extend = end_gap_extend;
        self
    }

    #[inline]
    pub fn score(&self, a: u8, b: u8) -> i16 {
        self.matrix[(a as usize) * self.alphabet_size + (b as usize)]
    }

    /// Cost of a gap of `len` residues, terminal or internal.
    #[inline]
    pub fn gap_cost(&self, len: usize, terminal: bool) -> f32 {
        if len == 0 {
            return 0.0;
        }
        let (open, extend) = if terminal && self.end_gap {
            (self.end_gap_open, self.end_gap_extend)
        } else {
            (self.gap_open, self.gap_extend)
        };
        open + extend * (len as f32 - 1.0)
    }
}
