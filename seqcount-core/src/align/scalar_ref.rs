//! Gotoh global alignment with full traceback.
//! Rows follow the target (i), columns follow the query (j).

use super::encode::EncodedSeq;
use super::types::{AlignmentResult, Cigar, CigarOp, Scoring};

// Bits 0-1: predecessor of H.
const DIR_DIAG: u8 = 0;
const DIR_DEL: u8 = 1; // E (vertical gap, consumes target)
const DIR_INS: u8 = 2; // F (horizontal gap, consumes query)
const DIR_MASK: u8 = 0b11;
// Set when E/F extended an open gap rather than opening from H.
const E_EXTENDED: u8 = 0b0100;
const F_EXTENDED: u8 = 0b1000;

struct TraceMatrix {
    cols: usize,
    cells: Vec<u8>,
}

impl TraceMatrix {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            cells: vec![DIR_DIAG; rows * cols],
        }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.cols + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: u8) {
        self.cells[i * self.cols + j] = value;
    }
}

#[derive(Clone, Copy)]
enum State {
    H,
    E,
    F,
}

#[inline]
fn gap_params(scoring: &Scoring, terminal: bool) -> (f32, f32) {
    if terminal && scoring.end_gap {
        (scoring.end_gap_open, scoring.end_gap_extend)
    } else {
        (scoring.gap_open, scoring.gap_extend)
    }
}

pub fn align_global_scalar(
    query: &EncodedSeq,
    target: &EncodedSeq,
    scoring: &Scoring,
) -> AlignmentResult {
    let m = query.codes.len();
    let n = target.codes.len();

    if m == 0 || n == 0 {
        let mut cigar = Cigar::default();
        if m == 0 {
            cigar.push(CigarOp::Del, n);
        } else {
            cigar.push(CigarOp::Ins, m);
        }
        return AlignmentResult {
            score: scoring.gap_cost(m.max(n), true),
            cigar,
        };
    }

    let neg_inf = f32::NEG_INFINITY;
    let mut trace = TraceMatrix::new(n + 1, m + 1);
    let mut h_row: Vec<f32> = (0..=m).map(|j| scoring.gap_cost(j, true)).collect();
    let mut e_row = vec![neg_inf; m + 1];
    for j in 1..=m {
        trace.set(0, j, DIR_INS);
    }

    for i in 1..=n {
        let t = target.codes[i - 1];
        let mut h_diag = h_row[0];
        h_row[0] = scoring.gap_cost(i, true);
        trace.set(i, 0, DIR_DEL);
        let (ins_open, ins_extend) = gap_params(scoring, i == n);
        let mut f = neg_inf;
        for j in 1..=m {
            let (del_open, del_extend) = gap_params(scoring, j == m);
            let mut cell = 0u8;

            let h_up = h_row[j];
            let e_open = h_up + del_open;
            let e_ext = e_row[j] + del_extend;
            if e_ext > e_open {
                e_row[j] = e_ext;
                cell |= E_EXTENDED;
            } else {
                e_row[j] = e_open;
            }

            let f_open = h_row[j - 1] + ins_open;
            let f_ext = f + ins_extend;
            if f_ext > f_open {
                f = f_ext;
                cell |= F_EXTENDED;
            } else {
                f = f_open;
            }

            // Ties resolve DIAG > DEL > INS.
            let mut h = h_diag + scoring.score(query.codes[j - 1], t) as f32;
            let mut dir = DIR_DIAG;
            if e_row[j] > h {
                h = e_row[j];
                dir = DIR_DEL;
            }
            if f > h {
                h = f;
                dir = DIR_INS;
            }
            trace.set(i, j, cell | dir);
            h_row[j] = h;
            h_diag = h_up;
        }
    }

    let score = h_row[m];
    let mut rev = Cigar::default();
    let (mut i, mut j) = (n, m);
    let mut state = State::H;
    while i > 0 || j > 0 {
        if i == 0 {
            rev.push(CigarOp::Ins, j);
            break;
        }
        if j == 0 {
            rev.push(CigarOp::Del, i);
            break;
        }
        let cell = trace.get(i, j);
        match state {
            State::H => match cell & DIR_MASK {
                DIR_DIAG => {
                    rev.push(CigarOp::Match, 1);
                    i -= 1;
                    j -= 1;
                }
                DIR_DEL => state = State::E,
                _ => state = State::F,
            },
            State::E => {
                rev.push(CigarOp::Del, 1);
                i -= 1;
                if cell & E_EXTENDED == 0 {
                    state = State::H;
                }
            }
            State::F => {
                rev.push(CigarOp::Ins, 1);
                j -= 1;
                if cell & F_EXTENDED == 0 {
                    state = State::H;
                }
            }
        }
    }
    rev.ops.reverse();

    AlignmentResult { score, cigar: rev }
}
