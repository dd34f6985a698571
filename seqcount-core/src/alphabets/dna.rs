use crate::alphabets::Alphabet;
use std::sync::LazyLock;

pub const GAP: u8 = b'-';
/// Padding placed before and after a read when it is cut into codons.
pub const BLANK: u8 = b' ';
/// Marks the unsequenced stretch between the two reads of a pair.
pub const PAIR_GAP: u8 = b'n';

pub fn iupac_alphabet() -> Alphabet {
    Alphabet::new(b"ACGTRYSWKMBDHVNacgtryswkmbdhvn")
}

#[inline]
pub fn is_unambiguous(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

static MIXTURE_CODES: LazyLock<[u8; 16]> = LazyLock::new(|| {
    // Indexed by a bit mask over A=1, C=2, G=4, T=8.
    let mut codes = [b'N'; 16];
    for (mask, code) in [
        (0b0001, b'A'),
        (0b0010, b'C'),
        (0b0100, b'G'),
        (0b1000, b'T'),
        (0b0011, b'M'),
        (0b0101, b'R'),
        (0b1001, b'W'),
        (0b0110, b'S'),
        (0b1010, b'Y'),
        (0b1100, b'K'),
        (0b0111, b'V'),
        (0b1011, b'H'),
        (0b1101, b'D'),
        (0b1110, b'B'),
        (0b1111, b'N'),
    ] {
        codes[mask] = code;
    }
    codes
});

/// IUPAC code for a set of unambiguous bases; `N` for an empty or foreign set.
pub fn mixture_code(bases: &[u8]) -> u8 {
    let mut mask = 0usize;
    for &b in bases {
        mask |= match b {
            b'A' => 1,
            b'C' => 2,
            b'G' => 4,
            b'T' => 8,
            _ => return b'N',
        };
    }
    MIXTURE_CODES[mask]
}
