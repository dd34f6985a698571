use crate::alphabets::Alphabet;
use std::sync::LazyLock;

/// Amino acid symbols counted at each position, in report column order.
pub const AMINO_ALPHABET: &[u8; 21] = b"ACDEFGHIKLMNPQRSTVWY*";

static AMINO_INDEX: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut index = [u8::MAX; 256];
    for (i, &aa) in AMINO_ALPHABET.iter().enumerate() {
        index[aa as usize] = i as u8;
    }
    index
});

/// Column of `aa` in [`AMINO_ALPHABET`].
#[inline]
pub fn amino_index(aa: u8) -> Option<usize> {
    match AMINO_INDEX[aa as usize] {
        u8::MAX => None,
        i => Some(i as usize),
    }
}

pub fn iupac_alphabet() -> Alphabet {
    Alphabet::new(b"ABCDEFGHIKLMNPQRSTVWXYZ*abcdefghiklmnpqrstvwxyz")
}
