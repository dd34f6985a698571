use crate::error::{SeqError, SeqResult};
use std::sync::LazyLock;

/// Residues as row/column indexes into a substitution matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSeq {
    pub(crate) codes: Vec<u8>,
}

/// Row/column order of the protein scoring matrices.
pub const PROTEIN_ALPHABET: &[u8] = b"ARNDCQEGHILKMFPSTWYVBZX*";

static PROTEIN_MAP: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut map = [u8::MAX; 256];
    for (i, &b) in PROTEIN_ALPHABET.iter().enumerate() {
        map[b as usize] = i as u8;
        map[b.to_ascii_lowercase() as usize] = i as u8;
    }
    map
});

/// Fails on the first residue outside [`PROTEIN_ALPHABET`], gaps included.
pub fn encode_protein(seq: &[u8]) -> SeqResult<EncodedSeq> {
    let codes = seq
        .iter()
        .enumerate()
        .map(|(pos, &b)| match PROTEIN_MAP[b as usize] {
            u8::MAX => Err(SeqError::InvalidChar { ch: b as char, pos }),
            code => Ok(code),
        })
        .collect::<SeqResult<Vec<u8>>>()?;
    Ok(EncodedSeq { codes })
}
