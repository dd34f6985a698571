use crate::alphabets::{dna, protein, Alphabet};
use crate::error::{SeqError, SeqResult};
use crate::seq::traits::SeqBytes;
use std::sync::LazyLock;

static REFERENCE_SYMBOLS: LazyLock<Alphabet> =
    LazyLock::new(|| dna::iupac_alphabet().union(&protein::iupac_alphabet()));

/// Reference sequence, either nucleotides (seeds) or amino acids (coordinate
/// references). Stored upper-case.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefSeq {
    bytes: Vec<u8>,
}

impl RefSeq {
    pub fn new(mut bytes: Vec<u8>) -> SeqResult<Self> {
        if let Some((pos, ch)) = REFERENCE_SYMBOLS.first_foreign(bytes.as_slice()) {
            return Err(SeqError::InvalidChar {
                ch: ch as char,
                pos,
            });
        }
        bytes.make_ascii_uppercase();
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_str(&self) -> &str {
        // Validated against an ASCII alphabet in `new`.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}

impl SeqBytes for RefSeq {
    fn as_bytes(&self) -> &[u8] {
        RefSeq::as_bytes(self)
    }

    fn from_bytes(bytes: Vec<u8>) -> SeqResult<Self> {
        RefSeq::new(bytes)
    }
}
