use std::sync::LazyLock;

static BASE_INDEX: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut map = [u8::MAX; 256];
    for (i, &b) in b"ACGT".iter().enumerate() {
        map[b as usize] = i as u8;
        map[b.to_ascii_lowercase() as usize] = i as u8;
    }
    map
});

const CODON_TABLE: [u8; 64] = *b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

/// Amino acid for a codon of unambiguous bases, `None` otherwise.
#[inline]
pub fn translate_codon(codon: &[u8]) -> Option<u8> {
    let [a, b, c] = codon else {
        return None;
    };
    let i1 = BASE_INDEX[*a as usize];
    let i2 = BASE_INDEX[*b as usize];
    let i3 = BASE_INDEX[*c as usize];
    if i1 < 4 && i2 < 4 && i3 < 4 {
        let idx = ((i1 as usize) << 4) | ((i2 as usize) << 2) | (i3 as usize);
        Some(CODON_TABLE[idx])
    } else {
        None
    }
}

/// Translate whole codons, writing `X` for any codon that is not plain ACGT.
/// Trailing bases that do not fill a codon are dropped.
pub fn translate(nucs: &[u8]) -> Vec<u8> {
    nucs.chunks_exact(3)
        .map(|codon| translate_codon(codon).unwrap_or(b'X'))
        .collect()
}
