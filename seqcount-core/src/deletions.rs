use crate::align::{PairAligner, PairAlignment};
use crate::alphabets::dna::GAP;
use crate::error::SeqResult;
use crate::seq::codon::translate;
use log::warn;
use memchr::memchr_iter;
use std::collections::HashMap;

/// Deletion positions closer than this merge into one group.
pub const DELETION_GAP_SIZE: usize = 13;

const FRAMES: [usize; 3] = [0, 1, 2];

/// Reading frame per sample nucleotide position. Positions without an entry
/// are in frame 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadingFrameMap {
    frames: HashMap<i64, usize>,
}

impl ReadingFrameMap {
    pub fn get(&self, nuc_pos: i64) -> usize {
        self.frames.get(&nuc_pos).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Record a frame unless an earlier reference already claimed the position.
    fn claim(&mut self, nuc_pos: i64, frame: usize) {
        self.frames.entry(nuc_pos).or_insert(frame);
    }
}

/// Derive reading frames along a remap consensus by aligning its translation,
/// shifted by 0, 1 or 2 bases, to each coordinate reference in turn.
pub fn load_reading_frames<A: PairAligner + ?Sized>(
    aligner: &A,
    conseq: &[u8],
    coordinate_refs: &[&[u8]],
    gap_open: f32,
    gap_extend: f32,
) -> SeqResult<ReadingFrameMap> {
    let mut map = ReadingFrameMap::default();
    for &coord_ref in coordinate_refs {
        let candidates: SeqResult<Vec<(usize, PairAlignment)>> = par_try_map!(FRAMES[..], |&frame| {
            let mut shifted = vec![GAP; frame];
            shifted.extend_from_slice(conseq);
            let conseq_aminos = translate(&shifted);
            aligner
                .align(&conseq_aminos, coord_ref, gap_open, gap_extend, true)
                .map(|alignment| (frame, alignment))
        });

        let mut best: Option<(usize, PairAlignment)> = None;
        for (frame, alignment) in candidates? {
            if best.as_ref().map_or(true, |(_, b)| alignment.score > b.score) {
                best = Some((frame, alignment));
            }
        }
        let Some((frame, alignment)) = best else {
            continue;
        };
        if frame == 0 {
            continue;
        }

        let mut conseq_codon_index: i64 = -1;
        for (&conseq_amino, &coord_amino) in alignment
            .aligned_reference
            .iter()
            .zip(&alignment.aligned_query)
        {
            if conseq_amino != GAP {
                conseq_codon_index += 1;
            }
            if coord_amino == GAP {
                continue;
            }
            let nuc_pos = conseq_codon_index * 3 - frame as i64;
            for i in 0..3 {
                map.claim(nuc_pos + i, frame);
            }
        }
    }
    Ok(map)
}

/// Split sorted deletion positions into correctable groups.
///
/// Positions merge while fewer than `DELETION_GAP_SIZE` bases apart. A merged
/// group is kept only if it spans fewer than `DELETION_GAP_SIZE` bases and
/// holds a multiple of three positions.
pub fn group_deletions(positions: &[usize]) -> Vec<&[usize]> {
    let mut groups = Vec::new();
    let Some(&last) = positions.last() else {
        return groups;
    };
    let mut group_start = 0;
    for i in 1..=positions.len() {
        let pos = positions.get(i).copied().unwrap_or(last + DELETION_GAP_SIZE);
        let start = positions[group_start];
        let end = positions[i - 1];
        if pos - end >= DELETION_GAP_SIZE {
            if end - start < DELETION_GAP_SIZE && (i - group_start) % 3 == 0 {
                groups.push(&positions[group_start..i]);
            }
            group_start = i;
        }
    }
    groups
}

/// Move each correctable deletion group in `seq` onto a codon boundary.
/// `offset` is the read's start in sample coordinates.
pub fn align_deletions(seq: &mut Vec<u8>, offset: usize, frames: &ReadingFrameMap) {
    let positions: Vec<usize> = memchr_iter(GAP, seq).collect();
    for group in group_deletions(&positions) {
        let size = group.len();
        let anchor = group[size / 2];
        let start = anchor - size / 2;
        let nuc_pos = (offset + start) as i64;
        let new_start = match (nuc_pos as usize + frames.get(nuc_pos)) % 3 {
            1 => start.checked_sub(1),
            2 => Some(start + 1),
            _ => Some(start),
        };
        let Some(new_start) = new_start.filter(|&s| s + size <= seq.len()) else {
            warn!(
                "deletion at read position {start} (offset {offset}) cannot shift outside the read"
            );
            continue;
        };

        let mut shifted = Vec::with_capacity(seq.len());
        let mut old = group.iter().peekable();
        for (i, &b) in seq.iter().enumerate() {
            if old.peek() == Some(&&i) {
                old.next();
            } else {
                shifted.push(b);
            }
        }
        shifted.splice(new_start..new_start, std::iter::repeat(GAP).take(size));
        *seq = shifted;
    }
}
