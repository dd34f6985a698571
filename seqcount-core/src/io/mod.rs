pub mod aligned;
pub mod csv;
pub mod fasta;

pub use aligned::{AlignedRead, AlignedReadGroups, ReadGroup};
