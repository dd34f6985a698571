pub mod codon;
pub mod record;
pub mod reference;
pub mod traits;

pub use record::SeqRecord;
pub use reference::RefSeq;
pub use traits::SeqBytes;
