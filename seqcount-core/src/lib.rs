#[macro_use]
mod par;

pub mod align;
pub mod alphabets;
pub mod consensus;
pub mod coordinate;
pub mod counting;
pub mod deletions;
pub mod error;
pub mod insertions;
pub mod io;
pub mod progress;
pub mod projects;
pub mod report;
pub mod seq;
pub mod writers;

pub use error::{SeqError, SeqResult};
pub use projects::ProjectConfig;
pub use report::{ReportConfig, SequenceReport, Stream};
