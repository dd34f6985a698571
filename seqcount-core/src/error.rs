use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeqError {
    #[error("invalid character '{ch}' at position {pos}")]
    InvalidChar { ch: char, pos: usize },

    #[error("invalid scoring parameters: {msg}")]
    InvalidScoring { msg: String },

    #[error("invalid configuration: {msg}")]
    InvalidConfig { msg: String },

    #[error("fasta format error at line {line}: {msg}")]
    FastaFormat { msg: &'static str, line: usize },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown reference '{name}'")]
    UnknownReference { name: String },

    #[error("csv missing column '{name}' in {path}. headers: {headers:?}")]
    CsvMissingColumn {
        name: String,
        headers: Vec<String>,
        path: String,
    },

    #[error("csv missing field at row {row} for column {column} in {path}")]
    CsvMissingField {
        row: usize,
        column: String,
        path: String,
    },

    #[error("csv invalid integer '{value}' at row {row} for column {column} in {path}")]
    CsvInvalidInteger {
        row: usize,
        column: String,
        value: String,
        path: String,
    },

    #[error("csv parse error in {path}: {source}")]
    CsvParse {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("csv write error: {0}")]
    CsvWrite(#[from] csv::Error),
}

pub type SeqResult<T> = Result<T, SeqError>;
