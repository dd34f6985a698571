pub mod aln2counts;
