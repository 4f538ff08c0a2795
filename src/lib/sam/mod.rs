//! Alignment record conversion.
//!
//! - [`record`] converts noodles records into the flat [`record::AlignmentRecord`] used by
//!   the scanner
//! - [`record_utils`] holds CIGAR parsing and summary helpers
//! - [`builder`] builds records for tests and benchmarks

pub mod builder;
pub mod record;
pub mod record_utils;
