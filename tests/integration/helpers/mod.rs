//! Helper utilities for integration tests.

pub mod bam_writer;
pub mod scenarios;

pub use bam_writer::*;
pub use scenarios::*;
