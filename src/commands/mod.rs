//! CLI command implementations for svprep.
//!
//! - [`scan`] - Collect junction and discordant-pair evidence from a BAM file

#![allow(clippy::missing_errors_doc, clippy::must_use_candidate, clippy::cast_possible_truncation)]

pub mod command;
pub mod common;
pub mod scan;
