//! Integration tests for svprep.
//!
//! These tests drive whole scans across partitions and workers, through both in-memory
//! sources and indexed BAM files, and run the `svprep` binary end to end.

mod helpers;
mod test_discordant_groups;
mod test_remote_merge;
mod test_scan_command;
mod test_scan_pipeline;
mod test_spanning_permutations;
