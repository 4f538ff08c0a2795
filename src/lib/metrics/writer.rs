//! TSV writing for output rows.

use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::Serialize;

use super::Metric;

/// Writes rows to a TSV file with a header line.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(path: P, metrics: &[T], description: &str) -> Result<()> {
    let path = path.as_ref();
    DelimFile::default()
        .write_tsv(path, metrics)
        .with_context(|| format!("Failed to write {description} metrics: {}", path.display()))
}

/// [`write_metrics`] using the row type's own name in messages.
pub fn write_metrics_auto<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    write_metrics(path, metrics, T::metric_name())
}
