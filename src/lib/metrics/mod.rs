//! Output rows and TSV writing.
//!
//! - [`junction`] - One row per retained junction
//! - [`writer`] - TSV file writing
//!
//! Other row types live next to the counters they report:
//! [`DiscordantStats`](crate::discordant::DiscordantStats),
//! [`ScanSummaryMetric`](crate::stats::ScanSummaryMetric) and
//! [`FragmentLengthMetric`](crate::fragment_length::FragmentLengthMetric).

pub mod junction;
pub mod writer;

use serde::{Deserialize, Serialize};

use crate::discordant::DiscordantStats;
use crate::fragment_length::FragmentLengthMetric;
use crate::stats::ScanSummaryMetric;

pub use junction::JunctionRecord;
pub use writer::{write_metrics, write_metrics_auto};

/// A row type written to a TSV file.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Name used in log and error messages.
    fn metric_name() -> &'static str;
}

impl Metric for DiscordantStats {
    fn metric_name() -> &'static str {
        "discordant"
    }
}

impl Metric for ScanSummaryMetric {
    fn metric_name() -> &'static str {
        "scan summary"
    }
}

impl Metric for FragmentLengthMetric {
    fn metric_name() -> &'static str {
        "fragment length"
    }
}
