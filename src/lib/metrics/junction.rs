//! Junction rows.

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::junction::{JunctionData, RemoteJunction};

/// One retained junction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionRecord {
    pub chromosome: String,
    pub position: u32,
    /// `1` forward, `-1` reverse.
    pub orientation: i8,
    pub junction_frags: usize,
    pub exact_support_frags: usize,
    pub candidate_support_frags: usize,
    pub hotspot: bool,
    pub internal_indel: bool,
    pub discordant_group: bool,
    /// Name of the representative read, empty when there is none.
    pub top_read: String,
    /// Remote breakends as `chromosome:position:orientation:count`, `;` separated.
    pub remote_junctions: String,
}

impl Metric for JunctionRecord {
    fn metric_name() -> &'static str {
        "junction"
    }
}

fn format_remote(remote: &RemoteJunction) -> String {
    format!("{}:{}:{}:{}", remote.chromosome, remote.position, remote.orientation, remote.fragment_count)
}

impl From<&JunctionData> for JunctionRecord {
    fn from(data: &JunctionData) -> Self {
        Self {
            chromosome: data.chromosome.clone(),
            position: data.position,
            orientation: data.orientation.as_i8(),
            junction_frags: data.junction_fragments.len(),
            exact_support_frags: data.exact_support_fragments.len(),
            candidate_support_frags: data.candidate_support_fragments.len(),
            hotspot: data.hotspot,
            internal_indel: data.internal_indel,
            discordant_group: data.discordant_group,
            top_read: data.top_read().map(|r| r.id.clone()).unwrap_or_default(),
            remote_junctions: data.remote_junctions.iter().map(format_remote).collect::<Vec<_>>().join(";"),
        }
    }
}
