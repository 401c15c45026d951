//! Episode summary rows and their persistence to a CSV results file.

use std::fs::OpenOptions;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GymError;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u64,
    pub reward: f64,
    pub ep_block_prob: f64,
    pub ep_accepted_requests: u64,
    pub ep_rejected_requests: u64,
    pub ep_deploy_all: u64,
    pub ep_ffd: u64,
    pub ep_ffi: u64,
    pub ep_bf1b1: u64,
    pub avg_latency: f64,
    pub avg_cost: f64,
    pub avg_cpu_cluster_selected: f64,
    pub gini: f64,
    /// Wall-clock duration of the episode in seconds.
    pub execution_time: f64,
}

/// Appends `summary` to the CSV file at `path`, the header is written only into a new file.
pub fn append_summary<P: AsRef<Path>>(path: P, summary: &EpisodeSummary) -> Result<(), GymError> {
    let path = path.as_ref();
    let write_header = match std::fs::metadata(path) {
        Ok(metadata) => metadata.len() == 0,
        Err(_) => true,
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    writer.serialize(summary)?;
    writer.flush()?;
    Ok(())
}
