//! Numeric snapshot of the fleet and the pending request, and the action mask.

use serde::Serialize;

use crate::core::action::{Action, SPLIT_ACTIONS};
use crate::core::fleet::FleetState;
use crate::core::request::DeploymentRequest;

pub const NUM_CLUSTER_METRICS: usize = 5;
pub const NUM_REQUEST_METRICS: usize = 5;
/// Value of cluster metrics in rows of non-cluster actions.
pub const PADDING_VALUE: f64 = -1.0;

/// One row per action: `[allocated_cpu, cpu_capacity, allocated_mem, mem_capacity,
/// mean_latency, num_replicas, cpu_request, mem_request, latency_threshold, inter_arrival]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub rows: Vec<[f64; NUM_CLUSTER_METRICS + NUM_REQUEST_METRICS]>,
}

impl Observation {
    pub fn build(fleet: &FleetState, request: &DeploymentRequest, inter_arrival: f64) -> Self {
        let request_metrics = [
            request.num_replicas as f64,
            request.replica_request.cpu,
            request.replica_request.mem,
            request.latency_threshold,
            inter_arrival,
        ];

        let action_count = Action::count(fleet.cluster_count());
        let mut rows = Vec::with_capacity(action_count);
        for idx in 0..action_count {
            let cluster_metrics = if idx < fleet.cluster_count() {
                let cluster = fleet.cluster(idx);
                [
                    cluster.allocated().cpu,
                    cluster.capacity.cpu,
                    cluster.allocated().mem,
                    cluster.capacity.mem,
                    fleet.latency().mean_latency(idx),
                ]
            } else {
                [PADDING_VALUE; NUM_CLUSTER_METRICS]
            };

            let mut row = [0.0; NUM_CLUSTER_METRICS + NUM_REQUEST_METRICS];
            row[..NUM_CLUSTER_METRICS].copy_from_slice(&cluster_metrics);
            row[NUM_CLUSTER_METRICS..].copy_from_slice(&request_metrics);
            rows.push(row);
        }
        Self { rows }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), NUM_CLUSTER_METRICS + NUM_REQUEST_METRICS)
    }

    /// Row-major flat copy.
    pub fn flatten(&self) -> Vec<f64> {
        self.rows.iter().flat_map(|row| row.iter().copied()).collect()
    }
}

/// Whole placement to a cluster is masked out when the request does not fit there, split
/// actions and reject are always allowed.
pub fn action_mask(fleet: &FleetState, request: &DeploymentRequest) -> Vec<bool> {
    let total = request.total_request();
    let mut mask: Vec<bool> = (0..fleet.cluster_count())
        .map(|idx| fleet.can_fit(idx, &total))
        .collect();
    mask.extend(std::iter::repeat(true).take(SPLIT_ACTIONS.len() + 1));
    mask
}
