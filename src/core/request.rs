//! Type definition for a replicated deployment request and its placement outcome.

use serde::Serialize;

use crate::core::common::RuntimeResources;

/// Stable identifier of a request, used as a key in the event timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Placement {
    /// All replicas run on one cluster.
    Whole { cluster: usize },
    /// Replica count per cluster, indexed by cluster.
    Split { distribution: Vec<u32> },
}

impl Placement {
    /// Replicas hosted by every cluster with a nonzero share.
    pub fn shares(&self, replicas: u32) -> Vec<(usize, u32)> {
        match self {
            Placement::Whole { cluster } => vec![(*cluster, replicas)],
            Placement::Split { distribution } => distribution
                .iter()
                .enumerate()
                .filter(|(_, &count)| count > 0)
                .map(|(cluster, &count)| (cluster, count))
                .collect(),
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Placement::Split { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeploymentRequest {
    pub id: RequestId,
    /// Name of the blueprint this request was drawn from.
    pub name: String,
    pub num_replicas: u32,
    /// Resources requested by one replica.
    pub replica_request: RuntimeResources,
    pub latency_threshold: f64,

    pub arrival_time: f64,
    pub departure_time: f64,

    /// None until the request is admitted.
    pub placement: Option<Placement>,
    // Frozen at placement time.
    pub expected_latency: f64,
    pub expected_cost: f64,
}

impl DeploymentRequest {
    pub fn new(
        id: RequestId,
        name: String,
        num_replicas: u32,
        replica_request: RuntimeResources,
        latency_threshold: f64,
        arrival_time: f64,
        departure_time: f64,
    ) -> Self {
        Self {
            id,
            name,
            num_replicas,
            replica_request,
            latency_threshold,
            arrival_time,
            departure_time,
            placement: None,
            expected_latency: 0.0,
            expected_cost: 0.0,
        }
    }

    /// Resources of all replicas together.
    pub fn total_request(&self) -> RuntimeResources {
        self.replica_request.times(self.num_replicas)
    }

    pub fn is_split(&self) -> bool {
        self.placement.as_ref().map_or(false, Placement::is_split)
    }
}
