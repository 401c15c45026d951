use serde::Serialize;

use crate::core::common::RuntimeResources;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SplitStrategy {
    FirstFitDecreasing,
    BestFitOneByOne,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlacementError {
    /// Whole placement would push the cluster over the capacity threshold.
    ClusterFull(usize),
    /// A single replica cannot be split.
    SingleReplicaSplit,
    /// Committing the split would overcommit this cluster.
    SplitOvercommitted(usize),
    /// The split algorithm placed fewer replicas than requested.
    SplitIncomplete { placed: u32, requested: u32 },
    RequestRejected,
    UnrecognizedAction(usize),
}

// Trait which any split heuristic implements.
pub trait SplitAlgorithm: Send + Sync {
    /// Computes replicas per cluster for `num_replicas` replicas of `replica_request` given the
    /// free resources of every cluster. The result may hold fewer replicas than requested when
    /// the fleet is saturated.
    fn split(
        &self,
        num_replicas: u32,
        replica_request: &RuntimeResources,
        free: &[RuntimeResources],
    ) -> Vec<u32>;
}
