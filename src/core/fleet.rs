//! Fleet state is the single owner of cluster allocation and of the latency matrix. Every
//! placement and departure goes through it.

use dslab_core::Simulation;
use log::{debug, info};

use crate::config::SimulationConfig;
use crate::core::cluster::{Cluster, ClusterTier};
use crate::core::common::RuntimeResources;
use crate::core::latency::{
    LatencyMatrix, SPLIT_DEPARTURE_DECREASE_FACTOR, WHOLE_DEPARTURE_DECREASE_FACTOR,
};
use crate::core::request::{DeploymentRequest, Placement};

#[derive(Clone, Debug)]
pub struct FleetState {
    clusters: Vec<Cluster>,
    latency: LatencyMatrix,
    /// Share of capacity which may be allocated, feasibility boundary for all placements.
    capacity_threshold: f64,
}

impl FleetState {
    pub fn new(clusters: Vec<Cluster>, latency: LatencyMatrix, capacity_threshold: f64) -> Self {
        assert_eq!(
            clusters.len(),
            latency.cluster_count(),
            "latency matrix size does not match cluster count"
        );
        Self {
            clusters,
            latency,
            capacity_threshold,
        }
    }

    /// Draws a fresh fleet: latency matrix, a uniformly random tier per cluster and a small
    /// random initial allocation.
    pub fn initialize(config: &SimulationConfig, sim: &mut Simulation) -> Self {
        let cluster_count = config.num_clusters;
        let latency =
            LatencyMatrix::random(cluster_count, config.min_delay, config.max_delay, sim);

        let tiers: &[ClusterTier] = &config.cluster_tiers;
        let tier_ids: Vec<usize> = (0..cluster_count)
            .map(|_| sim.gen_range(0..tiers.len()))
            .collect();
        let cpu_shares: Vec<f64> = (0..cluster_count)
            .map(|_| sim.rand() * config.initial_allocation_ratio)
            .collect();
        let mem_shares: Vec<f64> = (0..cluster_count)
            .map(|_| sim.rand() * config.initial_allocation_ratio)
            .collect();

        let mut clusters = Vec::with_capacity(cluster_count);
        for idx in 0..cluster_count {
            let tier = tiers[tier_ids[idx]].clone();
            let allocated = RuntimeResources::new(cpu_shares[idx] * tier.cpu, mem_shares[idx] * tier.mem);
            info!(
                "Cluster {} | tier: {} | cpu: {} | mem: {} | cost: {}",
                idx, tier.name, tier.cpu, tier.mem, tier.cost
            );
            clusters.push(Cluster::new(tier_ids[idx], tier, allocated));
        }

        Self::new(clusters, latency, config.capacity_threshold)
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, idx: usize) -> &Cluster {
        &self.clusters[idx]
    }

    pub fn latency(&self) -> &LatencyMatrix {
        &self.latency
    }

    pub fn latency_mut(&mut self) -> &mut LatencyMatrix {
        &mut self.latency
    }

    pub fn capacity_threshold(&self) -> f64 {
        self.capacity_threshold
    }

    pub fn free_resources(&self) -> Vec<RuntimeResources> {
        self.clusters.iter().map(|c| *c.free()).collect()
    }

    /// Whether allocating `delta` on cluster `idx` keeps it within the capacity threshold.
    pub fn can_fit(&self, idx: usize, delta: &RuntimeResources) -> bool {
        self.clusters[idx].can_fit(delta, self.capacity_threshold)
    }

    /// Mutates allocation of cluster `idx`. Does not check feasibility, callers check `can_fit`
    /// first.
    pub fn apply(&mut self, idx: usize, delta: &RuntimeResources) {
        self.clusters[idx].apply(delta);
    }

    /// True when no single cluster can host the whole request.
    pub fn is_full_for(&self, request: &DeploymentRequest) -> bool {
        let total = request.total_request();
        (0..self.clusters.len()).all(|idx| !self.can_fit(idx, &total))
    }

    /// Releases resources held by a departing request and decays latency of its clusters.
    pub fn release(&mut self, request: &DeploymentRequest) {
        let placement = match &request.placement {
            Some(placement) => placement,
            None => panic!("request {:?} was released without a placement", request.id),
        };
        let factor = match placement {
            Placement::Whole { .. } => WHOLE_DEPARTURE_DECREASE_FACTOR,
            Placement::Split { .. } => SPLIT_DEPARTURE_DECREASE_FACTOR,
        };
        for (cluster, replicas) in placement.shares(request.num_replicas) {
            self.apply(cluster, &request.replica_request.times(replicas).negated());
            self.latency.decrease(cluster, factor);
        }
        debug!(
            "Request {:?} ({}) departed at {:.4}, placement: {:?}",
            request.id, request.name, request.departure_time, placement
        );
    }
}
