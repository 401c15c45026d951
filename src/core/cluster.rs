//! Type definitions for cluster tiers and per-cluster allocation state.

use serde::{Deserialize, Serialize};

use crate::core::common::RuntimeResources;

/// Fixed capacity/cost class of a cluster (edge, fog, cloud, ...).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ClusterTier {
    pub name: String,
    pub cpu: f64,
    pub mem: f64,
    pub cost: f64,
}

impl ClusterTier {
    pub fn new(name: &str, cpu: f64, mem: f64, cost: f64) -> Self {
        Self {
            name: name.to_string(),
            cpu,
            mem,
            cost,
        }
    }

    pub fn capacity(&self) -> RuntimeResources {
        RuntimeResources::new(self.cpu, self.mem)
    }
}

/// Rounding noise tolerated below zero allocation.
pub const ALLOCATION_EPS: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Index of the tier in the configured tier catalog.
    pub tier_id: usize,
    pub tier: ClusterTier,
    pub capacity: RuntimeResources,
    allocated: RuntimeResources,
    // Always equals capacity - allocated, recomputed on every mutation.
    free: RuntimeResources,
}

impl Cluster {
    pub fn new(tier_id: usize, tier: ClusterTier, allocated: RuntimeResources) -> Self {
        let capacity = tier.capacity();
        let mut cluster = Self {
            tier_id,
            tier,
            capacity,
            allocated,
            free: Default::default(),
        };
        cluster.update_free();
        cluster
    }

    pub fn allocated(&self) -> &RuntimeResources {
        &self.allocated
    }

    pub fn free(&self) -> &RuntimeResources {
        &self.free
    }

    pub fn cost(&self) -> f64 {
        self.tier.cost
    }

    /// Cpu utilization in percents.
    pub fn cpu_usage_percentage(&self) -> f64 {
        100.0 * self.allocated.cpu / self.capacity.cpu
    }

    /// Whether `delta` on top of current allocation stays within `threshold` share of capacity
    /// for both cpu and memory.
    pub fn can_fit(&self, delta: &RuntimeResources, threshold: f64) -> bool {
        self.allocated.cpu + delta.cpu <= threshold * self.capacity.cpu
            && self.allocated.mem + delta.mem <= threshold * self.capacity.mem
    }

    /// Applies a (possibly negative) delta without feasibility checks.
    pub(crate) fn apply(&mut self, delta: &RuntimeResources) {
        // Releases subtract the same amounts that were added, only rounding noise can go below 0.
        debug_assert!(
            self.allocated.cpu + delta.cpu >= -ALLOCATION_EPS
                && self.allocated.mem + delta.mem >= -ALLOCATION_EPS,
            "allocation of cluster with tier {} goes negative: {:?} + {:?}",
            self.tier.name,
            self.allocated,
            delta
        );
        self.allocated.cpu = f64::max(self.allocated.cpu + delta.cpu, 0.0);
        self.allocated.mem = f64::max(self.allocated.mem + delta.mem, 0.0);
        self.update_free();
    }

    fn update_free(&mut self) {
        self.free.cpu = self.capacity.cpu - self.allocated.cpu;
        self.free.mem = self.capacity.mem - self.allocated.mem;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fog_cluster(allocated: RuntimeResources) -> Cluster {
        Cluster::new(3, ClusterTier::new("fog_tier_2", 4.0, 16.0, 8.0), allocated)
    }

    #[test]
    fn test_free_resources_follow_allocation() {
        let mut cluster = fog_cluster(RuntimeResources::new(1.0, 2.0));
        assert_eq!(RuntimeResources::new(3.0, 14.0), *cluster.free());

        cluster.apply(&RuntimeResources::new(1.5, 4.0));
        assert_eq!(RuntimeResources::new(2.5, 6.0), *cluster.allocated());
        assert_eq!(RuntimeResources::new(1.5, 10.0), *cluster.free());

        cluster.apply(&RuntimeResources::new(-1.5, -4.0));
        assert_eq!(RuntimeResources::new(3.0, 14.0), *cluster.free());
    }

    #[test]
    fn test_can_fit_uses_threshold_not_hard_capacity() {
        let cluster = fog_cluster(RuntimeResources::new(0.0, 0.0));
        // 0.95 * 4 = 3.8 cpu
        assert!(cluster.can_fit(&RuntimeResources::new(3.8, 1.0), 0.95));
        assert!(!cluster.can_fit(&RuntimeResources::new(3.9, 1.0), 0.95));
        // 0.95 * 16 = 15.2 mem
        assert!(!cluster.can_fit(&RuntimeResources::new(1.0, 15.5), 0.95));
        assert!(cluster.can_fit(&RuntimeResources::new(4.0, 16.0), 1.0));
    }

    #[test]
    fn test_release_rounding_noise_is_clamped_to_zero() {
        let mut cluster = fog_cluster(RuntimeResources::new(0.1, 0.1));
        cluster.apply(&RuntimeResources::new(-0.1 - 1e-12, -0.1 - 1e-12));
        assert_eq!(0.0, cluster.allocated().cpu);
        assert_eq!(0.0, cluster.allocated().mem);
        assert_eq!(cluster.capacity, *cluster.free());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "goes negative")]
    fn test_release_of_unallocated_resources_panics() {
        let mut cluster = fog_cluster(RuntimeResources::new(0.1, 0.1));
        cluster.apply(&RuntimeResources::new(-0.1, -0.2));
    }
}
