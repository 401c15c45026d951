use serde::{Deserialize, Serialize};

/// Cpu and memory amounts of a cluster or of a replica request. Cpu is in cores, memory in GiB.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RuntimeResources {
    pub cpu: f64,
    pub mem: f64,
}

impl RuntimeResources {
    pub fn new(cpu: f64, mem: f64) -> Self {
        Self { cpu, mem }
    }

    /// Resources of `count` identical replicas.
    pub fn times(&self, count: u32) -> Self {
        Self {
            cpu: self.cpu * count as f64,
            mem: self.mem * count as f64,
        }
    }

    pub fn negated(&self) -> Self {
        Self {
            cpu: -self.cpu,
            mem: -self.mem,
        }
    }

    /// How many whole replicas of `per_replica` fit into these resources (fractional).
    pub fn replica_factor(&self, per_replica: &RuntimeResources) -> f64 {
        f64::min(self.cpu / per_replica.cpu, self.mem / per_replica.mem)
    }
}
