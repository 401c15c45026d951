//! First-fit-decreasing split: clusters are visited in order of decreasing free cpu and
//! receive batches of replicas.

use crate::core::common::RuntimeResources;
use crate::core::placement::interface::SplitAlgorithm;

pub struct FirstFitDecreasing {}

impl FirstFitDecreasing {
    /// Batch size: how many replicas the least free cluster could host alone, rounded up and
    /// kept below the request size so at least two clusters get replicas.
    fn min_factor(num_replicas: u32, replica_request: &RuntimeResources, free: &[RuntimeResources]) -> u32 {
        let min_split = free
            .iter()
            .map(|resources| resources.replica_factor(replica_request))
            .fold(f64::INFINITY, f64::min);
        let min_factor = f64::max(min_split.ceil(), 0.0) as u32;
        if min_factor >= num_replicas {
            num_replicas - 1
        } else {
            min_factor
        }
    }
}

impl SplitAlgorithm for FirstFitDecreasing {
    fn split(
        &self,
        num_replicas: u32,
        replica_request: &RuntimeResources,
        free: &[RuntimeResources],
    ) -> Vec<u32> {
        let mut distribution = vec![0u32; free.len()];
        if free.is_empty() || num_replicas == 0 {
            return distribution;
        }

        let min_factor = Self::min_factor(num_replicas, replica_request, free);
        let batch = replica_request.times(min_factor);

        // Stable sort keeps index order among clusters with equal free cpu.
        let mut clusters: Vec<usize> = (0..free.len()).collect();
        clusters.sort_by(|&a, &b| free[b].cpu.total_cmp(&free[a].cpu));

        let mut remaining = num_replicas;
        for idx in clusters {
            if remaining == 0 {
                break;
            }
            // a zero batch places nothing here, the second pass handles single replicas
            if min_factor < remaining
                && batch.cpu < free[idx].cpu
                && batch.mem < free[idx].mem
            {
                distribution[idx] += min_factor;
                remaining -= min_factor;
            } else if replica_request.cpu < free[idx].cpu && replica_request.mem < free[idx].mem {
                distribution[idx] += 1;
                remaining -= 1;
            }
        }

        // Best-effort pass for the rest, one replica per cluster in index order.
        for idx in 0..free.len() {
            if remaining == 0 {
                break;
            }
            let reserved = replica_request.times(distribution[idx]);
            let left = RuntimeResources::new(free[idx].cpu - reserved.cpu, free[idx].mem - reserved.mem);
            if replica_request.cpu < left.cpu && replica_request.mem < left.mem {
                distribution[idx] += 1;
                remaining -= 1;
            }
        }

        distribution
    }
}
