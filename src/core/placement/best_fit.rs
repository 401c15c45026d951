//! Best-fit split placing replicas one by one into the cluster with the least slack left.

use crate::core::common::RuntimeResources;
use crate::core::placement::interface::SplitAlgorithm;

pub struct BestFitOneByOne {}

impl SplitAlgorithm for BestFitOneByOne {
    fn split(
        &self,
        num_replicas: u32,
        replica_request: &RuntimeResources,
        free: &[RuntimeResources],
    ) -> Vec<u32> {
        let mut distribution = vec![0u32; free.len()];
        // Tentative view, every placed replica is reserved before the next one is placed.
        let mut free = free.to_vec();

        for _ in 0..num_replicas {
            let mut clusters: Vec<usize> = (0..free.len()).collect();
            clusters.sort_by(|&a, &b| free[a].cpu.total_cmp(&free[b].cpu));

            let mut best_fit: Option<(usize, f64)> = None;
            for idx in clusters {
                if free[idx].cpu < replica_request.cpu || free[idx].mem < replica_request.mem {
                    continue;
                }
                let space = (free[idx].cpu - replica_request.cpu) + (free[idx].mem - replica_request.mem);
                if best_fit.map_or(true, |(_, best_space)| space < best_space) {
                    best_fit = Some((idx, space));
                }
            }

            if let Some((idx, _)) = best_fit {
                distribution[idx] += 1;
                free[idx].cpu -= replica_request.cpu;
                free[idx].mem -= replica_request.mem;
            }
        }

        distribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(resources: &[(f64, f64)]) -> Vec<RuntimeResources> {
        resources
            .iter()
            .map(|&(cpu, mem)| RuntimeResources::new(cpu, mem))
            .collect()
    }

    #[test]
    fn test_tightest_cluster_is_filled_first() {
        // slack: 3.0, 11.0, 39.0 -> cluster 0 keeps winning until it is exhausted
        let distribution = BestFitOneByOne {}.split(
            3,
            &RuntimeResources::new(0.5, 0.5),
            &free(&[(2.0, 2.0), (4.0, 8.0), (8.0, 32.0)]),
        );
        assert_eq!(vec![3, 0, 0], distribution);
    }

    #[test]
    fn test_reservations_are_seen_by_next_replicas() {
        let distribution = BestFitOneByOne {}.split(
            4,
            &RuntimeResources::new(0.5, 0.5),
            &free(&[(1.0, 1.0), (4.0, 8.0)]),
        );
        assert_eq!(vec![2, 2], distribution);
    }

    #[test]
    fn test_replicas_without_room_stay_unplaced() {
        let distribution = BestFitOneByOne {}.split(
            2,
            &RuntimeResources::new(0.5, 0.5),
            &free(&[(0.4, 4.0), (0.6, 0.6)]),
        );
        assert_eq!(vec![0, 1], distribution);
    }
}
