//! Pairwise latency model between clusters which reacts to placements and departures.

use dslab_core::Simulation;
use log::debug;

/// Latency growth for a placement of a whole request to one cluster.
pub const WHOLE_PLACEMENT_INCREASE_FACTOR: f64 = 1.15;
/// Latency growth per involved cluster for a split placement.
pub const SPLIT_PLACEMENT_INCREASE_FACTOR: f64 = 1.05;
/// Latency decay on departure of a whole placement.
pub const WHOLE_DEPARTURE_DECREASE_FACTOR: f64 = 1.15;
/// Latency decay per involved cluster on departure of a split placement.
pub const SPLIT_DEPARTURE_DECREASE_FACTOR: f64 = 1.10;

/// Symmetric latency matrix with zero diagonal. Off-diagonal entries stay in
/// `[min_delay, max_delay]`.
#[derive(Clone, Debug, PartialEq)]
pub struct LatencyMatrix {
    matrix: Vec<Vec<f64>>,
    mean_latency: Vec<f64>,
    min_delay: f64,
    max_delay: f64,
}

impl LatencyMatrix {
    /// Builds a matrix from explicit values. Diagonal is forced to 0, the upper triangle is
    /// mirrored to the lower one and clamped to bounds.
    pub fn from_rows(rows: Vec<Vec<f64>>, min_delay: f64, max_delay: f64) -> Self {
        let n = rows.len();
        let mut matrix = rows;
        for i in 0..n {
            matrix[i][i] = 0.0;
            for j in (i + 1)..n {
                let value = matrix[i][j].clamp(min_delay, max_delay);
                matrix[i][j] = value;
                matrix[j][i] = value;
            }
        }
        let mut latency = Self {
            matrix,
            mean_latency: vec![0.0; n],
            min_delay,
            max_delay,
        };
        latency.update_mean_latency();
        latency
    }

    /// Draws independent integer latencies in `[min_delay, max_delay]` for every distinct pair.
    pub fn random(cluster_count: usize, min_delay: f64, max_delay: f64, sim: &mut Simulation) -> Self {
        let low = min_delay.ceil() as u64;
        let high = u64::max(max_delay.floor() as u64, low);
        let mut rows = vec![vec![0.0; cluster_count]; cluster_count];
        for i in 0..cluster_count {
            for j in (i + 1)..cluster_count {
                rows[i][j] = sim.gen_range(low..=high) as f64;
            }
        }
        Self::from_rows(rows, min_delay, max_delay)
    }

    pub fn cluster_count(&self) -> usize {
        self.matrix.len()
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.matrix[from][to]
    }

    pub fn row(&self, cluster: usize) -> &[f64] {
        &self.matrix[cluster]
    }

    /// Mean of the cluster's latency row (diagonal zero included).
    pub fn mean_latency(&self, cluster: usize) -> f64 {
        self.mean_latency[cluster]
    }

    pub fn mean_latencies(&self) -> &[f64] {
        &self.mean_latency
    }

    pub fn increase(&mut self, cluster: usize, factor: f64) {
        self.scale_row(cluster, |latency| latency * factor);
    }

    pub fn decrease(&mut self, cluster: usize, factor: f64) {
        self.scale_row(cluster, |latency| latency / factor);
    }

    fn scale_row<F: Fn(f64) -> f64>(&mut self, cluster: usize, scale: F) {
        let previous = self.mean_latency[cluster];
        for other in 0..self.matrix.len() {
            if other == cluster {
                self.matrix[cluster][other] = 0.0;
                continue;
            }
            let value = scale(self.matrix[cluster][other]).clamp(self.min_delay, self.max_delay);
            self.matrix[cluster][other] = value;
            self.matrix[other][cluster] = value;
        }
        // Mirrored entries change every other row too.
        self.update_mean_latency();
        debug!(
            "Cluster {} mean latency: {:.2} -> {:.2}",
            cluster,
            previous,
            self.mean_latency[cluster]
        );
    }

    fn update_mean_latency(&mut self) {
        for (row, mean) in self.matrix.iter().zip(self.mean_latency.iter_mut()) {
            *mean = if row.is_empty() {
                0.0
            } else {
                row.iter().sum::<f64>() / row.len() as f64
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_symmetric_with_zero_diagonal(latency: &LatencyMatrix) {
        let n = latency.cluster_count();
        for i in 0..n {
            assert_eq!(0.0, latency.get(i, i));
            for j in 0..n {
                assert_eq!(latency.get(i, j), latency.get(j, i));
            }
        }
    }

    #[test]
    fn test_from_rows_mirrors_upper_triangle() {
        let latency = LatencyMatrix::from_rows(
            vec![
                vec![5.0, 10.0, 20.0],
                vec![0.0, 7.0, 30.0],
                vec![0.0, 0.0, 9.0],
            ],
            1.0,
            1000.0,
        );
        assert_symmetric_with_zero_diagonal(&latency);
        assert_eq!(10.0, latency.get(1, 0));
        assert_eq!(10.0, latency.mean_latency(0));
        assert_eq!(40.0 / 3.0, latency.mean_latency(1));
        assert_eq!(50.0 / 3.0, latency.mean_latency(2));
    }

    #[test]
    fn test_increase_and_decrease_are_mirrored() {
        let mut latency = LatencyMatrix::from_rows(
            vec![vec![0.0, 100.0, 200.0], vec![0.0, 0.0, 50.0], vec![0.0; 3]],
            1.0,
            1000.0,
        );
        latency.increase(0, 1.5);
        assert_eq!(150.0, latency.get(0, 1));
        assert_eq!(300.0, latency.get(2, 0));
        // row 1 <-> 2 is untouched
        assert_eq!(50.0, latency.get(1, 2));
        assert_eq!(150.0, latency.mean_latency(0));
        assert_eq!(200.0 / 3.0, latency.mean_latency(1));
        assert_symmetric_with_zero_diagonal(&latency);

        latency.decrease(0, 1.5);
        assert!((latency.get(0, 1) - 100.0).abs() < 1e-9);
        assert!((latency.get(0, 2) - 200.0).abs() < 1e-9);
        assert_symmetric_with_zero_diagonal(&latency);
    }

    #[test]
    fn test_latency_is_clamped_to_bounds() {
        let mut latency =
            LatencyMatrix::from_rows(vec![vec![0.0, 900.0], vec![0.0, 0.0]], 1.0, 1000.0);
        latency.increase(0, 1.15);
        assert_eq!(1000.0, latency.get(0, 1));
        assert_eq!(1000.0, latency.get(1, 0));

        let mut latency = LatencyMatrix::from_rows(vec![vec![0.0, 1.1], vec![0.0, 0.0]], 1.0, 1000.0);
        latency.decrease(1, 1.15);
        assert_eq!(1.0, latency.get(0, 1));
        assert_eq!(0.0, latency.get(1, 1));
    }

    #[test]
    fn test_random_matrix_is_within_bounds() {
        let mut sim = Simulation::new(123);
        let latency = LatencyMatrix::random(6, 1.0, 1000.0, &mut sim);
        assert_symmetric_with_zero_diagonal(&latency);
        for i in 0..6 {
            for j in 0..6 {
                if i != j {
                    let value = latency.get(i, j);
                    assert!((1.0..=1000.0).contains(&value));
                    assert_eq!(value, value.round());
                }
            }
        }
    }
}
