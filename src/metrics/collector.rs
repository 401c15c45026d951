//! Implements storage for episode metrics. The simulation reports every step outcome here and
//! builds step infos and episode summaries from it.

use average::{concatenate, Estimate, Max, Mean, Min, Variance};

use crate::core::action::{Action, SplitAction};
use crate::core::placement::engine::PlacementReport;
use crate::core::reward::gini;

concatenate!(
    Estimator,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, population_variance]
);

#[derive(Debug, Default)]
pub struct EstimatorWrapper {
    estimator: Estimator,
    count: u64,
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("mean", &self.mean)
            .field("population_variance", &self.population_variance)
            .finish()
    }
}

impl EstimatorWrapper {
    pub fn new() -> Self {
        Self {
            estimator: Estimator::new(),
            count: 0,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.estimator.add(value);
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    // All statistics are 0 until the first value is added.

    pub fn min(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.estimator.min()
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.estimator.max()
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.estimator.mean()
    }

    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.estimator.population_variance()
    }
}

impl PartialEq for EstimatorWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.min() == other.min()
            && self.max() == other.max()
            && self.mean() == other.mean()
            && self.population_variance() == other.population_variance()
    }
}

/// Number of accepted placements per action kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionCounters {
    pub deploy_all: u64,
    pub ffd: u64,
    pub ffi: u64,
    pub bf1b1: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct MetricsCollector {
    /// The number of offered requests since the simulation was created.
    pub offered_requests: u64,
    /// The number of accepted requests since the simulation was created.
    pub accepted_requests: u64,
    /// The number of finished episodes.
    pub finished_episodes: u64,

    // Per episode metrics, cleared on reset.
    pub ep_accepted_requests: u64,
    pub ep_actions: ActionCounters,
    pub ep_total_reward: f64,
    /// Expected latency of accepted placements.
    pub ep_latency_stats: EstimatorWrapper,
    /// Expected cost of accepted placements.
    pub ep_cost_stats: EstimatorWrapper,
    /// Cpu utilization (percents) of the selected cluster(s) right after placement.
    pub ep_cpu_usage_stats: EstimatorWrapper,
    /// Replicas served by every cluster, input of the gini coefficient.
    pub ep_load_served: Vec<f64>,
}

impl MetricsCollector {
    pub fn new(num_clusters: usize) -> Self {
        Self {
            ep_load_served: vec![0.0; num_clusters],
            ..Default::default()
        }
    }

    pub fn reset_episode(&mut self) {
        self.ep_accepted_requests = 0;
        self.ep_actions = Default::default();
        self.ep_total_reward = 0.0;
        self.ep_latency_stats = EstimatorWrapper::new();
        self.ep_cost_stats = EstimatorWrapper::new();
        self.ep_cpu_usage_stats = EstimatorWrapper::new();
        self.ep_load_served.iter_mut().for_each(|load| *load = 0.0);
    }

    pub fn increment_offered(&mut self) {
        self.offered_requests += 1;
    }

    pub fn increment_accepted(&mut self, action: Action, num_replicas: u32, report: &PlacementReport) {
        self.accepted_requests += 1;
        self.ep_accepted_requests += 1;
        match action {
            Action::Whole(_) => self.ep_actions.deploy_all += 1,
            Action::Split(SplitAction::FirstFitDecreasing) => self.ep_actions.ffd += 1,
            Action::Split(SplitAction::FirstFitIncreasing) => self.ep_actions.ffi += 1,
            Action::Split(SplitAction::BestFitOneByOne) => self.ep_actions.bf1b1 += 1,
            Action::Reject | Action::Unrecognized(_) => {}
        }
        for (cluster, replicas) in report.placement.shares(num_replicas) {
            self.ep_load_served[cluster] += replicas as f64;
        }
        self.ep_latency_stats.add(report.expected_latency);
        self.ep_cost_stats.add(report.expected_cost);
        self.ep_cpu_usage_stats.add(report.cpu_usage_percentage);
    }

    pub fn add_reward(&mut self, reward: f64) {
        self.ep_total_reward += reward;
    }

    /// Share of all offered requests which were not accepted.
    pub fn block_prob(&self) -> f64 {
        if self.offered_requests == 0 {
            return 0.0;
        }
        1.0 - self.accepted_requests as f64 / self.offered_requests as f64
    }

    /// Share of the first `steps` requests of the episode which were not accepted.
    pub fn ep_block_prob(&self, steps: u64) -> f64 {
        if steps == 0 {
            return 0.0;
        }
        1.0 - self.ep_accepted_requests as f64 / steps as f64
    }

    pub fn gini(&self) -> f64 {
        gini(&self.ep_load_served)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::Placement;

    #[test]
    fn test_empty_estimator_reports_zeros() {
        let mut stats = EstimatorWrapper::new();
        assert_eq!(0, stats.count());
        assert_eq!(0.0, stats.mean());
        assert_eq!(0.0, stats.min());

        stats.add(2.0);
        stats.add(4.0);
        assert_eq!(2, stats.count());
        assert_eq!(3.0, stats.mean());
        assert_eq!(2.0, stats.min());
        assert_eq!(4.0, stats.max());
        assert_eq!(1.0, stats.population_variance());
    }

    #[test]
    fn test_accepted_placements_are_counted_per_action() {
        let mut collector = MetricsCollector::new(3);
        let whole = PlacementReport {
            placement: Placement::Whole { cluster: 2 },
            expected_latency: 100.0,
            expected_cost: 16.0,
            cpu_usage_percentage: 50.0,
        };
        let split = PlacementReport {
            placement: Placement::Split {
                distribution: vec![1, 0, 3],
            },
            expected_latency: 200.0,
            expected_cost: 4.0,
            cpu_usage_percentage: 30.0,
        };

        for _ in 0..4 {
            collector.increment_offered();
        }
        collector.increment_accepted(Action::Whole(2), 2, &whole);
        collector.increment_accepted(Action::Split(SplitAction::FirstFitIncreasing), 4, &split);

        assert_eq!(1, collector.ep_actions.deploy_all);
        assert_eq!(1, collector.ep_actions.ffi);
        assert_eq!(0, collector.ep_actions.ffd);
        assert_eq!(vec![1.0, 0.0, 5.0], collector.ep_load_served);
        assert_eq!(150.0, collector.ep_latency_stats.mean());
        assert_eq!(10.0, collector.ep_cost_stats.mean());
        assert_eq!(0.5, collector.block_prob());
        assert_eq!(0.0, collector.ep_block_prob(2));

        collector.reset_episode();
        assert_eq!(0, collector.ep_accepted_requests);
        assert_eq!(vec![0.0; 3], collector.ep_load_served);
        assert_eq!(0.0, collector.gini());
        // global counters survive episodes
        assert_eq!(2, collector.accepted_requests);
    }
}
