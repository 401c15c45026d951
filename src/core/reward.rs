//! Reward functions which turn the outcome of a step into a scalar signal.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RewardFunction {
    #[default]
    Naive,
    /// Weighted sum of inverted normalized latency, cost and load imbalance.
    Multi,
    Latency,
    Cost,
}

/// What the reward engine needs to know about the step just taken.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// The action was blocked or was an explicit reject.
    Penalized {
        /// No single cluster could host the whole request, rejection was unavoidable.
        fleet_full: bool,
    },
    Placed {
        expected_latency: f64,
        expected_cost: f64,
        latency_threshold: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RewardEngine {
    pub function: RewardFunction,
    pub latency_weight: f64,
    pub cost_weight: f64,
    pub gini_weight: f64,
    pub min_delay: f64,
    pub max_delay: f64,
    pub min_cost: f64,
    pub max_cost: f64,
}

impl RewardEngine {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let (min_cost, max_cost) = config.cost_bounds();
        Self {
            function: config.reward_function,
            latency_weight: config.latency_weight,
            cost_weight: config.cost_weight,
            gini_weight: config.gini_weight,
            min_delay: config.min_delay,
            max_delay: config.max_delay,
            min_cost,
            max_cost,
        }
    }

    /// Computes the reward of a step. `load_served` holds cumulative replicas served per cluster.
    pub fn reward(&self, outcome: &StepOutcome, load_served: &[f64]) -> f64 {
        match *outcome {
            StepOutcome::Penalized { fleet_full } => self.penalty(fleet_full),
            StepOutcome::Placed {
                expected_latency,
                expected_cost,
                latency_threshold,
            } => match self.function {
                RewardFunction::Naive => 1.0,
                RewardFunction::Multi => {
                    let gini = gini(load_served);
                    let latency = normalize(expected_latency, self.min_delay, self.max_delay);
                    let cost = normalize(expected_cost, self.min_cost, self.max_cost);
                    let reward = self.latency_weight * (1.0 - latency)
                        + self.cost_weight * (1.0 - cost)
                        + self.gini_weight * (1.0 - gini);
                    debug!(
                        "Multi reward | latency norm: {:.3} | cost norm: {:.3} | gini: {:.3} | reward: {:.3}",
                        latency, cost, gini, reward
                    );
                    reward
                }
                RewardFunction::Latency => {
                    if expected_latency < latency_threshold {
                        1.0
                    } else {
                        -1.0
                    }
                }
                RewardFunction::Cost => self.max_cost - expected_cost,
            },
        }
    }

    fn penalty(&self, fleet_full: bool) -> f64 {
        if !fleet_full {
            debug!("Penalized while resources were available");
            return -1.0;
        }
        match self.function {
            RewardFunction::Cost => self.max_cost - self.min_cost,
            _ => 1.0,
        }
    }
}

/// Min-max normalization clamped to `[0, 1]`.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Gini coefficient by mean absolute difference, 0 for an all-zero or empty vector.
pub fn gini(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return 0.0;
    }
    let mut absolute_difference = 0.0;
    for x in values {
        for y in values {
            absolute_difference += (x - y).abs();
        }
    }
    absolute_difference / (2.0 * values.len() as f64 * total)
}
