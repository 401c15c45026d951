//! Config fields definitions for multi-cluster placement simulation

use serde::Deserialize;

use crate::core::cluster::ClusterTier;
use crate::core::reward::RewardFunction;
use crate::error::{GymError, GymResult};
use crate::metrics::printer::MetricsPrinterConfig;
use crate::trace::catalog::{default_deployment_catalog, DeploymentBlueprint};

fn default_seed() -> u64 {
    42
}

fn default_num_clusters() -> usize {
    4
}

fn default_arrival_rate() -> f64 {
    100.0
}

fn default_call_duration() -> f64 {
    1.0
}

fn default_episode_length() -> u64 {
    100
}

fn default_min_replicas() -> u32 {
    1
}

fn default_max_replicas() -> u32 {
    8
}

fn default_latency_weight() -> f64 {
    0.6
}

fn default_cost_weight() -> f64 {
    0.2
}

fn default_gini_weight() -> f64 {
    0.2
}

fn default_capacity_threshold() -> f64 {
    0.95
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    1000.0
}

fn default_initial_allocation_ratio() -> f64 {
    0.2
}

pub fn default_cluster_tiers() -> Vec<ClusterTier> {
    vec![
        ClusterTier::new("edge_tier_1", 2.0, 2.0, 1.0),
        ClusterTier::new("edge_tier_2", 2.0, 4.0, 2.0),
        ClusterTier::new("fog_tier_1", 2.0, 8.0, 4.0),
        ClusterTier::new("fog_tier_2", 4.0, 16.0, 8.0),
        ClusterTier::new("cloud", 8.0, 32.0, 16.0),
    ]
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub sim_name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,
    /// Rate of the exponential inter-arrival distribution, requests per time unit.
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,
    /// Mean of the exponential request duration.
    #[serde(default = "default_call_duration")]
    pub call_duration: f64,
    /// Number of steps after which an episode is done.
    #[serde(default = "default_episode_length")]
    pub episode_length: u64,
    #[serde(default = "default_min_replicas")]
    pub min_replicas: u32,
    #[serde(default = "default_max_replicas")]
    pub max_replicas: u32,
    #[serde(default)]
    pub reward_function: RewardFunction,
    // Weights of the multi-objective reward, they do not have to sum up to 1.
    #[serde(default = "default_latency_weight")]
    pub latency_weight: f64,
    #[serde(default = "default_cost_weight")]
    pub cost_weight: f64,
    #[serde(default = "default_gini_weight")]
    pub gini_weight: f64,
    /// Share of cluster capacity which may be allocated.
    #[serde(default = "default_capacity_threshold")]
    pub capacity_threshold: f64,
    // Bounds of pairwise latency between clusters, in milliseconds.
    #[serde(default = "default_min_delay")]
    pub min_delay: f64,
    #[serde(default = "default_max_delay")]
    pub max_delay: f64,
    /// Upper bound of the random initial allocation as a share of capacity.
    #[serde(default = "default_initial_allocation_ratio")]
    pub initial_allocation_ratio: f64,
    #[serde(default = "default_cluster_tiers")]
    pub cluster_tiers: Vec<ClusterTier>,
    #[serde(default = "default_deployment_catalog")]
    pub deployment_catalog: Vec<DeploymentBlueprint>,
    /// CSV file where a summary row is appended after every episode.
    pub results_file: Option<String>,
    /// If not set default output of logs is stdout/stderr
    pub logs_filepath: Option<String>,
    pub metrics_printer: Option<MetricsPrinterConfig>,
}

impl SimulationConfig {
    pub fn from_yaml(yaml: &str) -> GymResult<Self> {
        let config = serde_yaml::from_str::<SimulationConfig>(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GymResult<()> {
        let invalid = |reason: String| Err(GymError::InvalidConfig(reason));

        if self.num_clusters == 0 {
            return invalid("num_clusters must be positive".to_string());
        }
        if !(self.arrival_rate > 0.0) {
            return invalid(format!("arrival_rate must be positive, got {}", self.arrival_rate));
        }
        if !(self.call_duration > 0.0) {
            return invalid(format!("call_duration must be positive, got {}", self.call_duration));
        }
        if self.episode_length == 0 {
            return invalid("episode_length must be positive".to_string());
        }
        if self.min_replicas == 0 || self.min_replicas > self.max_replicas {
            return invalid(format!(
                "replicas bounds must satisfy 1 <= min <= max, got [{}, {}]",
                self.min_replicas, self.max_replicas
            ));
        }
        if self.latency_weight < 0.0 || self.cost_weight < 0.0 || self.gini_weight < 0.0 {
            return invalid("reward weights must be non-negative".to_string());
        }
        if !(self.capacity_threshold > 0.0 && self.capacity_threshold <= 1.0) {
            return invalid(format!(
                "capacity_threshold must be in (0, 1], got {}",
                self.capacity_threshold
            ));
        }
        if !(self.min_delay < self.max_delay) || self.min_delay < 0.0 {
            return invalid(format!(
                "delay bounds must satisfy 0 <= min < max, got [{}, {}]",
                self.min_delay, self.max_delay
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_allocation_ratio) {
            return invalid(format!(
                "initial_allocation_ratio must be in [0, 1], got {}",
                self.initial_allocation_ratio
            ));
        }
        if self.cluster_tiers.is_empty() {
            return invalid("cluster_tiers must not be empty".to_string());
        }
        for tier in self.cluster_tiers.iter() {
            if !(tier.cpu > 0.0 && tier.mem > 0.0) {
                return invalid(format!("tier {} must have positive capacity", tier.name));
            }
        }
        if self.deployment_catalog.is_empty() {
            return invalid("deployment_catalog must not be empty".to_string());
        }
        for blueprint in self.deployment_catalog.iter() {
            if !(blueprint.cpu_request > 0.0 && blueprint.memory_request > 0.0) {
                return invalid(format!(
                    "blueprint {} must request positive resources",
                    blueprint.name
                ));
            }
        }
        Ok(())
    }

    /// Minimal and maximal tier cost, bounds of cost normalization.
    pub fn cost_bounds(&self) -> (f64, f64) {
        let min = self
            .cluster_tiers
            .iter()
            .map(|tier| tier.cost)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .cluster_tiers
            .iter()
            .map(|tier| tier.cost)
            .fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }
}
