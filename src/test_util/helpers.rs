use crate::config::SimulationConfig;
use crate::core::cluster::{Cluster, ClusterTier};
use crate::core::common::RuntimeResources;
use crate::core::fleet::FleetState;
use crate::core::latency::LatencyMatrix;

/// Latency between every pair of clusters built by `make_fleet`.
pub const TEST_FLEET_LATENCY: f64 = 100.0;

/// Parses the base test config with `with_suffix` YAML lines overriding its top-level keys.
pub fn default_test_simulation_config(with_suffix: Option<&str>) -> SimulationConfig {
    let default = r#"
sim_name: "test_multicluster"
seed: 123
num_clusters: 4
arrival_rate: 100.0
call_duration: 1.0
episode_length: 100
"#;

    let mut config: serde_yaml::Mapping = serde_yaml::from_str(default).unwrap();
    if let Some(suffix) = with_suffix {
        let overrides: serde_yaml::Mapping = serde_yaml::from_str(suffix).unwrap();
        for (key, value) in overrides {
            config.insert(key, value);
        }
    }

    SimulationConfig::from_yaml(&serde_yaml::to_string(&config).unwrap()).unwrap()
}

/// Builds an empty fleet with the given `(cpu, mem)` capacities, unit cost and constant
/// pairwise latency.
pub fn make_fleet(capacities: &[(f64, f64)]) -> FleetState {
    let clusters = capacities
        .iter()
        .enumerate()
        .map(|(idx, &(cpu, mem))| {
            Cluster::new(
                idx,
                ClusterTier::new(&format!("test_tier_{}", idx), cpu, mem, 1.0),
                RuntimeResources::new(0.0, 0.0),
            )
        })
        .collect();
    let n = capacities.len();
    let latency = LatencyMatrix::from_rows(vec![vec![TEST_FLEET_LATENCY; n]; n], 1.0, 1000.0);
    FleetState::new(clusters, latency, 0.95)
}

/// Total allocated resources of every cluster.
pub fn allocations(fleet: &FleetState) -> Vec<RuntimeResources> {
    fleet.clusters().iter().map(|c| *c.allocated()).collect()
}
