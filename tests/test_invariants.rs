mod helpers;

use std::rc::Rc;

use dslab_multicluster::simulator::{Environment, MultiClusterSimulation};
use dslab_multicluster::test_util::helpers::{allocations, default_test_simulation_config};

use helpers::{check_allocation_matches_running_requests, check_fleet_invariants};

fn random_walk(suffix: &str, steps: u64) {
    let config = default_test_simulation_config(Some(suffix));
    let mut simulation = MultiClusterSimulation::new(Rc::new(config)).unwrap();
    simulation.reset();
    let initial = allocations(simulation.fleet());

    // a few indices past the reject action to exercise unrecognized actions
    let upper = simulation.action_count() + 3;
    let mut accepted = 0;
    for _ in 0..steps {
        let action = simulation.sim.gen_range(0..upper);
        let result = simulation.step(action);
        if result.penalty.is_none() {
            accepted += 1;
        }

        check_fleet_invariants(simulation.fleet());
        check_allocation_matches_running_requests(&simulation, &initial);
        assert!(result.info.ep_block_prob >= 0.0 && result.info.ep_block_prob <= 1.0);
        assert_eq!(accepted, result.info.ep_accepted_requests);
        assert_eq!(
            result.info.ep_accepted_requests,
            result.info.ep_deploy_all
                + result.info.ep_ffd
                + result.info.ep_ffi
                + result.info.ep_bf1b1
        );
        assert!(result.info.gini >= 0.0 && result.info.gini < 1.0);
    }
    assert!(simulation.is_done());
    assert_eq!(1, simulation.summaries().len());
}

#[test]
fn test_random_actions_keep_fleet_consistent() {
    let _ = env_logger::try_init();
    random_walk("episode_length: 2000", 2000);
}

#[test]
fn test_random_actions_on_small_clusters() {
    // edge clusters only, so whole placements are often blocked by the threshold
    random_walk(
        r#"episode_length: 1000
num_clusters: 6
arrival_rate: 50.0
call_duration: 2.0
min_replicas: 1
max_replicas: 8
cluster_tiers:
  - { name: edge_tier_1, cpu: 2.0, mem: 2.0, cost: 1.0 }
  - { name: edge_tier_2, cpu: 2.0, mem: 4.0, cost: 2.0 }"#,
        1000,
    );
}
