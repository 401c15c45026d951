use std::rc::Rc;

use dslab_multicluster::metrics::results::EpisodeSummary;
use dslab_multicluster::simulation_callbacks::{
    EpisodeCallbacks, FirstFeasibleCallbacks, RandomMaskedCallbacks, RejectAllCallbacks,
};
use dslab_multicluster::simulator::{MultiClusterSimulation, StepResult};
use dslab_multicluster::test_util::helpers::default_test_simulation_config;

const CLOUD_ONLY_TIERS: &str = r#"cluster_tiers:
  - { name: cloud, cpu: 8.0, mem: 32.0, cost: 16.0 }"#;

#[test]
fn test_first_feasible_accepts_on_cloud_fleet() {
    let _ = env_logger::try_init();

    let config =
        default_test_simulation_config(Some(&format!("episode_length: 50\n{}", CLOUD_ONLY_TIERS)));
    let mut simulation = MultiClusterSimulation::new(Rc::new(config)).unwrap();
    simulation.run_with_callbacks(&mut FirstFeasibleCallbacks {}, 3);

    let summaries = simulation.summaries();
    assert_eq!(3, summaries.len());
    for (idx, summary) in summaries.iter().enumerate() {
        assert_eq!(idx as u64 + 1, summary.episode);
        assert_eq!(
            50,
            summary.ep_accepted_requests + summary.ep_rejected_requests
        );
        assert!(summary.ep_accepted_requests > 0);
        assert_eq!(0, summary.ep_ffd + summary.ep_ffi);
        assert!(summary.ep_block_prob < 1.0);
    }
    assert_eq!(150, simulation.metrics.offered_requests);
}

#[test]
fn test_random_masked_runs_episodes() {
    let config = default_test_simulation_config(Some("episode_length: 30"));
    let mut simulation = MultiClusterSimulation::new(Rc::new(config)).unwrap();
    simulation.run_with_callbacks(&mut RandomMaskedCallbacks {}, 2);

    assert_eq!(2, simulation.summaries().len());
    assert!(simulation.is_done());
    assert_eq!(30, simulation.current_step());
}

#[test]
fn test_reject_all_writes_results_file() {
    let path = std::env::temp_dir().join(format!(
        "dslab_multicluster_callbacks_{}.csv",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let config = default_test_simulation_config(Some(&format!(
        "episode_length: 20\nresults_file: {}",
        path.display()
    )));
    let mut simulation = MultiClusterSimulation::new(Rc::new(config)).unwrap();
    simulation.run_with_callbacks(&mut RejectAllCallbacks {}, 3);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<EpisodeSummary> = reader.deserialize().map(|row| row.unwrap()).collect();
    assert_eq!(3, rows.len());
    for (idx, row) in rows.iter().enumerate() {
        assert_eq!(idx as u64 + 1, row.episode);
        assert_eq!(1.0, row.ep_block_prob);
        assert_eq!(20, row.ep_rejected_requests);
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(1, content.matches("ep_block_prob").count());
    std::fs::remove_file(&path).unwrap();
}

struct StopAfter {
    steps: u64,
    seen: u64,
    started: u64,
    finished: u64,
}

impl EpisodeCallbacks for StopAfter {
    fn on_episode_start(&mut self, _sim: &mut MultiClusterSimulation) {
        self.started += 1;
        self.seen = 0;
    }

    fn choose_action(&mut self, sim: &mut MultiClusterSimulation) -> usize {
        sim.action_count() - 1
    }

    fn on_step(&mut self, _sim: &mut MultiClusterSimulation, _result: &StepResult) -> bool {
        self.seen += 1;
        self.seen < self.steps
    }

    fn on_episode_finish(&mut self, _sim: &mut MultiClusterSimulation) {
        self.finished += 1;
    }
}

#[test]
fn test_callbacks_can_stop_episode_early() {
    let config = default_test_simulation_config(None);
    let mut simulation = MultiClusterSimulation::new(Rc::new(config)).unwrap();
    let mut callbacks = StopAfter {
        steps: 5,
        seen: 0,
        started: 0,
        finished: 0,
    };
    simulation.run_with_callbacks(&mut callbacks, 2);

    assert_eq!((2, 2), (callbacks.started, callbacks.finished));
    assert_eq!(5, simulation.current_step());
    assert!(!simulation.is_done());
    assert!(simulation.summaries().is_empty());
}
