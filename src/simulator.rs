//! Represents entry point for simulator: the environment contract driven by a decision-making
//! agent and its multi-cluster implementation.

use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use serde::Serialize;

use dslab_core::simulation::Simulation;

use crate::config::SimulationConfig;
use crate::core::action::Action;
use crate::core::fleet::FleetState;
use crate::core::observation::{action_mask, Observation};
use crate::core::placement::engine::PlacementEngine;
use crate::core::placement::interface::PlacementError;
use crate::core::request::DeploymentRequest;
use crate::core::reward::{RewardEngine, StepOutcome};
use crate::core::timeline::EventTimeline;
use crate::error::GymError;
use crate::metrics::collector::MetricsCollector;
use crate::metrics::results::{append_summary, EpisodeSummary};
use crate::simulation_callbacks::EpisodeCallbacks;
use crate::trace::generator::RequestGenerator;

/// Contract between the simulation and an agent choosing actions.
pub trait Environment {
    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Observation;

    /// Applies `action` to the pending request and moves to the next one.
    fn step(&mut self, action: usize) -> StepResult;

    /// Feasibility of every action for the pending request.
    fn action_masks(&self) -> Vec<bool>;
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct StepInfo {
    pub reward_step: f64,
    pub action: usize,
    /// Cumulative reward of the episode.
    pub reward: f64,
    pub block_prob: f64,
    pub ep_block_prob: f64,
    pub ep_accepted_requests: u64,
    pub ep_rejected_requests: u64,
    pub ep_deploy_all: u64,
    pub ep_ffd: u64,
    pub ep_ffi: u64,
    pub ep_bf1b1: u64,
    pub avg_latency: f64,
    pub avg_cost: f64,
    pub avg_cpu_cluster_selected: f64,
    pub gini: f64,
    /// Wall-clock seconds since the start of the episode.
    pub execution_time: f64,
}

impl StepInfo {
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        [
            ("reward_step", self.reward_step),
            ("action", self.action as f64),
            ("reward", self.reward),
            ("block_prob", self.block_prob),
            ("ep_block_prob", self.ep_block_prob),
            ("ep_accepted_requests", self.ep_accepted_requests as f64),
            ("ep_rejected_requests", self.ep_rejected_requests as f64),
            ("ep_deploy_all", self.ep_deploy_all as f64),
            ("ep_ffd", self.ep_ffd as f64),
            ("ep_ffi", self.ep_ffi as f64),
            ("ep_bf1b1", self.ep_bf1b1 as f64),
            ("avg_latency", self.avg_latency),
            ("avg_cost", self.avg_cost),
            ("avg_cpu_cluster_selected", self.avg_cpu_cluster_selected),
            ("gini", self.gini),
            ("execution_time", self.execution_time),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
    /// Why the action was penalized, None for accepted requests.
    pub penalty: Option<PlacementError>,
}

pub struct MultiClusterSimulation {
    pub config: Rc<SimulationConfig>,
    pub sim: Simulation,

    fleet: FleetState,
    timeline: EventTimeline,
    generator: RequestGenerator,
    placement_engine: PlacementEngine,
    reward_engine: RewardEngine,
    pub metrics: MetricsCollector,

    pending_request: DeploymentRequest,
    current_step: u64,
    done: bool,
    episode_start: Instant,
    summaries: Vec<EpisodeSummary>,
}

impl MultiClusterSimulation {
    pub fn new(config: Rc<SimulationConfig>) -> Result<Self, GymError> {
        config.validate()?;

        let mut sim = Simulation::new(config.seed);
        let mut generator = RequestGenerator::new(&config)?;
        let fleet = FleetState::initialize(&config, &mut sim);
        let pending_request = generator.next_request(&mut sim);

        Ok(Self {
            fleet,
            timeline: EventTimeline::new(),
            generator,
            placement_engine: PlacementEngine::new(),
            reward_engine: RewardEngine::from_config(&config),
            metrics: MetricsCollector::new(config.num_clusters),
            pending_request,
            current_step: 0,
            done: false,
            episode_start: Instant::now(),
            summaries: vec![],
            config,
            sim,
        })
    }

    pub fn fleet(&self) -> &FleetState {
        &self.fleet
    }

    pub fn timeline(&self) -> &EventTimeline {
        &self.timeline
    }

    pub fn pending_request(&self) -> &DeploymentRequest {
        &self.pending_request
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Summaries of all finished episodes, in order.
    pub fn summaries(&self) -> &[EpisodeSummary] {
        &self.summaries
    }

    pub fn action_count(&self) -> usize {
        Action::count(self.fleet.cluster_count())
    }

    pub fn observation(&self) -> Observation {
        Observation::build(
            &self.fleet,
            &self.pending_request,
            self.generator.last_inter_arrival(),
        )
    }

    /// Runs `episodes` episodes choosing actions with `callbacks`.
    pub fn run_with_callbacks(&mut self, callbacks: &mut dyn EpisodeCallbacks, episodes: u64) {
        let t = Instant::now();
        let mut steps = 0u64;
        for _ in 0..episodes {
            self.reset();
            callbacks.on_episode_start(self);
            while !self.done {
                let action = callbacks.choose_action(self);
                let result = self.step(action);
                steps += 1;
                if !callbacks.on_step(self, &result) {
                    break;
                }
            }
            callbacks.on_episode_finish(self);
        }
        let duration = t.elapsed().as_secs_f64();
        info!(
            "Processed {} steps in {:.2?}s ({:.0} steps/s)",
            steps,
            duration,
            steps as f64 / duration
        );
    }

    fn outcome_of(&mut self, action: Action) -> (StepOutcome, Option<PlacementError>) {
        let num_replicas = self.pending_request.num_replicas;
        match self
            .placement_engine
            .place(action, &mut self.pending_request, &mut self.fleet)
        {
            Ok(report) => {
                self.metrics.increment_accepted(action, num_replicas, &report);
                let outcome = StepOutcome::Placed {
                    expected_latency: report.expected_latency,
                    expected_cost: report.expected_cost,
                    latency_threshold: self.pending_request.latency_threshold,
                };
                (outcome, None)
            }
            Err(err) => {
                match &err {
                    PlacementError::UnrecognizedAction(index) => warn!(
                        "Unrecognized action {} for {} clusters, request is rejected",
                        index,
                        self.fleet.cluster_count()
                    ),
                    _ => debug!("Action {} is penalized: {:?}", action, err),
                }
                let outcome = StepOutcome::Penalized {
                    fleet_full: self.fleet.is_full_for(&self.pending_request),
                };
                (outcome, Some(err))
            }
        }
    }

    /// Admits the request just placed, draws the next one and releases requests departed by
    /// its arrival.
    fn advance(&mut self, admit: bool) {
        let next_request = self.generator.next_request(&mut self.sim);
        let arrival_time = next_request.arrival_time;
        let previous = std::mem::replace(&mut self.pending_request, next_request);
        if admit {
            self.timeline.admit(previous);
        }
        let released = self.timeline.drain_due_by(arrival_time, &mut self.fleet);
        if released > 0 {
            debug!(
                "Released {} requests by {:.4}, {} still running",
                released,
                arrival_time,
                self.timeline.len()
            );
        }
    }

    fn step_info(&self, action: usize, reward: f64) -> StepInfo {
        StepInfo {
            reward_step: reward,
            action,
            reward: self.metrics.ep_total_reward,
            block_prob: self.metrics.block_prob(),
            ep_block_prob: self.metrics.ep_block_prob(self.current_step),
            ep_accepted_requests: self.metrics.ep_accepted_requests,
            ep_rejected_requests: self.current_step - self.metrics.ep_accepted_requests,
            ep_deploy_all: self.metrics.ep_actions.deploy_all,
            ep_ffd: self.metrics.ep_actions.ffd,
            ep_ffi: self.metrics.ep_actions.ffi,
            ep_bf1b1: self.metrics.ep_actions.bf1b1,
            avg_latency: self.metrics.ep_latency_stats.mean(),
            avg_cost: self.metrics.ep_cost_stats.mean(),
            avg_cpu_cluster_selected: self.metrics.ep_cpu_usage_stats.mean(),
            gini: self.metrics.gini(),
            execution_time: self.episode_start.elapsed().as_secs_f64(),
        }
    }

    fn finish_episode(&mut self, info: &StepInfo) {
        self.done = true;
        self.metrics.finished_episodes += 1;

        let summary = EpisodeSummary {
            episode: self.metrics.finished_episodes,
            reward: info.reward,
            ep_block_prob: info.ep_block_prob,
            ep_accepted_requests: info.ep_accepted_requests,
            ep_rejected_requests: info.ep_rejected_requests,
            ep_deploy_all: info.ep_deploy_all,
            ep_ffd: info.ep_ffd,
            ep_ffi: info.ep_ffi,
            ep_bf1b1: info.ep_bf1b1,
            avg_latency: info.avg_latency,
            avg_cost: info.avg_cost,
            avg_cpu_cluster_selected: info.avg_cpu_cluster_selected,
            gini: info.gini,
            execution_time: info.execution_time,
        };
        info!(
            "Episode {} finished | reward: {:.2} | block prob: {:.2} | accepted: {} | rejected: {} | \
             all: {} | ffd: {} | ffi: {} | bf1b1: {} | latency: {:.2} | cost: {:.2} | gini: {:.2} | {:.3}s",
            summary.episode,
            summary.reward,
            summary.ep_block_prob,
            summary.ep_accepted_requests,
            summary.ep_rejected_requests,
            summary.ep_deploy_all,
            summary.ep_ffd,
            summary.ep_ffi,
            summary.ep_bf1b1,
            summary.avg_latency,
            summary.avg_cost,
            summary.gini,
            summary.execution_time
        );

        if let Some(results_file) = &self.config.results_file {
            if let Err(err) = append_summary(results_file, &summary) {
                error!("Could not append episode summary to {}: {}", results_file, err);
            }
        }
        self.summaries.push(summary);
    }
}

impl Environment for MultiClusterSimulation {
    fn reset(&mut self) -> Observation {
        self.timeline.clear();
        self.generator.reset();
        self.fleet = FleetState::initialize(&self.config, &mut self.sim);
        self.metrics.reset_episode();
        self.current_step = 0;
        self.done = false;
        self.pending_request = self.generator.next_request(&mut self.sim);
        self.episode_start = Instant::now();
        info!(
            "Episode {} started: {} clusters, {} steps",
            self.metrics.finished_episodes + 1,
            self.fleet.cluster_count(),
            self.config.episode_length
        );
        self.observation()
    }

    fn step(&mut self, action_index: usize) -> StepResult {
        if self.current_step == 0 {
            self.episode_start = Instant::now();
        }
        self.current_step += 1;
        self.metrics.increment_offered();

        let action = Action::from_index(action_index, self.fleet.cluster_count());
        let (outcome, penalty) = self.outcome_of(action);
        let reward = self
            .reward_engine
            .reward(&outcome, &self.metrics.ep_load_served);
        self.metrics.add_reward(reward);

        debug!(
            "Step {} | action: {} | reward: {} | total reward: {}",
            self.current_step, action, reward, self.metrics.ep_total_reward
        );

        self.advance(penalty.is_none());

        let info = self.step_info(action_index, reward);
        if self.current_step == self.config.episode_length {
            self.finish_episode(&info);
        }

        StepResult {
            observation: self.observation(),
            reward,
            done: self.done,
            info,
            penalty,
        }
    }

    fn action_masks(&self) -> Vec<bool> {
        action_mask(&self.fleet, &self.pending_request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::helpers::default_test_simulation_config;

    #[test]
    fn test_step_info_map_has_all_keys() {
        let info = StepInfo {
            action: 7,
            ep_ffi: 2,
            ..Default::default()
        };
        let map = info.to_map();
        assert_eq!(16, map.len());
        assert_eq!(Some(&7.0), map.get("action"));
        assert_eq!(Some(&2.0), map.get("ep_ffi"));
        assert!(map.contains_key("avg_cpu_cluster_selected"));
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let mut config = default_test_simulation_config(None);
        config.num_clusters = 0;
        assert!(matches!(
            MultiClusterSimulation::new(Rc::new(config)),
            Err(GymError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_episode_is_done_after_episode_length_steps() {
        let _ = env_logger::try_init();

        let config = default_test_simulation_config(Some("episode_length: 5"));
        let mut simulation = MultiClusterSimulation::new(Rc::new(config)).unwrap();
        simulation.reset();
        let reject = Action::reject_index(simulation.fleet().cluster_count());
        for step in 1..=5 {
            let result = simulation.step(reject);
            assert_eq!(step == 5, result.done);
            assert_eq!(Some(PlacementError::RequestRejected), result.penalty);
        }
        assert_eq!(1, simulation.summaries().len());

        // stepping past the end keeps the episode done without another summary
        let result = simulation.step(reject);
        assert!(result.done);
        assert_eq!(6, result.info.ep_rejected_requests);
        assert_eq!(1, simulation.summaries().len());
    }
}
