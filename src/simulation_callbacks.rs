//! Episode callbacks interface and baseline implementations which define how actions are chosen
//! during a run and what happens on episode start, step and finish.

use log::info;

use crate::core::action::{Action, SplitAction};
use crate::simulator::{Environment, MultiClusterSimulation, StepResult};

pub trait EpisodeCallbacks {
    /// Runs after the episode was reset.
    fn on_episode_start(&mut self, _sim: &mut MultiClusterSimulation) {}

    /// Chooses the action for the pending request.
    fn choose_action(&mut self, sim: &mut MultiClusterSimulation) -> usize;

    /// Runs after each step, returns false if the episode must be stopped early.
    fn on_step(&mut self, _sim: &mut MultiClusterSimulation, _result: &StepResult) -> bool {
        true
    }

    /// Runs upon the completion of an episode.
    fn on_episode_finish(&mut self, _sim: &mut MultiClusterSimulation) {}
}

fn log_progress(sim: &MultiClusterSimulation) {
    if let Some(summary) = sim.summaries().last() {
        info!(
            "Finished {} episodes, last block prob: {:.2}",
            sim.summaries().len(),
            summary.ep_block_prob
        );
    }
}

/// Picks uniformly among the actions allowed by the action mask.
pub struct RandomMaskedCallbacks {}

impl EpisodeCallbacks for RandomMaskedCallbacks {
    fn choose_action(&mut self, sim: &mut MultiClusterSimulation) -> usize {
        let allowed: Vec<usize> = sim
            .action_masks()
            .iter()
            .enumerate()
            .filter(|(_, &allowed)| allowed)
            .map(|(idx, _)| idx)
            .collect();
        allowed[sim.sim.gen_range(0..allowed.len())]
    }

    fn on_episode_finish(&mut self, sim: &mut MultiClusterSimulation) {
        log_progress(sim);
    }
}

/// Places the whole request on the first cluster where it fits, otherwise tries a best-fit
/// split and rejects single replica requests.
pub struct FirstFeasibleCallbacks {}

impl EpisodeCallbacks for FirstFeasibleCallbacks {
    fn choose_action(&mut self, sim: &mut MultiClusterSimulation) -> usize {
        let num_clusters = sim.fleet().cluster_count();
        let mask = sim.action_masks();
        if let Some(cluster) = mask[..num_clusters].iter().position(|&allowed| allowed) {
            return cluster;
        }
        if sim.pending_request().num_replicas > 1 {
            return Action::Split(SplitAction::BestFitOneByOne).index(num_clusters);
        }
        Action::reject_index(num_clusters)
    }

    fn on_episode_finish(&mut self, sim: &mut MultiClusterSimulation) {
        log_progress(sim);
    }
}

pub struct RejectAllCallbacks {}

impl EpisodeCallbacks for RejectAllCallbacks {
    fn choose_action(&mut self, sim: &mut MultiClusterSimulation) -> usize {
        Action::reject_index(sim.fleet().cluster_count())
    }

    fn on_episode_finish(&mut self, sim: &mut MultiClusterSimulation) {
        log_progress(sim);
    }
}
