//! Decoding of integer actions chosen by a decision-making agent.
//!
//! Layout for `n` clusters: `[0, n)` whole placement to a cluster, then one action per split
//! slot (FFD, FFI, BF1B1) and finally reject.

use serde::Serialize;

use crate::core::placement::interface::SplitStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SplitAction {
    FirstFitDecreasing,
    /// Kept as a separate action with its own usage counter, runs first-fit-decreasing.
    FirstFitIncreasing,
    BestFitOneByOne,
}

pub const SPLIT_ACTIONS: [SplitAction; 3] = [
    SplitAction::FirstFitDecreasing,
    SplitAction::FirstFitIncreasing,
    SplitAction::BestFitOneByOne,
];

impl SplitAction {
    pub fn strategy(&self) -> SplitStrategy {
        match self {
            SplitAction::FirstFitDecreasing | SplitAction::FirstFitIncreasing => {
                SplitStrategy::FirstFitDecreasing
            }
            SplitAction::BestFitOneByOne => SplitStrategy::BestFitOneByOne,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Action {
    Whole(usize),
    Split(SplitAction),
    Reject,
    Unrecognized(usize),
}

impl Action {
    pub fn from_index(index: usize, num_clusters: usize) -> Self {
        if index < num_clusters {
            return Action::Whole(index);
        }
        let offset = index - num_clusters;
        if offset < SPLIT_ACTIONS.len() {
            Action::Split(SPLIT_ACTIONS[offset])
        } else if offset == SPLIT_ACTIONS.len() {
            Action::Reject
        } else {
            Action::Unrecognized(index)
        }
    }

    /// Size of the action space for a fleet of `num_clusters`.
    pub fn count(num_clusters: usize) -> usize {
        num_clusters + SPLIT_ACTIONS.len() + 1
    }

    pub fn reject_index(num_clusters: usize) -> usize {
        num_clusters + SPLIT_ACTIONS.len()
    }

    /// Inverse of `from_index`.
    pub fn index(&self, num_clusters: usize) -> usize {
        match self {
            Action::Whole(cluster) => *cluster,
            Action::Split(split) => {
                num_clusters
                    + SPLIT_ACTIONS
                        .iter()
                        .position(|candidate| candidate == split)
                        .unwrap_or_default()
            }
            Action::Reject => Self::reject_index(num_clusters),
            Action::Unrecognized(index) => *index,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Whole(cluster) => write!(f, "All-cluster-{}", cluster + 1),
            Action::Split(split) => write!(f, "Divide-{:?}", split),
            Action::Reject => write!(f, "Reject"),
            Action::Unrecognized(index) => write!(f, "Unrecognized-{}", index),
        }
    }
}
