//! Placement engine decides feasibility of an action for the pending request and commits the
//! resulting assignment to the fleet.

use log::debug;

use crate::core::action::Action;
use crate::core::fleet::FleetState;
use crate::core::latency::{SPLIT_PLACEMENT_INCREASE_FACTOR, WHOLE_PLACEMENT_INCREASE_FACTOR};
use crate::core::placement::best_fit::BestFitOneByOne;
use crate::core::placement::first_fit::FirstFitDecreasing;
use crate::core::placement::interface::{PlacementError, SplitAlgorithm, SplitStrategy};
use crate::core::request::{DeploymentRequest, Placement};

static FIRST_FIT_DECREASING: FirstFitDecreasing = FirstFitDecreasing {};
static BEST_FIT_ONE_BY_ONE: BestFitOneByOne = BestFitOneByOne {};

pub fn split_algorithm(strategy: SplitStrategy) -> &'static dyn SplitAlgorithm {
    match strategy {
        SplitStrategy::FirstFitDecreasing => &FIRST_FIT_DECREASING,
        SplitStrategy::BestFitOneByOne => &BEST_FIT_ONE_BY_ONE,
    }
}

/// Result of a committed placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementReport {
    pub placement: Placement,
    /// Replica-weighted mean latency of the chosen clusters.
    pub expected_latency: f64,
    /// Replica-weighted mean cost of the chosen clusters.
    pub expected_cost: f64,
    /// Replica-weighted cpu utilization (percents) of the chosen clusters after the placement.
    pub cpu_usage_percentage: f64,
}

#[derive(Default)]
pub struct PlacementEngine {}

impl PlacementEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Tries to place `request` according to `action`. On success the fleet is mutated and the
    /// request carries its placement, on error nothing changes.
    pub fn place(
        &self,
        action: Action,
        request: &mut DeploymentRequest,
        fleet: &mut FleetState,
    ) -> Result<PlacementReport, PlacementError> {
        match action {
            Action::Whole(cluster) => {
                if !fleet.can_fit(cluster, &request.total_request()) {
                    return Err(PlacementError::ClusterFull(cluster));
                }
                Ok(self.commit(Placement::Whole { cluster }, request, fleet))
            }
            Action::Split(split_action) => {
                let distribution = self.plan_split(split_action.strategy(), request, fleet)?;
                Ok(self.commit(Placement::Split { distribution }, request, fleet))
            }
            Action::Reject => Err(PlacementError::RequestRejected),
            Action::Unrecognized(index) => Err(PlacementError::UnrecognizedAction(index)),
        }
    }

    /// Computes and validates a split without touching the fleet.
    pub fn plan_split(
        &self,
        strategy: SplitStrategy,
        request: &DeploymentRequest,
        fleet: &FleetState,
    ) -> Result<Vec<u32>, PlacementError> {
        if request.num_replicas <= 1 {
            return Err(PlacementError::SingleReplicaSplit);
        }
        let distribution = split_algorithm(strategy).split(
            request.num_replicas,
            &request.replica_request,
            &fleet.free_resources(),
        );
        debug!("{:?} distribution for request {:?}: {:?}", strategy, request.id, distribution);

        self.validate_split_feasible(request, &distribution, fleet)?;

        let placed: u32 = distribution.iter().sum();
        if placed != request.num_replicas {
            return Err(PlacementError::SplitIncomplete {
                placed,
                requested: request.num_replicas,
            });
        }
        Ok(distribution)
    }

    /// Checks every cluster of the distribution against the capacity threshold.
    pub fn validate_split_feasible(
        &self,
        request: &DeploymentRequest,
        distribution: &[u32],
        fleet: &FleetState,
    ) -> Result<(), PlacementError> {
        for (cluster, &replicas) in distribution.iter().enumerate() {
            if !fleet.can_fit(cluster, &request.replica_request.times(replicas)) {
                return Err(PlacementError::SplitOvercommitted(cluster));
            }
        }
        Ok(())
    }

    fn commit(
        &self,
        placement: Placement,
        request: &mut DeploymentRequest,
        fleet: &mut FleetState,
    ) -> PlacementReport {
        let factor = if placement.is_split() {
            SPLIT_PLACEMENT_INCREASE_FACTOR
        } else {
            WHOLE_PLACEMENT_INCREASE_FACTOR
        };

        let mut latency_sum = 0.0;
        let mut cost_sum = 0.0;
        let mut usage_sum = 0.0;
        for (cluster, replicas) in placement.shares(request.num_replicas) {
            fleet.apply(cluster, &request.replica_request.times(replicas));
            usage_sum += fleet.cluster(cluster).cpu_usage_percentage() * replicas as f64;
            cost_sum += fleet.cluster(cluster).cost() * replicas as f64;
            match placement {
                // latency observed by a whole placement already includes its own load
                Placement::Whole { .. } => {
                    fleet.latency_mut().increase(cluster, factor);
                    latency_sum += fleet.latency().mean_latency(cluster) * replicas as f64;
                }
                Placement::Split { .. } => {
                    latency_sum += fleet.latency().mean_latency(cluster) * replicas as f64;
                    fleet.latency_mut().increase(cluster, factor);
                }
            }
        }

        let replicas = request.num_replicas as f64;
        let report = PlacementReport {
            placement: placement.clone(),
            expected_latency: latency_sum / replicas,
            expected_cost: cost_sum / replicas,
            cpu_usage_percentage: usage_sum / replicas,
        };
        request.placement = Some(placement);
        request.expected_latency = report.expected_latency;
        request.expected_cost = report.expected_cost;

        debug!(
            "Request {:?} placed: {:?} | latency: {:.2} | cost: {:.2}",
            request.id, report.placement, report.expected_latency, report.expected_cost
        );
        report
    }
}
