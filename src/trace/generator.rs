//! Synthetic workload: draws the shape and timing of the next deployment request.

use dslab_core::Simulation;
use log::debug;
use rand_distr::Exp;

use crate::config::SimulationConfig;
use crate::core::request::{DeploymentRequest, RequestId};
use crate::error::GymError;
use crate::trace::catalog::DeploymentBlueprint;

/// Replacement for a zero exponential draw, keeps the clock strictly increasing.
pub const MIN_TIME_DELTA: f64 = 1e-9;

pub struct RequestGenerator {
    catalog: Vec<DeploymentBlueprint>,
    min_replicas: u32,
    max_replicas: u32,
    inter_arrival_distribution: Exp<f64>,
    duration_distribution: Exp<f64>,

    clock: f64,
    last_inter_arrival: f64,
    next_id: u64,
}

impl RequestGenerator {
    pub fn new(config: &SimulationConfig) -> Result<Self, GymError> {
        let inter_arrival_distribution = Exp::new(config.arrival_rate).map_err(|err| {
            GymError::Distribution(format!("arrival_rate {}: {}", config.arrival_rate, err))
        })?;
        let duration_distribution = Exp::new(1.0 / config.call_duration).map_err(|err| {
            GymError::Distribution(format!("call_duration {}: {}", config.call_duration, err))
        })?;
        Ok(Self {
            catalog: config.deployment_catalog.clone(),
            min_replicas: config.min_replicas,
            max_replicas: config.max_replicas,
            inter_arrival_distribution,
            duration_distribution,
            clock: 0.0,
            last_inter_arrival: 0.0,
            next_id: 0,
        })
    }

    /// Restarts the simulated clock. Request ids keep growing across episodes.
    pub fn reset(&mut self) {
        self.clock = 0.0;
        self.last_inter_arrival = 0.0;
    }

    /// Simulated time of the latest arrival.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Gap between the latest arrival and the one before it.
    pub fn last_inter_arrival(&self) -> f64 {
        self.last_inter_arrival
    }

    /// Draws the next request and advances the clock to its arrival time.
    pub fn next_request(&mut self, sim: &mut Simulation) -> DeploymentRequest {
        let inter_arrival = positive(sim.sample_from_distribution(&self.inter_arrival_distribution));
        let duration = positive(sim.sample_from_distribution(&self.duration_distribution));
        let arrival_time = self.clock + inter_arrival;
        let departure_time = arrival_time + duration;
        self.clock = arrival_time;
        self.last_inter_arrival = inter_arrival;

        let blueprint = &self.catalog[sim.gen_range(0..self.catalog.len())];
        let num_replicas = if self.min_replicas == self.max_replicas {
            self.min_replicas
        } else {
            sim.gen_range(self.min_replicas..=self.max_replicas)
        };

        let request = DeploymentRequest::new(
            RequestId(self.next_id),
            blueprint.name.clone(),
            num_replicas,
            blueprint.replica_request(),
            blueprint.latency_threshold,
            arrival_time,
            departure_time,
        );
        self.next_id += 1;

        debug!(
            "Next request {:?}: {} | replicas: {} | arrival: {:.4} | departure: {:.4}",
            request.id, request.name, request.num_replicas, arrival_time, departure_time
        );
        request
    }
}

fn positive(draw: f64) -> f64 {
    if draw > 0.0 {
        draw
    } else {
        MIN_TIME_DELTA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::helpers::default_test_simulation_config;

    #[test]
    fn test_clock_strictly_advances() {
        let config = default_test_simulation_config(None);
        let mut sim = Simulation::new(config.seed);
        let mut generator = RequestGenerator::new(&config).unwrap();

        let mut previous_arrival = 0.0;
        for i in 0..1000 {
            let request = generator.next_request(&mut sim);
            assert_eq!(RequestId(i), request.id);
            assert!(request.arrival_time > previous_arrival);
            assert!(request.departure_time > request.arrival_time);
            assert_eq!(request.arrival_time, generator.clock());
            assert!((request.arrival_time - previous_arrival - generator.last_inter_arrival()).abs() < 1e-9);
            assert!(request.num_replicas >= config.min_replicas);
            assert!(request.num_replicas <= config.max_replicas);
            assert!(config
                .deployment_catalog
                .iter()
                .any(|blueprint| blueprint.name == request.name));
            previous_arrival = request.arrival_time;
        }
    }

    #[test]
    fn test_fixed_replica_count() {
        let config = default_test_simulation_config(Some("min_replicas: 3\nmax_replicas: 3"));
        let mut sim = Simulation::new(config.seed);
        let mut generator = RequestGenerator::new(&config).unwrap();
        for _ in 0..100 {
            assert_eq!(3, generator.next_request(&mut sim).num_replicas);
        }
    }

    #[test]
    fn test_reset_restarts_clock_but_not_ids() {
        let config = default_test_simulation_config(None);
        let mut sim = Simulation::new(config.seed);
        let mut generator = RequestGenerator::new(&config).unwrap();
        generator.next_request(&mut sim);
        generator.next_request(&mut sim);
        generator.reset();
        assert_eq!(0.0, generator.clock());

        let request = generator.next_request(&mut sim);
        assert_eq!(RequestId(2), request.id);
        assert_eq!(request.arrival_time, generator.last_inter_arrival());
    }
}
