//! Catalog of deployment blueprints which requests are drawn from.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::core::common::RuntimeResources;

/// Shape of a deployment without its replica count. Requests are in cores and GiB per replica,
/// latency threshold is in milliseconds.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DeploymentBlueprint {
    pub name: String,
    pub cpu_request: f64,
    pub memory_request: f64,
    pub latency_threshold: f64,
}

impl DeploymentBlueprint {
    pub fn new(name: &str, cpu_request: f64, memory_request: f64, latency_threshold: f64) -> Self {
        Self {
            name: name.to_string(),
            cpu_request,
            memory_request,
            latency_threshold,
        }
    }

    pub fn replica_request(&self) -> RuntimeResources {
        RuntimeResources::new(self.cpu_request, self.memory_request)
    }
}

lazy_static! {
    // Cloud2Edge (Eclipse Hono + Ditto) microservices.
    static ref CLOUD2EDGE_CATALOG: Vec<DeploymentBlueprint> = vec![
        DeploymentBlueprint::new("ditto-concierge", 0.5, 0.5, 200.0),
        DeploymentBlueprint::new("ditto-connectivity", 0.2, 0.7, 100.0),
        DeploymentBlueprint::new("ditto-gateway", 0.2, 0.5, 100.0),
        DeploymentBlueprint::new("ditto-nginx", 0.1, 0.1, 100.0),
        DeploymentBlueprint::new("ditto-policies", 0.2, 0.5, 300.0),
        DeploymentBlueprint::new("ditto-swagger-ui", 0.1, 0.1, 400.0),
        DeploymentBlueprint::new("ditto-things", 0.2, 0.5, 200.0),
        DeploymentBlueprint::new("ditto-things-search", 0.2, 0.5, 500.0),
        DeploymentBlueprint::new("ditto-mongodb", 0.2, 0.5, 300.0),
        DeploymentBlueprint::new("hono-service-auth", 0.2, 0.2, 250.0),
        DeploymentBlueprint::new("hono-service-device-registry", 0.2, 0.5, 350.0),
        DeploymentBlueprint::new("hono-adapter-http", 0.2, 0.5, 150.0),
        DeploymentBlueprint::new("hono-adapter-mqtt", 0.2, 0.5, 150.0),
        DeploymentBlueprint::new("hono-service-command-router", 0.2, 0.5, 200.0),
        DeploymentBlueprint::new("hono-kafka", 0.5, 1.0, 600.0),
    ];
}

pub fn default_deployment_catalog() -> Vec<DeploymentBlueprint> {
    CLOUD2EDGE_CATALOG.clone()
}
