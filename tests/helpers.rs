use dslab_multicluster::core::common::RuntimeResources;
use dslab_multicluster::core::fleet::FleetState;
use dslab_multicluster::simulator::MultiClusterSimulation;

pub const EPS: f64 = 1e-6;

pub fn check_fleet_invariants(fleet: &FleetState) {
    for (idx, cluster) in fleet.clusters().iter().enumerate() {
        let allocated = cluster.allocated();
        assert!(allocated.cpu >= 0.0 && allocated.mem >= 0.0, "cluster {}", idx);
        assert!(allocated.cpu <= cluster.capacity.cpu + EPS, "cluster {}", idx);
        assert!(allocated.mem <= cluster.capacity.mem + EPS, "cluster {}", idx);
        assert!((cluster.free().cpu - (cluster.capacity.cpu - allocated.cpu)).abs() < EPS);
        assert!((cluster.free().mem - (cluster.capacity.mem - allocated.mem)).abs() < EPS);
    }

    let latency = fleet.latency();
    for i in 0..latency.cluster_count() {
        assert_eq!(0.0, latency.get(i, i));
        for j in 0..latency.cluster_count() {
            assert_eq!(latency.get(i, j), latency.get(j, i));
            assert!((0.0..=1000.0).contains(&latency.get(i, j)));
        }
        let row = latency.row(i);
        let mean = row.iter().sum::<f64>() / row.len() as f64;
        assert!((mean - latency.mean_latency(i)).abs() < EPS);
    }
}

/// Allocation of every cluster equals its initial allocation plus the shares of all running
/// requests.
pub fn check_allocation_matches_running_requests(
    simulation: &MultiClusterSimulation,
    initial: &[RuntimeResources],
) {
    let mut expected = initial.to_vec();
    for request in simulation.timeline().running_requests() {
        let placement = request.placement.as_ref().unwrap();
        for (cluster, replicas) in placement.shares(request.num_replicas) {
            let share = request.replica_request.times(replicas);
            expected[cluster].cpu += share.cpu;
            expected[cluster].mem += share.mem;
        }
    }
    for (idx, cluster) in simulation.fleet().clusters().iter().enumerate() {
        assert!(
            (cluster.allocated().cpu - expected[idx].cpu).abs() < EPS,
            "cluster {}: {:?} != {:?}",
            idx,
            cluster.allocated(),
            expected[idx]
        );
        assert!((cluster.allocated().mem - expected[idx].mem).abs() < EPS);
    }
}
