//! Event timeline of admitted requests ordered by departure time.
//!
//! Requests are stored in an arena keyed by their id, the heap holds only
//! `(departure_time, id)` pairs.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::core::fleet::FleetState;
use crate::core::request::{DeploymentRequest, RequestId};

#[derive(Clone, Debug)]
pub struct DepartureEntry {
    pub departure_time: f64,
    pub request_id: RequestId,
}

// BinaryHeap is a max-heap, earliest departure must be on top.
impl Ord for DepartureEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .departure_time
            .total_cmp(&self.departure_time)
            .then(other.request_id.cmp(&self.request_id))
    }
}

impl PartialOrd for DepartureEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DepartureEntry {
    fn eq(&self, other: &Self) -> bool {
        self.departure_time == other.departure_time && self.request_id == other.request_id
    }
}

impl Eq for DepartureEntry {}

#[derive(Default)]
pub struct EventTimeline {
    queue: BinaryHeap<DepartureEntry>,
    running_requests: HashMap<RequestId, DeploymentRequest>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn get(&self, request_id: RequestId) -> Option<&DeploymentRequest> {
        self.running_requests.get(&request_id)
    }

    /// Admitted requests which have not departed yet, in no particular order.
    pub fn running_requests(&self) -> impl Iterator<Item = &DeploymentRequest> {
        self.running_requests.values()
    }

    pub fn next_departure_time(&self) -> Option<f64> {
        self.queue.peek().map(|entry| entry.departure_time)
    }

    /// Registers an admitted request until its departure.
    pub fn admit(&mut self, request: DeploymentRequest) {
        assert!(
            request.placement.is_some(),
            "request {:?} admitted without a placement",
            request.id
        );
        let entry = DepartureEntry {
            departure_time: request.departure_time,
            request_id: request.id,
        };
        let previous = self.running_requests.insert(request.id, request);
        assert!(
            previous.is_none(),
            "request {:?} admitted twice",
            entry.request_id
        );
        self.queue.push(entry);
    }

    /// Removes the request with the earliest departure. Panics on an empty timeline.
    pub fn pop(&mut self) -> DeploymentRequest {
        let entry = self
            .queue
            .pop()
            .expect("impossible scenario: pop from an empty event timeline");
        self.running_requests
            .remove(&entry.request_id)
            .expect("impossible scenario: timeline entry without a running request")
    }

    /// Releases every request departing strictly before `time`, in departure order. Returns
    /// the number of released requests.
    pub fn drain_due_by(&mut self, time: f64, fleet: &mut FleetState) -> usize {
        let mut released = 0;
        while let Some(departure_time) = self.next_departure_time() {
            if departure_time >= time {
                break;
            }
            let request = self.pop();
            fleet.release(&request);
            released += 1;
        }
        released
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.running_requests.clear();
    }
}
