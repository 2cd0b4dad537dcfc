//! Intra-route single-job relocation.
//!
//! # Algorithm
//!
//! Moves the job at `s_rank` to slot `t_rank` within the same route
//! (slot positions counted before the removal). `t_rank` values of
//! `s_rank` and `s_rank + 1` reproduce the current route and are
//! rejected at enumeration.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{
    cost_between, insertion_cost, location_at, location_at_slot, location_before, location_after,
};

/// Move the job at `s_rank` to slot `t_rank` of the same route.
#[derive(Debug)]
pub struct IntraRelocate {
    vehicle: usize,
    s_rank: usize,
    t_rank: usize,
    /// Start of the re-spliced span (canonical ordering of the edit).
    first_rank: usize,
    /// One past the end of the re-spliced span.
    last_rank: usize,
    gain: Gain,
}

impl IntraRelocate {
    /// Creates the move. Requires `t_rank` different from `s_rank` and
    /// `s_rank + 1` (both would be no-ops).
    pub fn new(vehicle: usize, s_rank: usize, t_rank: usize) -> Self {
        let (first_rank, last_rank) = if t_rank < s_rank {
            (t_rank, s_rank + 1)
        } else {
            (s_rank, t_rank)
        };
        Self {
            vehicle,
            s_rank,
            t_rank,
            first_rank,
            last_rank,
            gain: 0,
        }
    }

    /// Prices the removal against the insertion.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let route = &slots[self.vehicle];
        let job = location_at(instance, route, self.s_rank);

        let removal_gain = state.edge_cost_around_node(self.vehicle, self.s_rank) as Gain
            - cost_between(
                instance,
                location_before(instance, route, self.s_rank),
                location_after(instance, route, self.s_rank),
            ) as Gain;

        // Insertion neighbours are outside the moved job, so the current
        // route still names them correctly.
        let prev_t = location_before(instance, route, self.t_rank);
        let at_t = location_at_slot(instance, route, self.t_rank);
        self.gain = removal_gain - insertion_cost(instance, prev_t, &[job], at_t);
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The re-spliced span with the job moved inside it.
    fn fragment(&self, slots: &[RouteSlot]) -> Vec<usize> {
        let jobs = slots[self.vehicle].jobs();
        let mut fragment = Vec::with_capacity(self.last_rank - self.first_rank);
        if self.t_rank < self.s_rank {
            fragment.push(jobs[self.s_rank]);
            fragment.extend_from_slice(&jobs[self.t_rank..self.s_rank]);
        } else {
            fragment.extend_from_slice(&jobs[self.s_rank + 1..self.t_rank]);
            fragment.push(jobs[self.s_rank]);
        }
        fragment
    }

    /// Only the schedule can be violated within one route.
    pub fn is_valid(&self, instance: &Instance, slots: &[RouteSlot]) -> bool {
        slots[self.vehicle].is_valid_replacement(
            instance,
            self.first_rank,
            self.last_rank,
            &self.fragment(slots),
        )
    }

    /// Re-splices the span.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots);
        slots[self.vehicle].replace(instance, self.first_rank, self.last_rank, &fragment)
    }

    /// The single touched vehicle.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
