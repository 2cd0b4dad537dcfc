//! Intra-route job-for-edge exchange.
//!
//! # Algorithm
//!
//! Swaps the single job at `s_rank` with the edge starting at `t_rank`
//! within one route; the edge may land reversed. The job and the edge
//! must not be adjacent (`s_rank + 2 <= t_rank` or
//! `s_rank >= t_rank + 3`) so that the node and edge surrounds never
//! alias; the adjacent cases are covered by the intra relocation moves.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Swap the job at `s_rank` with the edge `(t_rank, t_rank + 1)` of the
/// same route.
#[derive(Debug)]
pub struct IntraMixedExchange {
    vehicle: usize,
    s_rank: usize,
    t_rank: usize,
    /// Start of the re-spliced span.
    first_rank: usize,
    /// One past the end of the re-spliced span.
    last_rank: usize,
    gain: Gain,
    normal_s_gain: Gain,
    reversed_s_gain: Gain,
    t_gain: Gain,
    /// Insert the edge reversed at the job's position.
    reverse_t_edge: bool,
}

impl IntraMixedExchange {
    /// Creates the move. Requires `s_rank + 2 <= t_rank` or
    /// `s_rank >= t_rank + 3`.
    pub fn new(vehicle: usize, s_rank: usize, t_rank: usize) -> Self {
        let (first_rank, last_rank) = if s_rank < t_rank {
            (s_rank, t_rank + 2)
        } else {
            (t_rank, s_rank + 1)
        };
        Self {
            vehicle,
            s_rank,
            t_rank,
            first_rank,
            last_rank,
            gain: 0,
            normal_s_gain: 0,
            reversed_s_gain: 0,
            t_gain: 0,
            reverse_t_edge: false,
        }
    }

    /// Prices the swap, trying both orientations of the edge at the
    /// job's position.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let route = &slots[self.vehicle];
        let s_job = location_at(instance, route, self.s_rank);
        let t_first = location_at(instance, route, self.t_rank);
        let t_second = location_at(instance, route, self.t_rank + 1);

        let prev_s = location_before(instance, route, self.s_rank);
        let next_s = location_after(instance, route, self.s_rank);
        let around_s = state.edge_cost_around_node(self.vehicle, self.s_rank) as Gain;

        self.normal_s_gain = around_s
            - cost_from(instance, prev_s, t_first) as Gain
            - instance.cost(t_first, t_second) as Gain
            - cost_to(instance, t_second, next_s) as Gain;
        self.reversed_s_gain = around_s
            - cost_from(instance, prev_s, t_second) as Gain
            - instance.cost(t_second, t_first) as Gain
            - cost_to(instance, t_first, next_s) as Gain;
        self.reverse_t_edge = self.reversed_s_gain > self.normal_s_gain;

        let prev_t = location_before(instance, route, self.t_rank);
        let next_t = location_after(instance, route, self.t_rank + 1);
        self.t_gain = state.edge_cost_around_edge(self.vehicle, self.t_rank) as Gain
            + instance.cost(t_first, t_second) as Gain
            - cost_from(instance, prev_t, s_job) as Gain
            - cost_to(instance, s_job, next_t) as Gain;

        self.gain = self.normal_s_gain.max(self.reversed_s_gain) + self.t_gain;
    }

    /// The stored gain for the current orientation.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The re-spliced span with the job and the (oriented) edge swapped.
    fn fragment(&self, slots: &[RouteSlot], reverse_t: bool) -> Vec<usize> {
        let jobs = slots[self.vehicle].jobs();
        let edge = if reverse_t {
            [jobs[self.t_rank + 1], jobs[self.t_rank]]
        } else {
            [jobs[self.t_rank], jobs[self.t_rank + 1]]
        };
        let mut fragment = Vec::with_capacity(self.last_rank - self.first_rank);
        if self.s_rank < self.t_rank {
            fragment.extend(edge);
            fragment.extend_from_slice(&jobs[self.s_rank + 1..self.t_rank]);
            fragment.push(jobs[self.s_rank]);
        } else {
            fragment.push(jobs[self.s_rank]);
            fragment.extend_from_slice(&jobs[self.t_rank + 2..self.s_rank]);
            fragment.extend(edge);
        }
        fragment
    }

    /// Schedule check with orientation fallback.
    pub fn is_valid(&mut self, instance: &Instance, slots: &[RouteSlot]) -> bool {
        let mut orientations: Vec<(bool, Gain)> = [
            (false, self.normal_s_gain + self.t_gain),
            (true, self.reversed_s_gain + self.t_gain),
        ]
        .into_iter()
        .filter(|&(_, gain)| gain > 0)
        .collect();
        orientations.sort_by_key(|&(_, gain)| -gain);

        for (reverse_t, gain) in orientations {
            let fragment = self.fragment(slots, reverse_t);
            if slots[self.vehicle].is_valid_replacement(
                instance,
                self.first_rank,
                self.last_rank,
                &fragment,
            ) {
                self.reverse_t_edge = reverse_t;
                self.gain = gain;
                return true;
            }
        }
        false
    }

    /// Re-splices the span.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots, self.reverse_t_edge);
        slots[self.vehicle].replace(instance, self.first_rank, self.last_rank, &fragment)
    }

    /// The single touched vehicle.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
