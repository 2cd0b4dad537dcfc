//! Intra-route edge exchange.
//!
//! # Algorithm
//!
//! Swaps two disjoint edges within one route, each possibly reversed.
//! The ranks are canonicalized (`first_rank < last_rank`) and must leave
//! at least one position between the edges so the two edge surrounds
//! never alias (adjacent edge pairs are reachable through the intra
//! 2-opt and relocation moves).

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Swap the edges `(first_rank, first_rank + 1)` and
/// `(last_rank, last_rank + 1)` of one route, each possibly reversed.
#[derive(Debug)]
pub struct IntraCrossExchange {
    vehicle: usize,
    first_rank: usize,
    last_rank: usize,
    gain: Gain,
    normal_s_gain: Gain,
    reversed_s_gain: Gain,
    normal_t_gain: Gain,
    reversed_t_gain: Gain,
    /// Insert the first edge reversed at the second position.
    reverse_s_edge: bool,
    /// Insert the second edge reversed at the first position.
    reverse_t_edge: bool,
}

impl IntraCrossExchange {
    /// Creates the move. Ranks are canonicalized; they must satisfy
    /// `first_rank + 3 <= last_rank` and `last_rank + 1 < len`.
    pub fn new(vehicle: usize, s_rank: usize, t_rank: usize) -> Self {
        let (first_rank, last_rank) = if s_rank < t_rank {
            (s_rank, t_rank)
        } else {
            (t_rank, s_rank)
        };
        Self {
            vehicle,
            first_rank,
            last_rank,
            gain: 0,
            normal_s_gain: 0,
            reversed_s_gain: 0,
            normal_t_gain: 0,
            reversed_t_gain: 0,
            reverse_s_edge: false,
            reverse_t_edge: false,
        }
    }

    /// Prices both sides in both orientations and keeps the per-side
    /// maxima.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let route = &slots[self.vehicle];
        let s_first = location_at(instance, route, self.first_rank);
        let s_second = location_at(instance, route, self.first_rank + 1);
        let t_first = location_at(instance, route, self.last_rank);
        let t_second = location_at(instance, route, self.last_rank + 1);

        let prev_s = location_before(instance, route, self.first_rank);
        let next_s = location_after(instance, route, self.first_rank + 1);
        let around_s = state.edge_cost_around_edge(self.vehicle, self.first_rank) as Gain;

        self.normal_s_gain = around_s
            - cost_from(instance, prev_s, t_first) as Gain
            - cost_to(instance, t_second, next_s) as Gain;
        let t_reverse_edge_cost =
            instance.cost(t_first, t_second) as Gain - instance.cost(t_second, t_first) as Gain;
        self.reversed_s_gain = around_s + t_reverse_edge_cost
            - cost_from(instance, prev_s, t_second) as Gain
            - cost_to(instance, t_first, next_s) as Gain;
        self.reverse_t_edge = self.reversed_s_gain > self.normal_s_gain;

        let prev_t = location_before(instance, route, self.last_rank);
        let next_t = location_after(instance, route, self.last_rank + 1);
        let around_t = state.edge_cost_around_edge(self.vehicle, self.last_rank) as Gain;

        self.normal_t_gain = around_t
            - cost_from(instance, prev_t, s_first) as Gain
            - cost_to(instance, s_second, next_t) as Gain;
        let s_reverse_edge_cost =
            instance.cost(s_first, s_second) as Gain - instance.cost(s_second, s_first) as Gain;
        self.reversed_t_gain = around_t + s_reverse_edge_cost
            - cost_from(instance, prev_t, s_second) as Gain
            - cost_to(instance, s_first, next_t) as Gain;
        self.reverse_s_edge = self.reversed_t_gain > self.normal_t_gain;

        self.gain = self.normal_s_gain.max(self.reversed_s_gain)
            + self.normal_t_gain.max(self.reversed_t_gain);
    }

    /// The stored gain for the current orientations.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The re-spliced span for the given orientation choices.
    fn fragment(&self, slots: &[RouteSlot], reverse_t: bool, reverse_s: bool) -> Vec<usize> {
        let jobs = slots[self.vehicle].jobs();
        let s_edge = [jobs[self.first_rank], jobs[self.first_rank + 1]];
        let t_edge = [jobs[self.last_rank], jobs[self.last_rank + 1]];
        let mut fragment = Vec::with_capacity(self.last_rank + 2 - self.first_rank);
        if reverse_t {
            fragment.extend([t_edge[1], t_edge[0]]);
        } else {
            fragment.extend(t_edge);
        }
        fragment.extend_from_slice(&jobs[self.first_rank + 2..self.last_rank]);
        if reverse_s {
            fragment.extend([s_edge[1], s_edge[0]]);
        } else {
            fragment.extend(s_edge);
        }
        fragment
    }

    /// Schedule check over the whole touched span, with fallback across
    /// the orientation combinations ordered by gain.
    pub fn is_valid(&mut self, instance: &Instance, slots: &[RouteSlot]) -> bool {
        let mut pairs: Vec<(bool, bool, Gain)> = [
            (false, false, self.normal_s_gain + self.normal_t_gain),
            (false, true, self.normal_s_gain + self.reversed_t_gain),
            (true, false, self.reversed_s_gain + self.normal_t_gain),
            (true, true, self.reversed_s_gain + self.reversed_t_gain),
        ]
        .into_iter()
        .filter(|&(_, _, gain)| gain > 0)
        .collect();
        pairs.sort_by_key(|&(_, _, gain)| -gain);

        for (reverse_t, reverse_s, gain) in pairs {
            let fragment = self.fragment(slots, reverse_t, reverse_s);
            if slots[self.vehicle].is_valid_replacement(
                instance,
                self.first_rank,
                self.last_rank + 2,
                &fragment,
            ) {
                self.reverse_t_edge = reverse_t;
                self.reverse_s_edge = reverse_s;
                self.gain = gain;
                return true;
            }
        }
        false
    }

    /// Re-splices the span with both edges swapped.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots, self.reverse_t_edge, self.reverse_s_edge);
        slots[self.vehicle].replace(instance, self.first_rank, self.last_rank + 2, &fragment)
    }

    /// The single touched vehicle.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
