//! Inter-route edge exchange (CROSS-exchange).
//!
//! # Algorithm
//!
//! Swaps the edge starting at `s_rank` in the source route with the edge
//! starting at `t_rank` in the target route. Each incoming edge may be
//! inserted reversed; per side, the orientation with the larger local
//! gain is preferred, using the identity
//! `reverse_edge_cost = cost(a, b) - cost(b, a)` so that only the
//! boundary connections need fresh matrix lookups. On time-window routes
//! the validator confirms the preferred orientations and falls back to
//! the best remaining feasible combination with positive gain.
//!
//! # Reference
//!
//! Taillard, É. et al. (1997). "A Tabu Search Heuristic for the Vehicle
//! Routing Problem with Soft Time Windows", *Transportation Science* 31(2).

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Swap the edge `(s_rank, s_rank + 1)` of route `s_vehicle` with the
/// edge `(t_rank, t_rank + 1)` of route `t_vehicle`, each side possibly
/// reversed.
#[derive(Debug)]
pub struct CrossExchange {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
    normal_s_gain: Gain,
    reversed_s_gain: Gain,
    normal_t_gain: Gain,
    reversed_t_gain: Gain,
    /// Insert the source edge reversed into the target route.
    reverse_s_edge: bool,
    /// Insert the target edge reversed into the source route.
    reverse_t_edge: bool,
}

impl CrossExchange {
    /// Creates the move. Both routes need at least two jobs and the
    /// ranks must start an edge (`rank < len - 1`).
    pub fn new(s_vehicle: usize, s_rank: usize, t_vehicle: usize, t_rank: usize) -> Self {
        Self {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: 0,
            normal_s_gain: 0,
            reversed_s_gain: 0,
            normal_t_gain: 0,
            reversed_t_gain: 0,
            reverse_s_edge: false,
            reverse_t_edge: false,
        }
    }

    /// Prices replacing each edge with the other, in both orientations,
    /// and keeps the per-side maxima.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];

        let s_first = location_at(instance, source, self.s_rank);
        let s_second = location_at(instance, source, self.s_rank + 1);
        let t_first = location_at(instance, target, self.t_rank);
        let t_second = location_at(instance, target, self.t_rank + 1);

        // Source side: the target edge replaces (s_rank, s_rank + 1).
        let prev_s = location_before(instance, source, self.s_rank);
        let next_s = location_after(instance, source, self.s_rank + 1);
        let around_s = state.edge_cost_around_edge(self.s_vehicle, self.s_rank) as Gain;

        self.normal_s_gain = around_s
            - cost_from(instance, prev_s, t_first) as Gain
            - cost_to(instance, t_second, next_s) as Gain;
        let t_reverse_edge_cost =
            instance.cost(t_first, t_second) as Gain - instance.cost(t_second, t_first) as Gain;
        self.reversed_s_gain = around_s + t_reverse_edge_cost
            - cost_from(instance, prev_s, t_second) as Gain
            - cost_to(instance, t_first, next_s) as Gain;
        self.reverse_t_edge = self.reversed_s_gain > self.normal_s_gain;

        // Target side: the source edge replaces (t_rank, t_rank + 1).
        let prev_t = location_before(instance, target, self.t_rank);
        let next_t = location_after(instance, target, self.t_rank + 1);
        let around_t = state.edge_cost_around_edge(self.t_vehicle, self.t_rank) as Gain;

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

    /// The stored gain for the currently chosen orientations.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Whether the source edge enters the target route reversed.
    pub fn reverse_s_edge(&self) -> bool {
        self.reverse_s_edge
    }

    /// Whether the target edge enters the source route reversed.
    pub fn reverse_t_edge(&self) -> bool {
        self.reverse_t_edge
    }

    /// The source-route fragment for the given orientation choice.
    fn s_fragment(&self, slots: &[RouteSlot], reverse_t: bool) -> [usize; 2] {
        let target = &slots[self.t_vehicle];
        let first = target.at(self.t_rank);
        let second = target.at(self.t_rank + 1);
        if reverse_t {
            [second, first]
        } else {
            [first, second]
        }
    }

    /// The target-route fragment for the given orientation choice.
    fn t_fragment(&self, slots: &[RouteSlot], reverse_s: bool) -> [usize; 2] {
        let source = &slots[self.s_vehicle];
        let first = source.at(self.s_rank);
        let second = source.at(self.s_rank + 1);
        if reverse_s {
            [second, first]
        } else {
            [first, second]
        }
    }

    /// Skills and capacity for the four swapped jobs, then the schedule
    /// probes. If the preferred orientation pair fails on a time-window
    /// route, falls back to the best feasible pair that still improves.
    pub fn is_valid(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let s_first = slots[self.s_vehicle].at(self.s_rank);
        let s_second = slots[self.s_vehicle].at(self.s_rank + 1);
        let t_first = slots[self.t_vehicle].at(self.t_rank);
        let t_second = slots[self.t_vehicle].at(self.t_rank + 1);

        let skills_ok = instance.vehicle_ok_with_job(self.t_vehicle, s_first)
            && instance.vehicle_ok_with_job(self.t_vehicle, s_second)
            && instance.vehicle_ok_with_job(self.s_vehicle, t_first)
            && instance.vehicle_ok_with_job(self.s_vehicle, t_second);
        if !skills_ok {
            return false;
        }

        let s_removed = instance.job(s_first).amount() + instance.job(s_second).amount();
        let t_removed = instance.job(t_first).amount() + instance.job(t_second).amount();
        let s_load =
            &(&state.route_amount(instance, self.s_vehicle) - &s_removed) + &t_removed;
        let t_load =
            &(&state.route_amount(instance, self.t_vehicle) - &t_removed) + &s_removed;
        if !s_load.fits_within(instance.vehicle(self.s_vehicle).capacity())
            || !t_load.fits_within(instance.vehicle(self.t_vehicle).capacity())
        {
            return false;
        }

        // Orientation pairs ordered by total gain, preferred first.
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
            let s_ok = slots[self.s_vehicle].is_valid_replacement(
                instance,
                self.s_rank,
                self.s_rank + 2,
                &self.s_fragment(slots, reverse_t),
            );
            let t_ok = slots[self.t_vehicle].is_valid_replacement(
                instance,
                self.t_rank,
                self.t_rank + 2,
                &self.t_fragment(slots, reverse_s),
            );
            if s_ok && t_ok {
                self.reverse_t_edge = reverse_t;
                self.reverse_s_edge = reverse_s;
                self.gain = gain;
                return true;
            }
        }
        false
    }

    /// Swaps the two edges with their chosen orientations.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let s_fragment = self.s_fragment(slots, self.reverse_t_edge);
        let t_fragment = self.t_fragment(slots, self.reverse_s_edge);
        slots[self.s_vehicle].replace(instance, self.s_rank, self.s_rank + 2, &s_fragment)?;
        slots[self.t_vehicle].replace(instance, self.t_rank, self.t_rank + 2, &t_fragment)
    }

    /// Both touched vehicles.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
