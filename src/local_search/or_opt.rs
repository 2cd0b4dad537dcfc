//! Inter-route edge relocation (Or-opt).
//!
//! # Algorithm
//!
//! Moves the edge starting at `s_rank` out of the source route and into
//! slot `t_rank` of the target route, possibly reversed. The source gain
//! is priced from the cached edge surround; the insertion is priced for
//! both orientations and the better one kept.
//!
//! # Reference
//!
//! Or, I. (1976). "Traveling Salesman-Type Combinatorial Problems and
//! Their Relation to the Logistics of Blood Banking". PhD thesis,
//! Northwestern University.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{
    cost_between, insertion_cost, location_at, location_at_slot, location_before, location_after,
};

/// Move the edge `(s_rank, s_rank + 1)` of route `s_vehicle` into slot
/// `t_rank` of route `t_vehicle`, possibly reversed.
#[derive(Debug)]
pub struct OrOpt {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
    s_gain: Gain,
    normal_t_gain: Gain,
    reversed_t_gain: Gain,
    /// Insert the edge reversed.
    reverse_edge: bool,
}

impl OrOpt {
    /// Creates the move. `s_rank` starts an edge of the source route;
    /// `t_rank` addresses an insertion slot (`0..=len`) of the target.
    pub fn new(s_vehicle: usize, s_rank: usize, t_vehicle: usize, t_rank: usize) -> Self {
        Self {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: 0,
            s_gain: 0,
            normal_t_gain: 0,
            reversed_t_gain: 0,
            reverse_edge: false,
        }
    }

    /// Prices the removal from the edge surround and the insertion in
    /// both orientations.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];

        let first = location_at(instance, source, self.s_rank);
        let second = location_at(instance, source, self.s_rank + 1);

        let prev_s = location_before(instance, source, self.s_rank);
        let next_s = location_after(instance, source, self.s_rank + 1);
        self.s_gain = state.edge_cost_around_edge(self.s_vehicle, self.s_rank) as Gain
            + instance.cost(first, second) as Gain
            - cost_between(instance, prev_s, next_s) as Gain;

        let prev_t = location_before(instance, target, self.t_rank);
        let at_t = location_at_slot(instance, target, self.t_rank);
        self.normal_t_gain = -insertion_cost(instance, prev_t, &[first, second], at_t);
        self.reversed_t_gain = -insertion_cost(instance, prev_t, &[second, first], at_t);

        self.reverse_edge = self.reversed_t_gain > self.normal_t_gain;
        self.gain = self.s_gain + self.normal_t_gain.max(self.reversed_t_gain);
    }

    /// The stored gain for the current orientation.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Whether the edge is inserted reversed.
    pub fn reverse_edge(&self) -> bool {
        self.reverse_edge
    }

    /// The oriented edge fragment.
    fn fragment(&self, slots: &[RouteSlot], reversed: bool) -> [usize; 2] {
        let source = &slots[self.s_vehicle];
        let first = source.at(self.s_rank);
        let second = source.at(self.s_rank + 1);
        if reversed {
            [second, first]
        } else {
            [first, second]
        }
    }

    /// Skills and capacity on the target plus the schedule probes,
    /// falling back to the other orientation when the preferred one is
    /// infeasible.
    pub fn is_valid(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let first = slots[self.s_vehicle].at(self.s_rank);
        let second = slots[self.s_vehicle].at(self.s_rank + 1);

        if !instance.vehicle_ok_with_job(self.t_vehicle, first)
            || !instance.vehicle_ok_with_job(self.t_vehicle, second)
        {
            return false;
        }

        let edge_amount = instance.job(first).amount() + instance.job(second).amount();
        let load = &state.route_amount(instance, self.t_vehicle) + &edge_amount;
        if !load.fits_within(instance.vehicle(self.t_vehicle).capacity()) {
            return false;
        }

        if !slots[self.s_vehicle].is_valid_removal(instance, self.s_rank, 2) {
            return false;
        }

        let mut orientations: Vec<(bool, Gain)> = [
            (false, self.s_gain + self.normal_t_gain),
            (true, self.s_gain + self.reversed_t_gain),
        ]
        .into_iter()
        .filter(|&(_, gain)| gain > 0)
        .collect();
        orientations.sort_by_key(|&(_, gain)| -gain);

        for (reversed, gain) in orientations {
            let fragment = self.fragment(slots, reversed);
            if slots[self.t_vehicle].is_valid_addition(instance, &fragment, self.t_rank) {
                self.reverse_edge = reversed;
                self.gain = gain;
                return true;
            }
        }
        false
    }

    /// Removes the edge from the source and inserts it into the target.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots, self.reverse_edge);
        slots[self.s_vehicle].replace(instance, self.s_rank, self.s_rank + 2, &[])?;
        slots[self.t_vehicle].replace(instance, self.t_rank, self.t_rank, &fragment)
    }

    /// Both touched vehicles.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
