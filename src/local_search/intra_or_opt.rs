//! Intra-route edge relocation (Or-opt).
//!
//! # Algorithm
//!
//! Moves the edge starting at `s_rank` to slot `t_rank` within the same
//! route, possibly reversed. Slot positions are counted before the
//! removal; slots touching the edge itself (`s_rank`, `s_rank + 1`,
//! `s_rank + 2`) reproduce the current route and are rejected at
//! enumeration.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{
    cost_between, insertion_cost, location_at, location_at_slot, location_before, location_after,
};

/// Move the edge `(s_rank, s_rank + 1)` to slot `t_rank` of the same
/// route, possibly reversed.
#[derive(Debug)]
pub struct IntraOrOpt {
    vehicle: usize,
    s_rank: usize,
    t_rank: usize,
    first_rank: usize,
    last_rank: usize,
    gain: Gain,
    s_gain: Gain,
    normal_t_gain: Gain,
    reversed_t_gain: Gain,
    /// Insert the edge reversed.
    reverse_edge: bool,
}

impl IntraOrOpt {
    /// Creates the move. Requires `t_rank < s_rank` or
    /// `t_rank > s_rank + 2`.
    pub fn new(vehicle: usize, s_rank: usize, t_rank: usize) -> Self {
        let (first_rank, last_rank) = if t_rank < s_rank {
            (t_rank, s_rank + 2)
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
        let route = &slots[self.vehicle];
        let first = location_at(instance, route, self.s_rank);
        let second = location_at(instance, route, self.s_rank + 1);

        self.s_gain = state.edge_cost_around_edge(self.vehicle, self.s_rank) as Gain
            + instance.cost(first, second) as Gain
            - cost_between(
                instance,
                location_before(instance, route, self.s_rank),
                location_after(instance, route, self.s_rank + 1),
            ) as Gain;

        // Both insertion neighbours lie outside the moved edge.
        let prev_t = location_before(instance, route, self.t_rank);
        let at_t = location_at_slot(instance, route, self.t_rank);
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

    /// The re-spliced span with the edge moved (and oriented) inside it.
    fn fragment(&self, slots: &[RouteSlot], reversed: bool) -> Vec<usize> {
        let jobs = slots[self.vehicle].jobs();
        let edge = if reversed {
            [jobs[self.s_rank + 1], jobs[self.s_rank]]
        } else {
            [jobs[self.s_rank], jobs[self.s_rank + 1]]
        };
        let mut fragment = Vec::with_capacity(self.last_rank - self.first_rank);
        if self.t_rank < self.s_rank {
            fragment.extend_from_slice(&edge);
            fragment.extend_from_slice(&jobs[self.t_rank..self.s_rank]);
        } else {
            fragment.extend_from_slice(&jobs[self.s_rank + 2..self.t_rank]);
            fragment.extend_from_slice(&edge);
        }
        fragment
    }

    /// Schedule check with orientation fallback.
    pub fn is_valid(&mut self, instance: &Instance, slots: &[RouteSlot]) -> bool {
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
            if slots[self.vehicle].is_valid_replacement(
                instance,
                self.first_rank,
                self.last_rank,
                &fragment,
            ) {
                self.reverse_edge = reversed;
                self.gain = gain;
                return true;
            }
        }
        false
    }

    /// Re-splices the span.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots, self.reverse_edge);
        slots[self.vehicle].replace(instance, self.first_rank, self.last_rank, &fragment)
    }

    /// The single touched vehicle.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_search::testing::{line_instance, setup, solution_cost};

    #[test]
    fn test_intra_or_opt_forward() {
        // The edge at coordinates (4, 5) is visited before the jobs at
        // 1 and 2; moving it to the route end sorts the line.
        let instance = line_instance(&[0, 4, 5, 1, 2], &[8]);
        let (mut slots, state) = setup(&instance, &[&[0, 1, 2, 3]]);

        let mut mv = IntraOrOpt::new(0, 0, 4);
        mv.compute_gain(&instance, &state, &slots);
        assert!(mv.gain() > 0);
        assert!(mv.is_valid(&instance, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[2, 3, 0, 1]);
    }

    #[test]
    fn test_intra_or_opt_backward() {
        let instance = line_instance(&[0, 3, 4, 1, 2], &[8]);
        let (mut slots, state) = setup(&instance, &[&[0, 1, 2, 3]]);

        // Move the edge at positions (2, 3) to the route head.
        let mut mv = IntraOrOpt::new(0, 2, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert!(mv.gain() > 0);

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[2, 3, 0, 1]);
    }

    #[test]
    fn test_intra_or_opt_symmetric_prefers_normal() {
        let instance = line_instance(&[0, 1, 2, 3, 4], &[8]);
        let (slots, state) = setup(&instance, &[&[0, 1, 2, 3]]);

        let mut mv = IntraOrOpt::new(0, 0, 4);
        mv.compute_gain(&instance, &state, &slots);
        assert!(!mv.reverse_edge());
    }
}
