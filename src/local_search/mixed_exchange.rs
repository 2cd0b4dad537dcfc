//! Inter-route job-for-edge exchange.
//!
//! # Algorithm
//!
//! Swaps the single job at `s_rank` in the source route with the edge
//! starting at `t_rank` in the target route. The incoming edge may enter
//! the source route reversed; the single job needs no orientation.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Swap the job at `s_rank` of route `s_vehicle` with the edge
/// `(t_rank, t_rank + 1)` of route `t_vehicle`.
#[derive(Debug)]
pub struct MixedExchange {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
    normal_s_gain: Gain,
    reversed_s_gain: Gain,
    t_gain: Gain,
    /// Insert the target edge reversed into the source route.
    reverse_t_edge: bool,
}

impl MixedExchange {
    /// Creates the move. `s_rank` addresses a job; `t_rank` starts an
    /// edge of the target route (`t_rank < t_len - 1`).
    pub fn new(s_vehicle: usize, s_rank: usize, t_vehicle: usize, t_rank: usize) -> Self {
        Self {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: 0,
            normal_s_gain: 0,
            reversed_s_gain: 0,
            t_gain: 0,
            reverse_t_edge: false,
        }
    }

    /// Prices the swap, trying both orientations of the incoming edge.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];

        let s_job = location_at(instance, source, self.s_rank);
        let t_first = location_at(instance, target, self.t_rank);
        let t_second = location_at(instance, target, self.t_rank + 1);

        // Source side: the target edge replaces the single job.
        let prev_s = location_before(instance, source, self.s_rank);
        let next_s = location_after(instance, source, self.s_rank);
        let around_s = state.edge_cost_around_node(self.s_vehicle, self.s_rank) as Gain;

        self.normal_s_gain = around_s
            - cost_from(instance, prev_s, t_first) as Gain
            - instance.cost(t_first, t_second) as Gain
            - cost_to(instance, t_second, next_s) as Gain;
        self.reversed_s_gain = around_s
            - cost_from(instance, prev_s, t_second) as Gain
            - instance.cost(t_second, t_first) as Gain
            - cost_to(instance, t_first, next_s) as Gain;
        self.reverse_t_edge = self.reversed_s_gain > self.normal_s_gain;

        // Target side: the single job replaces the edge.
        let prev_t = location_before(instance, target, self.t_rank);
        let next_t = location_after(instance, target, self.t_rank + 1);
        self.t_gain = state.edge_cost_around_edge(self.t_vehicle, self.t_rank) as Gain
            + instance.cost(t_first, t_second) as Gain
            - cost_from(instance, prev_t, s_job) as Gain
            - cost_to(instance, s_job, next_t) as Gain;

        self.gain = self.normal_s_gain.max(self.reversed_s_gain) + self.t_gain;
    }

    /// The stored gain for the current orientation.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Whether the target edge enters the source route reversed.
    pub fn reverse_t_edge(&self) -> bool {
        self.reverse_t_edge
    }

    /// The edge fragment entering the source route.
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

    /// Skills, capacity with the exchanged amounts, and the schedule
    /// probes, falling back to the other edge orientation when needed.
    pub fn is_valid(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let s_job = slots[self.s_vehicle].at(self.s_rank);
        let t_first = slots[self.t_vehicle].at(self.t_rank);
        let t_second = slots[self.t_vehicle].at(self.t_rank + 1);

        let skills_ok = instance.vehicle_ok_with_job(self.t_vehicle, s_job)
            && instance.vehicle_ok_with_job(self.s_vehicle, t_first)
            && instance.vehicle_ok_with_job(self.s_vehicle, t_second);
        if !skills_ok {
            return false;
        }

        let edge_amount = instance.job(t_first).amount() + instance.job(t_second).amount();
        let s_load = &(&state.route_amount(instance, self.s_vehicle)
            - instance.job(s_job).amount())
            + &edge_amount;
        let t_load = &(&state.route_amount(instance, self.t_vehicle) - &edge_amount)
            + instance.job(s_job).amount();
        if !s_load.fits_within(instance.vehicle(self.s_vehicle).capacity())
            || !t_load.fits_within(instance.vehicle(self.t_vehicle).capacity())
        {
            return false;
        }

        let t_ok = slots[self.t_vehicle].is_valid_replacement(
            instance,
            self.t_rank,
            self.t_rank + 2,
            &[s_job],
        );
        if !t_ok {
            return false;
        }

        // Orientations ordered by gain, preferred first.
        let mut orientations: Vec<(bool, Gain)> = [
            (false, self.normal_s_gain + self.t_gain),
            (true, self.reversed_s_gain + self.t_gain),
        ]
        .into_iter()
        .filter(|&(_, gain)| gain > 0)
        .collect();
        orientations.sort_by_key(|&(_, gain)| -gain);

        for (reverse_t, gain) in orientations {
            let fragment = self.s_fragment(slots, reverse_t);
            if slots[self.s_vehicle].is_valid_replacement(
                instance,
                self.s_rank,
                self.s_rank + 1,
                &fragment,
            ) {
                self.reverse_t_edge = reverse_t;
                self.gain = gain;
                return true;
            }
        }
        false
    }

    /// Swaps the job and the edge with its chosen orientation.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let s_job = slots[self.s_vehicle].at(self.s_rank);
        let fragment = self.s_fragment(slots, self.reverse_t_edge);
        slots[self.s_vehicle].replace(instance, self.s_rank, self.s_rank + 1, &fragment)?;
        slots[self.t_vehicle].replace(instance, self.t_rank, self.t_rank + 2, &[s_job])
    }

    /// Both touched vehicles.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_search::testing::{line_instance, setup, solution_cost};

    #[test]
    fn test_mixed_exchange_gain_matches_cost_delta() {
        // The lone job at 10 belongs with the far cluster; the edge
        // (2, 3) belongs with the near one.
        let instance = line_instance(&[0, 1, 10, 9, 2, 3], &[6, 6]);
        let (mut slots, state) = setup(&instance, &[&[0, 1], &[2, 3, 4]]);

        // Swap the job at coordinate 10 with the edge (2, 3).
        let mut mv = MixedExchange::new(0, 1, 1, 1);
        mv.compute_gain(&instance, &state, &slots);
        assert!(mv.is_valid(&instance, &state, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].len(), 3);
        assert_eq!(slots[1].len(), 2);
    }

    #[test]
    fn test_mixed_exchange_symmetric_prefers_normal() {
        let instance = line_instance(&[0, 1, 2, 3, 4], &[4, 4]);
        let (slots, state) = setup(&instance, &[&[0], &[1, 2, 3]]);

        let mut mv = MixedExchange::new(0, 0, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert!(!mv.reverse_t_edge());
    }
}
