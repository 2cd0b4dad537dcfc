//! Inter-route tail exchange (2-opt*).
//!
//! # Algorithm
//!
//! Cuts the source route after `s_rank` and the target route after
//! `t_rank`, then reconnects the source head with the target tail and
//! vice versa. Only two junction edges change, plus the two end legs
//! when a route's new tail ends elsewhere, so the gain needs a fixed
//! number of matrix lookups.
//!
//! # Reference
//!
//! Potvin, J.-Y. & Rousseau, J.-M. (1995). "An Exchange Heuristic for
//! Routeing Problems with Time Windows", *Journal of the Operational
//! Research Society* 46(12).

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_to, location_at};

/// Swap the tails after `s_rank` of route `s_vehicle` and after `t_rank`
/// of route `t_vehicle`.
#[derive(Debug)]
pub struct TwoOpt {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
}

impl TwoOpt {
    /// Creates the move. Both ranks address existing jobs; the exchanged
    /// tails start at `rank + 1` and may be empty (on one side).
    pub fn new(s_vehicle: usize, s_rank: usize, t_vehicle: usize, t_rank: usize) -> Self {
        Self {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: 0,
        }
    }

    /// Prices the reconnection: two junction edges plus the end legs
    /// that move with the tails.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        _state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];
        let s_end = instance.vehicle(self.s_vehicle).end();
        let t_end = instance.vehicle(self.t_vehicle).end();

        let s_cut = location_at(instance, source, self.s_rank);
        let t_cut = location_at(instance, target, self.t_rank);
        let s_has_tail = self.s_rank + 1 < source.len();
        let t_has_tail = self.t_rank + 1 < target.len();
        let s_last = location_at(instance, source, source.len() - 1);
        let t_last = location_at(instance, target, target.len() - 1);

        let before_s = if s_has_tail {
            instance.cost(s_cut, location_at(instance, source, self.s_rank + 1))
                + cost_to(instance, s_last, s_end)
        } else {
            cost_to(instance, s_cut, s_end)
        };
        let before_t = if t_has_tail {
            instance.cost(t_cut, location_at(instance, target, self.t_rank + 1))
                + cost_to(instance, t_last, t_end)
        } else {
            cost_to(instance, t_cut, t_end)
        };

        let after_s = if t_has_tail {
            instance.cost(s_cut, location_at(instance, target, self.t_rank + 1))
                + cost_to(instance, t_last, s_end)
        } else {
            cost_to(instance, s_cut, s_end)
        };
        let after_t = if s_has_tail {
            instance.cost(t_cut, location_at(instance, source, self.s_rank + 1))
                + cost_to(instance, s_last, t_end)
        } else {
            cost_to(instance, t_cut, t_end)
        };

        self.gain = (before_s + before_t) as Gain - (after_s + after_t) as Gain;
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Skills over both exchanged tails, capacity from the prefix
    /// amounts, and the schedule probes.
    pub fn is_valid(
        &self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];
        let s_tail = &source.jobs()[self.s_rank + 1..];
        let t_tail = &target.jobs()[self.t_rank + 1..];

        if t_tail
            .iter()
            .any(|&job| !instance.vehicle_ok_with_job(self.s_vehicle, job))
            || s_tail
                .iter()
                .any(|&job| !instance.vehicle_ok_with_job(self.t_vehicle, job))
        {
            return false;
        }

        let s_head = state.fwd_amount(self.s_vehicle, self.s_rank).clone();
        let t_head = state.fwd_amount(self.t_vehicle, self.t_rank).clone();
        let s_tail_amount = &state.route_amount(instance, self.s_vehicle) - &s_head;
        let t_tail_amount = &state.route_amount(instance, self.t_vehicle) - &t_head;
        if !(&s_head + &t_tail_amount).fits_within(instance.vehicle(self.s_vehicle).capacity())
            || !(&t_head + &s_tail_amount).fits_within(instance.vehicle(self.t_vehicle).capacity())
        {
            return false;
        }

        source.is_valid_replacement(instance, self.s_rank + 1, source.len(), t_tail)
            && target.is_valid_replacement(instance, self.t_rank + 1, target.len(), s_tail)
    }

    /// Exchanges the two tails.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let s_tail: Vec<usize> = slots[self.s_vehicle].jobs()[self.s_rank + 1..].to_vec();
        let t_tail: Vec<usize> = slots[self.t_vehicle].jobs()[self.t_rank + 1..].to_vec();
        let s_len = slots[self.s_vehicle].len();
        let t_len = slots[self.t_vehicle].len();
        slots[self.s_vehicle].replace(instance, self.s_rank + 1, s_len, &t_tail)?;
        slots[self.t_vehicle].replace(instance, self.t_rank + 1, t_len, &s_tail)
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
    fn test_two_opt_moves_tail_to_better_route() {
        // The far tail (11, 10) rides behind the near job; handing it to
        // the route already out at coordinate 2 shortens the first one.
        let instance = line_instance(&[0, 1, 2, 11, 10], &[4, 4]);
        let (mut slots, state) = setup(&instance, &[&[0, 2, 3], &[1]]);

        let mut mv = TwoOpt::new(0, 0, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert_eq!(mv.gain(), 2);
        assert!(mv.is_valid(&instance, &state, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[0]);
        assert_eq!(slots[1].jobs(), &[1, 2, 3]);
    }

    #[test]
    fn test_two_opt_both_tails_nonempty() {
        let instance = line_instance(&[0, 1, 10, 2, 9], &[4, 4]);
        let (mut slots, state) = setup(&instance, &[&[0, 1], &[2, 3]]);

        // Reconnect 1 with 9's tail and 2 with 10's tail.
        let mut mv = TwoOpt::new(0, 0, 1, 0);
        mv.compute_gain(&instance, &state, &slots);

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[0, 3]);
        assert_eq!(slots[1].jobs(), &[2, 1]);
    }

    #[test]
    fn test_two_opt_rejects_capacity_overflow() {
        let instance = line_instance(&[0, 1, 2, 3, 4], &[1, 3]);
        let (slots, state) = setup(&instance, &[&[0], &[1, 2, 3]]);

        // Handing the two-job tail to the capacity-1 vehicle must fail.
        let mut mv = TwoOpt::new(1, 0, 0, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert!(!mv.is_valid(&instance, &state, &slots));
    }
}
