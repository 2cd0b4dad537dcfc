//! Inter-route head-for-tail exchange with reversal.
//!
//! # Algorithm
//!
//! Cuts the source route after `s_rank` and the target route after
//! `t_rank`, then appends the reversed target head to the source head,
//! while the reversed source tail takes the target head's place in front
//! of the target tail. Both moved fragments flip direction, so their
//! internal cost is repriced from the cached forward/backward cumulative
//! route costs rather than rescanned.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_at};

/// Reconnect the head of route `s_vehicle` (up to `s_rank`) with the
/// reversed head of route `t_vehicle` (up to `t_rank`); the reversed
/// source tail joins the target tail.
#[derive(Debug)]
pub struct ReverseTwoOpt {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
}

impl ReverseTwoOpt {
    /// Creates the move. Both ranks address existing jobs.
    pub fn new(s_vehicle: usize, s_rank: usize, t_vehicle: usize, t_rank: usize) -> Self {
        Self {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: 0,
        }
    }

    /// Prices both rebuilt routes against the current ones using the
    /// cumulative cost caches.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];
        let s_vehicle = instance.vehicle(self.s_vehicle);
        let t_vehicle = instance.vehicle(self.t_vehicle);
        let s_last = source.len() - 1;
        let t_last = target.len() - 1;

        let s_first_loc = location_at(instance, source, 0);
        let t_first_loc = location_at(instance, target, 0);
        let s_last_loc = location_at(instance, source, s_last);
        let t_last_loc = location_at(instance, target, t_last);

        let before = cost_from(instance, s_vehicle.start(), s_first_loc)
            + state.fwd_cost(self.s_vehicle, s_last)
            + cost_to(instance, s_last_loc, s_vehicle.end())
            + cost_from(instance, t_vehicle.start(), t_first_loc)
            + state.fwd_cost(self.t_vehicle, t_last)
            + cost_to(instance, t_last_loc, t_vehicle.end());

        // New source route: head of S, then the reversed head of T.
        let after_s = cost_from(instance, s_vehicle.start(), s_first_loc)
            + state.fwd_cost(self.s_vehicle, self.s_rank)
            + instance.cost(
                location_at(instance, source, self.s_rank),
                location_at(instance, target, self.t_rank),
            )
            + state.bwd_cost(self.t_vehicle, self.t_rank)
            + cost_to(instance, t_first_loc, s_vehicle.end());

        // New target route: reversed tail of S, then the tail of T.
        let s_has_tail = self.s_rank < s_last;
        let t_has_tail = self.t_rank < t_last;
        let after_t = match (s_has_tail, t_has_tail) {
            (true, true) => {
                cost_from(instance, t_vehicle.start(), s_last_loc)
                    + state.bwd_cost(self.s_vehicle, s_last)
                    - state.bwd_cost(self.s_vehicle, self.s_rank + 1)
                    + instance.cost(
                        location_at(instance, source, self.s_rank + 1),
                        location_at(instance, target, self.t_rank + 1),
                    )
                    + state.fwd_cost(self.t_vehicle, t_last)
                    - state.fwd_cost(self.t_vehicle, self.t_rank + 1)
                    + cost_to(instance, t_last_loc, t_vehicle.end())
            }
            (true, false) => {
                cost_from(instance, t_vehicle.start(), s_last_loc)
                    + state.bwd_cost(self.s_vehicle, s_last)
                    - state.bwd_cost(self.s_vehicle, self.s_rank + 1)
                    + cost_to(
                        instance,
                        location_at(instance, source, self.s_rank + 1),
                        t_vehicle.end(),
                    )
            }
            (false, true) => {
                cost_from(
                    instance,
                    t_vehicle.start(),
                    location_at(instance, target, self.t_rank + 1),
                ) + state.fwd_cost(self.t_vehicle, t_last)
                    - state.fwd_cost(self.t_vehicle, self.t_rank + 1)
                    + cost_to(instance, t_last_loc, t_vehicle.end())
            }
            (false, false) => 0,
        };

        self.gain = before as Gain - (after_s + after_t) as Gain;
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The reversed target head entering the source route.
    fn s_fragment(&self, slots: &[RouteSlot]) -> Vec<usize> {
        let mut fragment: Vec<usize> = slots[self.t_vehicle].jobs()[..=self.t_rank].to_vec();
        fragment.reverse();
        fragment
    }

    /// The reversed source tail entering the target route.
    fn t_fragment(&self, slots: &[RouteSlot]) -> Vec<usize> {
        let mut fragment: Vec<usize> = slots[self.s_vehicle].jobs()[self.s_rank + 1..].to_vec();
        fragment.reverse();
        fragment
    }

    /// Skills over both moved fragments, capacity from the prefix
    /// amounts, and the schedule probes.
    pub fn is_valid(
        &self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];
        let t_head = &target.jobs()[..=self.t_rank];
        let s_tail = &source.jobs()[self.s_rank + 1..];

        if t_head
            .iter()
            .any(|&job| !instance.vehicle_ok_with_job(self.s_vehicle, job))
            || s_tail
                .iter()
                .any(|&job| !instance.vehicle_ok_with_job(self.t_vehicle, job))
        {
            return false;
        }

        let s_head_amount = state.fwd_amount(self.s_vehicle, self.s_rank).clone();
        let t_head_amount = state.fwd_amount(self.t_vehicle, self.t_rank).clone();
        let s_tail_amount = &state.route_amount(instance, self.s_vehicle) - &s_head_amount;
        let t_tail_amount = &state.route_amount(instance, self.t_vehicle) - &t_head_amount;
        if !(&s_head_amount + &t_head_amount)
            .fits_within(instance.vehicle(self.s_vehicle).capacity())
            || !(&s_tail_amount + &t_tail_amount)
                .fits_within(instance.vehicle(self.t_vehicle).capacity())
        {
            return false;
        }

        source.is_valid_replacement(
            instance,
            self.s_rank + 1,
            source.len(),
            &self.s_fragment(slots),
        ) && target.is_valid_replacement(instance, 0, self.t_rank + 1, &self.t_fragment(slots))
    }

    /// Rebuilds both routes.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let s_fragment = self.s_fragment(slots);
        let t_fragment = self.t_fragment(slots);
        let s_len = slots[self.s_vehicle].len();
        slots[self.s_vehicle].replace(instance, self.s_rank + 1, s_len, &s_fragment)?;
        slots[self.t_vehicle].replace(instance, 0, self.t_rank + 1, &t_fragment)
    }

    /// Both touched vehicles.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
