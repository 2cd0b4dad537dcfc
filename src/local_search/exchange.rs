//! Inter-route single-job exchange.
//!
//! # Algorithm
//!
//! Swaps the job at `s_rank` in the source route with the job at
//! `t_rank` in the target route. Each side's gain is its cached node
//! surround minus the cost of wiring the other side's job into the same
//! slot; the stored gain is the sum.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Swap the job at `s_rank` of route `s_vehicle` with the job at
/// `t_rank` of route `t_vehicle`.
#[derive(Debug)]
pub struct Exchange {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
}

impl Exchange {
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

    /// Prices the swap from the node surrounds.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];
        let s_job = location_at(instance, source, self.s_rank);
        let t_job = location_at(instance, target, self.t_rank);

        let s_new = cost_from(
            instance,
            location_before(instance, source, self.s_rank),
            t_job,
        ) + cost_to(
            instance,
            t_job,
            location_after(instance, source, self.s_rank),
        );
        let t_new = cost_from(
            instance,
            location_before(instance, target, self.t_rank),
            s_job,
        ) + cost_to(
            instance,
            s_job,
            location_after(instance, target, self.t_rank),
        );

        self.gain = state.edge_cost_around_node(self.s_vehicle, self.s_rank) as Gain - s_new as Gain
            + state.edge_cost_around_node(self.t_vehicle, self.t_rank) as Gain
            - t_new as Gain;
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Cross-checks skills, capacity with the swapped amounts, and the
    /// schedules on both routes.
    pub fn is_valid(
        &self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let s_job = slots[self.s_vehicle].at(self.s_rank);
        let t_job = slots[self.t_vehicle].at(self.t_rank);

        if !instance.vehicle_ok_with_job(self.t_vehicle, s_job)
            || !instance.vehicle_ok_with_job(self.s_vehicle, t_job)
        {
            return false;
        }

        let s_load = &(&state.route_amount(instance, self.s_vehicle)
            - instance.job(s_job).amount())
            + instance.job(t_job).amount();
        if !s_load.fits_within(instance.vehicle(self.s_vehicle).capacity()) {
            return false;
        }
        let t_load = &(&state.route_amount(instance, self.t_vehicle)
            - instance.job(t_job).amount())
            + instance.job(s_job).amount();
        if !t_load.fits_within(instance.vehicle(self.t_vehicle).capacity()) {
            return false;
        }

        slots[self.s_vehicle].is_valid_replacement(
            instance,
            self.s_rank,
            self.s_rank + 1,
            &[t_job],
        ) && slots[self.t_vehicle].is_valid_replacement(
            instance,
            self.t_rank,
            self.t_rank + 1,
            &[s_job],
        )
    }

    /// Swaps the two jobs.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let s_job = slots[self.s_vehicle].at(self.s_rank);
        let t_job = slots[self.t_vehicle].at(self.t_rank);
        slots[self.s_vehicle].replace(instance, self.s_rank, self.s_rank + 1, &[t_job])?;
        slots[self.t_vehicle].replace(instance, self.t_rank, self.t_rank + 1, &[s_job])
    }

    /// Both touched vehicles.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_search::testing::{line_instance, setup, skill_instance, solution_cost};

    #[test]
    fn test_exchange_gain_matches_cost_delta() {
        // Each route holds one job that belongs to the other's side.
        let instance = line_instance(&[0, 1, 10, 2, 9], &[4, 4]);
        let (mut slots, state) = setup(&instance, &[&[0, 1], &[2, 3]]);

        let mut mv = Exchange::new(0, 1, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert!(mv.gain() > 0);
        assert!(mv.is_valid(&instance, &state, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[0, 2]);
        assert_eq!(slots[1].jobs(), &[1, 3]);
    }

    #[test]
    fn test_exchange_zero_gain_for_equivalent_swap() {
        // Jobs at mirrored coordinates: swapping changes nothing.
        let instance = line_instance(&[0, 1, 1], &[2, 2]);
        let (slots, state) = setup(&instance, &[&[0], &[1]]);

        let mut mv = Exchange::new(0, 0, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert_eq!(mv.gain(), 0);
    }

    #[test]
    fn test_exchange_rejects_skill_mismatch() {
        let (instance, slots, state) = skill_instance();

        // Job 0 requires a skill only vehicle 0 has.
        let mut mv = Exchange::new(0, 0, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert!(!mv.is_valid(&instance, &state, &slots));
    }
}
