//! Inter-route single-job relocation.
//!
//! # Algorithm
//!
//! Moves the job at `s_rank` in the source route into slot `t_rank` of
//! the target route. The gain splits into the source's removal gain
//! (priced from the cached node surround) and the target's insertion
//! cost:
//!
//! ```text
//! gain = around_node(s_rank) - cost(prev_s, next_s)
//!      - [cost(prev_t, job) + cost(job, at_t) - cost(prev_t, at_t)]
//! ```

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{
    cost_between, insertion_cost, location_at, location_at_slot, location_before, location_after,
};

/// Move the job at `s_rank` of route `s_vehicle` into slot `t_rank` of
/// route `t_vehicle`.
#[derive(Debug)]
pub struct Relocate {
    s_vehicle: usize,
    s_rank: usize,
    t_vehicle: usize,
    t_rank: usize,
    gain: Gain,
}

impl Relocate {
    /// Creates the move. `s_rank` addresses a job of the source route;
    /// `t_rank` addresses an insertion slot (`0..=len`) of the target.
    pub fn new(s_vehicle: usize, s_rank: usize, t_vehicle: usize, t_rank: usize) -> Self {
        Self {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: 0,
        }
    }

    /// Prices the move from the caches; no route is touched.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let source = &slots[self.s_vehicle];
        let target = &slots[self.t_vehicle];
        let job = location_at(instance, source, self.s_rank);

        let prev_s = location_before(instance, source, self.s_rank);
        let next_s = location_after(instance, source, self.s_rank);
        let removal_gain = state.edge_cost_around_node(self.s_vehicle, self.s_rank) as Gain
            - cost_between(instance, prev_s, next_s) as Gain;

        let prev_t = location_before(instance, target, self.t_rank);
        let at_t = location_at_slot(instance, target, self.t_rank);
        self.gain = removal_gain - insertion_cost(instance, prev_t, &[job], at_t);
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Skills and capacity on the target, schedule feasibility on both
    /// routes.
    pub fn is_valid(
        &self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        let job_rank = slots[self.s_vehicle].at(self.s_rank);
        if !instance.vehicle_ok_with_job(self.t_vehicle, job_rank) {
            return false;
        }

        let load = &state.route_amount(instance, self.t_vehicle) + instance.job(job_rank).amount();
        if !load.fits_within(instance.vehicle(self.t_vehicle).capacity()) {
            return false;
        }

        slots[self.t_vehicle].is_valid_addition(instance, &[job_rank], self.t_rank)
            && slots[self.s_vehicle].is_valid_removal(instance, self.s_rank, 1)
    }

    /// Removes the job from the source and inserts it into the target.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let job_rank = slots[self.s_vehicle].at(self.s_rank);
        slots[self.s_vehicle].replace(instance, self.s_rank, self.s_rank + 1, &[])?;
        slots[self.t_vehicle].replace(instance, self.t_rank, self.t_rank, &[job_rank])
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
    fn test_relocate_gain_matches_cost_delta() {
        // The job at coordinate 3 detours the second vehicle's trip to
        // coordinate -10; it belongs at the end of the first route.
        let instance = line_instance(&[0, 1, 2, 3, -10], &[4, 4]);
        let (mut slots, state) = setup(&instance, &[&[0, 1], &[3, 2]]);

        let mut mv = Relocate::new(1, 1, 0, 2);
        mv.compute_gain(&instance, &state, &slots);
        assert_eq!(mv.gain(), 4);
        assert!(mv.is_valid(&instance, &state, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[0, 1, 2]);
        assert_eq!(slots[1].jobs(), &[3]);
    }

    #[test]
    fn test_relocate_into_empty_route() {
        let instance = line_instance(&[0, 1, 2], &[2, 2]);
        let (mut slots, state) = setup(&instance, &[&[0, 1], &[]]);

        let mut mv = Relocate::new(0, 1, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        assert!(mv.is_valid(&instance, &state, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[1].jobs(), &[1]);
    }

    #[test]
    fn test_relocate_rejects_capacity() {
        let instance = line_instance(&[0, 1, 2, 3], &[2, 1]);
        let (slots, state) = setup(&instance, &[&[0, 1], &[2]]);

        let mut mv = Relocate::new(0, 0, 1, 0);
        mv.compute_gain(&instance, &state, &slots);
        // Target already carries one unit with capacity 1.
        assert!(!mv.is_valid(&instance, &state, &slots));
    }

    #[test]
    fn test_relocate_gain_in_middle_slot() {
        let instance = line_instance(&[0, 5, 1, 2, 6], &[4, 4]);
        let (mut slots, state) = setup(&instance, &[&[1, 2], &[0, 3]]);

        // Move the job at location 5 between locations 1 and 2.
        let mut mv = Relocate::new(1, 0, 0, 1);
        mv.compute_gain(&instance, &state, &slots);
        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
    }
}
