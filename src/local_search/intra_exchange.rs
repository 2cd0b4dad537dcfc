//! Intra-route single-job exchange.
//!
//! # Algorithm
//!
//! Swaps two jobs within one route. The ranks are kept in canonical
//! order (`first_rank < last_rank`) and must leave at least one position
//! between them, so the two node surrounds never alias; swapping
//! adjacent jobs is the two-position reversal already covered by the
//! intra-route 2-opt.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Swap the jobs at `first_rank` and `last_rank` of one route.
#[derive(Debug)]
pub struct IntraExchange {
    vehicle: usize,
    first_rank: usize,
    last_rank: usize,
    gain: Gain,
}

impl IntraExchange {
    /// Creates the move. Callers pass ranks in any order; they are
    /// canonicalized so `first_rank < last_rank`. The ranks must differ
    /// by at least two.
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
        }
    }

    /// Prices the swap from the two node surrounds.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let route = &slots[self.vehicle];
        let first_job = location_at(instance, route, self.first_rank);
        let last_job = location_at(instance, route, self.last_rank);

        let old = state.edge_cost_around_node(self.vehicle, self.first_rank)
            + state.edge_cost_around_node(self.vehicle, self.last_rank);
        let new = cost_from(
            instance,
            location_before(instance, route, self.first_rank),
            last_job,
        ) + cost_to(
            instance,
            last_job,
            location_after(instance, route, self.first_rank),
        ) + cost_from(
            instance,
            location_before(instance, route, self.last_rank),
            first_job,
        ) + cost_to(
            instance,
            first_job,
            location_after(instance, route, self.last_rank),
        );

        self.gain = old as Gain - new as Gain;
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The route span with its end jobs swapped.
    fn fragment(&self, slots: &[RouteSlot]) -> Vec<usize> {
        let jobs = slots[self.vehicle].jobs();
        let mut fragment = jobs[self.first_rank..=self.last_rank].to_vec();
        fragment.swap(0, self.last_rank - self.first_rank);
        fragment
    }

    /// Capacity and skills are unaffected within one route; only the
    /// schedule needs checking.
    pub fn is_valid(&self, instance: &Instance, slots: &[RouteSlot]) -> bool {
        slots[self.vehicle].is_valid_replacement(
            instance,
            self.first_rank,
            self.last_rank + 1,
            &self.fragment(slots),
        )
    }

    /// Swaps the two jobs.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots);
        slots[self.vehicle].replace(instance, self.first_rank, self.last_rank + 1, &fragment)
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
    fn test_intra_exchange_fixes_transposition() {
        // Visiting order 1, 4, 3, 2, 5 should become 1, 2, 3, 4, 5.
        let instance = line_instance(&[0, 1, 2, 3, 4, 5], &[8]);
        let (mut slots, state) = setup(&instance, &[&[0, 3, 2, 1, 4]]);

        let mut mv = IntraExchange::new(0, 1, 3);
        mv.compute_gain(&instance, &state, &slots);
        assert!(mv.gain() > 0);
        assert!(mv.is_valid(&instance, &slots));

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_intra_exchange_canonical_order() {
        let instance = line_instance(&[0, 1, 2, 3, 4, 5], &[8]);
        let (slots, state) = setup(&instance, &[&[0, 3, 2, 1, 4]]);

        let mut forward = IntraExchange::new(0, 1, 3);
        let mut backward = IntraExchange::new(0, 3, 1);
        forward.compute_gain(&instance, &state, &slots);
        backward.compute_gain(&instance, &state, &slots);
        assert_eq!(forward.gain(), backward.gain());
    }

    #[test]
    fn test_intra_exchange_at_route_ends() {
        let instance = line_instance(&[0, 5, 2, 3, 1], &[8]);
        let (mut slots, state) = setup(&instance, &[&[0, 1, 2, 3]]);

        // Swap the first and last jobs (coordinates 5 and 1).
        let mut mv = IntraExchange::new(0, 0, 3);
        mv.compute_gain(&instance, &state, &slots);

        let before = solution_cost(&instance, &slots);
        mv.apply(&instance, &mut slots).expect("apply");
        let after = solution_cost(&instance, &slots);
        assert_eq!(mv.gain(), before as Gain - after as Gain);
        assert_eq!(slots[0].jobs(), &[3, 1, 2, 0]);
    }
}
