//! Intra-route 2-opt (segment reversal).
//!
//! # Algorithm
//!
//! Reverses the positions `s_rank..=t_rank` of one route. The two
//! boundary edges are repriced with fresh matrix lookups; the internal
//! direction change is priced in O(1) from the cached forward/backward
//! cumulative route costs (they differ only on asymmetric matrices).
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A Method for Solving Traveling-Salesman
//! Problems", *Operations Research* 6(6), 791-812.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::Gain;

use super::operator::{cost_from, cost_to, location_after, location_at, location_before};

/// Reverse the span `s_rank..=t_rank` of one route.
#[derive(Debug)]
pub struct IntraTwoOpt {
    vehicle: usize,
    s_rank: usize,
    t_rank: usize,
    gain: Gain,
}

impl IntraTwoOpt {
    /// Creates the move. Requires `s_rank < t_rank`.
    pub fn new(vehicle: usize, s_rank: usize, t_rank: usize) -> Self {
        Self {
            vehicle,
            s_rank,
            t_rank,
            gain: 0,
        }
    }

    /// Prices the two boundary edges and the internal direction change.
    pub fn compute_gain(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) {
        let route = &slots[self.vehicle];
        let first = location_at(instance, route, self.s_rank);
        let last = location_at(instance, route, self.t_rank);
        let prev = location_before(instance, route, self.s_rank);
        let next = location_after(instance, route, self.t_rank);

        let boundary_old = cost_from(instance, prev, first) + cost_to(instance, last, next);
        let boundary_new = cost_from(instance, prev, last) + cost_to(instance, first, next);

        let internal_fwd =
            state.fwd_cost(self.vehicle, self.t_rank) - state.fwd_cost(self.vehicle, self.s_rank);
        let internal_bwd =
            state.bwd_cost(self.vehicle, self.t_rank) - state.bwd_cost(self.vehicle, self.s_rank);

        self.gain = boundary_old as Gain - boundary_new as Gain + internal_fwd as Gain
            - internal_bwd as Gain;
    }

    /// The stored gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The reversed span.
    fn fragment(&self, slots: &[RouteSlot]) -> Vec<usize> {
        let mut fragment = slots[self.vehicle].jobs()[self.s_rank..=self.t_rank].to_vec();
        fragment.reverse();
        fragment
    }

    /// Only the schedule can be violated within one route.
    pub fn is_valid(&self, instance: &Instance, slots: &[RouteSlot]) -> bool {
        slots[self.vehicle].is_valid_replacement(
            instance,
            self.s_rank,
            self.t_rank + 1,
            &self.fragment(slots),
        )
    }

    /// Reverses the span in place.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        let fragment = self.fragment(slots);
        slots[self.vehicle].replace(instance, self.s_rank, self.t_rank + 1, &fragment)
    }

    /// The single touched vehicle.
    pub fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
