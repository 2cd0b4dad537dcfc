//! Shared operator machinery.
//!
//! Every neighborhood move follows the same four-phase contract:
//! construct, compute gain, check validity, apply. Gains are priced from
//! the solution-state caches and matrix lookups alone (no route
//! mutation); validity covers skills, capacity on every touched route,
//! and the schedule probes of time-window routes. A move is only
//! validated when its gain is positive, and only applied when valid.
//!
//! [`Move`] wraps the thirteen operator kinds in one enum so the driver
//! dispatches on the variant rather than through a virtual table.

use anyhow::Result;

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::{Cost, Gain};

use super::cross_exchange::CrossExchange;
use super::exchange::Exchange;
use super::intra_cross_exchange::IntraCrossExchange;
use super::intra_exchange::IntraExchange;
use super::intra_mixed_exchange::IntraMixedExchange;
use super::intra_or_opt::IntraOrOpt;
use super::intra_relocate::IntraRelocate;
use super::intra_two_opt::IntraTwoOpt;
use super::mixed_exchange::MixedExchange;
use super::or_opt::OrOpt;
use super::relocate::Relocate;
use super::reverse_two_opt::ReverseTwoOpt;
use super::two_opt::TwoOpt;

/// Matrix location of the job at `rank`.
pub(crate) fn location_at(instance: &Instance, slot: &RouteSlot, rank: usize) -> usize {
    instance.job(slot.at(rank)).location()
}

/// Location preceding slot `rank`: the job at `rank - 1`, or the
/// vehicle's start at the route head. Valid for `rank` in `0..=len`.
pub(crate) fn location_before(
    instance: &Instance,
    slot: &RouteSlot,
    rank: usize,
) -> Option<usize> {
    if rank == 0 {
        instance.vehicle(slot.vehicle()).start()
    } else {
        Some(location_at(instance, slot, rank - 1))
    }
}

/// Location following the job at `rank`: the job at `rank + 1`, or the
/// vehicle's end at the route tail.
pub(crate) fn location_after(instance: &Instance, slot: &RouteSlot, rank: usize) -> Option<usize> {
    if rank + 1 >= slot.len() {
        instance.vehicle(slot.vehicle()).end()
    } else {
        Some(location_at(instance, slot, rank + 1))
    }
}

/// Location occupying slot `rank`: the job currently at `rank`, or the
/// vehicle's end past the tail. Valid for `rank` in `0..=len`.
pub(crate) fn location_at_slot(instance: &Instance, slot: &RouteSlot, rank: usize) -> Option<usize> {
    if rank < slot.len() {
        Some(location_at(instance, slot, rank))
    } else {
        instance.vehicle(slot.vehicle()).end()
    }
}

/// Travel cost from an optional location, zero when absent.
pub(crate) fn cost_from(instance: &Instance, from: Option<usize>, to: usize) -> Cost {
    from.map_or(0, |f| instance.cost(f, to))
}

/// Travel cost to an optional location, zero when absent.
pub(crate) fn cost_to(instance: &Instance, from: usize, to: Option<usize>) -> Cost {
    to.map_or(0, |t| instance.cost(from, t))
}

/// Travel cost between two optional locations, zero when either is
/// absent.
pub(crate) fn cost_between(instance: &Instance, from: Option<usize>, to: Option<usize>) -> Cost {
    match (from, to) {
        (Some(f), Some(t)) => instance.cost(f, t),
        _ => 0,
    }
}

/// Cost of inserting the oriented location sequence `fragment` between
/// two optional neighbours, including the fragment's internal edges and
/// minus the direct neighbour connection it replaces.
pub(crate) fn insertion_cost(
    instance: &Instance,
    prev: Option<usize>,
    fragment: &[usize],
    next: Option<usize>,
) -> Gain {
    let mut added: Cost = 0;
    if let (Some(&first), Some(&last)) = (fragment.first(), fragment.last()) {
        added += cost_from(instance, prev, first);
        for pair in fragment.windows(2) {
            added += instance.cost(pair[0], pair[1]);
        }
        added += cost_to(instance, last, next);
    }
    added as Gain - cost_between(instance, prev, next) as Gain
}

/// Full travel cost of one route, including start/end legs.
pub(crate) fn route_cost(instance: &Instance, slot: &RouteSlot) -> Cost {
    let vehicle = instance.vehicle(slot.vehicle());
    let jobs = slot.jobs();
    let mut cost = 0;
    if let (Some(&first), Some(&last)) = (jobs.first(), jobs.last()) {
        cost += cost_from(instance, vehicle.start(), instance.job(first).location());
        for pair in jobs.windows(2) {
            cost += instance.cost(
                instance.job(pair[0]).location(),
                instance.job(pair[1]).location(),
            );
        }
        cost += cost_to(instance, instance.job(last).location(), vehicle.end());
    }
    cost
}

/// Total travel cost over all routes.
pub(crate) fn solution_cost(instance: &Instance, slots: &[RouteSlot]) -> Cost {
    slots.iter().map(|slot| route_cost(instance, slot)).sum()
}

/// One candidate move of any operator kind.
///
/// Variants are ordered by operator-class priority, the first tie-break
/// when two candidates share the best gain.
#[derive(Debug)]
pub enum Move {
    Exchange(Exchange),
    CrossExchange(CrossExchange),
    MixedExchange(MixedExchange),
    TwoOpt(TwoOpt),
    ReverseTwoOpt(ReverseTwoOpt),
    Relocate(Relocate),
    OrOpt(OrOpt),
    IntraExchange(IntraExchange),
    IntraCrossExchange(IntraCrossExchange),
    IntraMixedExchange(IntraMixedExchange),
    IntraRelocate(IntraRelocate),
    IntraOrOpt(IntraOrOpt),
    IntraTwoOpt(IntraTwoOpt),
}

impl Move {
    /// The gain stored by `compute_gain` (and possibly lowered by a
    /// validity-driven orientation fallback).
    pub fn gain(&self) -> Gain {
        match self {
            Move::Exchange(op) => op.gain(),
            Move::CrossExchange(op) => op.gain(),
            Move::MixedExchange(op) => op.gain(),
            Move::TwoOpt(op) => op.gain(),
            Move::ReverseTwoOpt(op) => op.gain(),
            Move::Relocate(op) => op.gain(),
            Move::OrOpt(op) => op.gain(),
            Move::IntraExchange(op) => op.gain(),
            Move::IntraCrossExchange(op) => op.gain(),
            Move::IntraMixedExchange(op) => op.gain(),
            Move::IntraRelocate(op) => op.gain(),
            Move::IntraOrOpt(op) => op.gain(),
            Move::IntraTwoOpt(op) => op.gain(),
        }
    }

    /// Checks every constraint the move could break. May adjust reversal
    /// hints (and lower the stored gain) when the preferred orientation
    /// is infeasible on a time-window route.
    pub fn is_valid(
        &mut self,
        instance: &Instance,
        state: &SolutionState,
        slots: &[RouteSlot],
    ) -> bool {
        match self {
            Move::Exchange(op) => op.is_valid(instance, state, slots),
            Move::CrossExchange(op) => op.is_valid(instance, state, slots),
            Move::MixedExchange(op) => op.is_valid(instance, state, slots),
            Move::TwoOpt(op) => op.is_valid(instance, state, slots),
            Move::ReverseTwoOpt(op) => op.is_valid(instance, state, slots),
            Move::Relocate(op) => op.is_valid(instance, state, slots),
            Move::OrOpt(op) => op.is_valid(instance, state, slots),
            Move::IntraExchange(op) => op.is_valid(instance, slots),
            Move::IntraCrossExchange(op) => op.is_valid(instance, slots),
            Move::IntraMixedExchange(op) => op.is_valid(instance, slots),
            Move::IntraRelocate(op) => op.is_valid(instance, slots),
            Move::IntraOrOpt(op) => op.is_valid(instance, slots),
            Move::IntraTwoOpt(op) => op.is_valid(instance, slots),
        }
    }

    /// Mutates the touched routes.
    pub fn apply(&self, instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
        match self {
            Move::Exchange(op) => op.apply(instance, slots),
            Move::CrossExchange(op) => op.apply(instance, slots),
            Move::MixedExchange(op) => op.apply(instance, slots),
            Move::TwoOpt(op) => op.apply(instance, slots),
            Move::ReverseTwoOpt(op) => op.apply(instance, slots),
            Move::Relocate(op) => op.apply(instance, slots),
            Move::OrOpt(op) => op.apply(instance, slots),
            Move::IntraExchange(op) => op.apply(instance, slots),
            Move::IntraCrossExchange(op) => op.apply(instance, slots),
            Move::IntraMixedExchange(op) => op.apply(instance, slots),
            Move::IntraRelocate(op) => op.apply(instance, slots),
            Move::IntraOrOpt(op) => op.apply(instance, slots),
            Move::IntraTwoOpt(op) => op.apply(instance, slots),
        }
    }

    /// Vehicles whose solution-state caches must be rebuilt after apply.
    pub fn update_candidates(&self) -> Vec<usize> {
        match self {
            Move::Exchange(op) => op.update_candidates(),
            Move::CrossExchange(op) => op.update_candidates(),
            Move::MixedExchange(op) => op.update_candidates(),
            Move::TwoOpt(op) => op.update_candidates(),
            Move::ReverseTwoOpt(op) => op.update_candidates(),
            Move::Relocate(op) => op.update_candidates(),
            Move::OrOpt(op) => op.update_candidates(),
            Move::IntraExchange(op) => op.update_candidates(),
            Move::IntraCrossExchange(op) => op.update_candidates(),
            Move::IntraMixedExchange(op) => op.update_candidates(),
            Move::IntraRelocate(op) => op.update_candidates(),
            Move::IntraOrOpt(op) => op.update_candidates(),
            Move::IntraTwoOpt(op) => op.update_candidates(),
        }
    }
}
