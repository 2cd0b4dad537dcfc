//! Route representations.
//!
//! - [`RawRoute`] — plain job sequence for capacity-only problems
//! - [`TwRoute`] — sequence plus time-window schedule caches
//! - [`RouteSlot`] — the per-vehicle union of the two

mod raw;
mod tw;

pub use raw::RawRoute;
pub use tw::TwRoute;

use anyhow::Result;

use crate::models::{Amount, Instance};

/// The route representation held in one vehicle's slot.
///
/// A descent uses one variant for every vehicle: `Raw` when the instance
/// carries no time windows, `Tw` otherwise. Validity checks dispatch on
/// the variant: the `Raw` arm is the "always feasible" time validator,
/// the `Tw` arm delegates to the schedule probes.
#[derive(Debug, Clone)]
pub enum RouteSlot {
    /// Capacity-only route.
    Raw(RawRoute),
    /// Time-window-aware route.
    Tw(TwRoute),
}

impl RouteSlot {
    /// Creates the slot variant matching the instance for the given
    /// vehicle index.
    pub fn for_instance(instance: &Instance, vehicle: usize) -> Self {
        if instance.has_time_windows() {
            RouteSlot::Tw(TwRoute::new(vehicle))
        } else {
            RouteSlot::Raw(RawRoute::new(vehicle))
        }
    }

    /// Vehicle index this route belongs to.
    pub fn vehicle(&self) -> usize {
        match self {
            RouteSlot::Raw(route) => route.vehicle(),
            RouteSlot::Tw(route) => route.vehicle(),
        }
    }

    /// Number of jobs in the route.
    pub fn len(&self) -> usize {
        match self {
            RouteSlot::Raw(route) => route.len(),
            RouteSlot::Tw(route) => route.len(),
        }
    }

    /// Returns `true` if the route services no jobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Job rank at the given position.
    pub fn at(&self, rank: usize) -> usize {
        match self {
            RouteSlot::Raw(route) => route.at(rank),
            RouteSlot::Tw(route) => route.at(rank),
        }
    }

    /// Job ranks in visit order.
    pub fn jobs(&self) -> &[usize] {
        match self {
            RouteSlot::Raw(route) => route.jobs(),
            RouteSlot::Tw(route) => route.jobs(),
        }
    }

    /// Probe: would replacing positions `first..last` with `jobs` keep
    /// the schedule feasible? Always `true` for capacity-only routes.
    pub fn is_valid_replacement(
        &self,
        instance: &Instance,
        first: usize,
        last: usize,
        jobs: &[usize],
    ) -> bool {
        match self {
            RouteSlot::Raw(_) => true,
            RouteSlot::Tw(route) => route.is_valid_replacement(instance, first, last, jobs),
        }
    }

    /// Probe: can `jobs` be inserted contiguously before `rank`?
    pub fn is_valid_addition(&self, instance: &Instance, jobs: &[usize], rank: usize) -> bool {
        self.is_valid_replacement(instance, rank, rank, jobs)
    }

    /// Probe: can positions `rank..rank + count` be removed?
    pub fn is_valid_removal(&self, instance: &Instance, rank: usize, count: usize) -> bool {
        self.is_valid_replacement(instance, rank, rank + count, &[])
    }

    /// Probe: does the load stay within capacity after replacing
    /// positions `first..last` with jobs summing to `added`?
    pub fn fits_capacity_after(
        &self,
        instance: &Instance,
        first: usize,
        last: usize,
        added: &Amount,
    ) -> bool {
        match self {
            RouteSlot::Raw(route) => {
                let mut load = Amount::zero(instance.amount_dimension());
                for (rank, &job) in route.jobs().iter().enumerate() {
                    if rank < first || rank >= last {
                        load += instance.job(job).amount();
                    }
                }
                load += added;
                load.fits_within(instance.vehicle(route.vehicle()).capacity())
            }
            RouteSlot::Tw(route) => route.fits_capacity_after(instance, first, last, added),
        }
    }

    /// Replaces positions `first..last` with `jobs`, rebuilding caches
    /// for time-window routes.
    pub fn replace(
        &mut self,
        instance: &Instance,
        first: usize,
        last: usize,
        jobs: &[usize],
    ) -> Result<()> {
        match self {
            RouteSlot::Raw(route) => {
                route.replace_range(first, last, jobs);
                Ok(())
            }
            RouteSlot::Tw(route) => route.replace(instance, first, last, jobs),
        }
    }
}
