//! Time-window-aware route representation.
//!
//! # Algorithm
//!
//! The route keeps, for every position `k`, the earliest feasible
//! service start `earliest[k]` (propagated forward from the vehicle's
//! working-hours start) and the latest feasible service start
//! `latest[k]` (propagated backward from the working-hours end). With
//! both arrays in place, "would this edit keep the route feasible?" is
//! answered by walking only the edited span forward and testing the
//! arrival at the first untouched position against its `latest` bound,
//! with no full rescan per candidate.
//!
//! Mutations splice the underlying sequence and rebuild every cache in
//! O(n). The probe-before-apply discipline of the local search keeps
//! this amortized: each enumerated candidate only probes, and at most
//! one edit is applied per descent iteration.
//!
//! # Reference
//!
//! Savelsbergh, M.W.P. (1992). "The Vehicle Routing Problem with Time
//! Windows: Minimizing Route Duration", *ORSA Journal on Computing* 4(2).

use anyhow::{anyhow, bail, Result};

use crate::models::{Amount, Instance};
use crate::Duration;

/// A route whose feasibility is governed by time windows.
///
/// Wraps the job sequence with the forward/backward schedule caches and
/// per-position load. Probe methods answer feasibility questions without
/// mutating; mutation methods splice the sequence and rebuild the caches,
/// failing loudly if the result is infeasible (the caller must have
/// probed first).
#[derive(Debug, Clone)]
pub struct TwRoute {
    vehicle: usize,
    jobs: Vec<usize>,
    earliest: Vec<Duration>,
    latest: Vec<Duration>,
    tw_rank: Vec<usize>,
    current_load: Vec<Amount>,
}

impl TwRoute {
    /// Creates an empty route for the given vehicle index.
    pub fn new(vehicle: usize) -> Self {
        Self {
            vehicle,
            jobs: Vec::new(),
            earliest: Vec::new(),
            latest: Vec::new(),
            tw_rank: Vec::new(),
            current_load: Vec::new(),
        }
    }

    /// Vehicle index this route belongs to.
    pub fn vehicle(&self) -> usize {
        self.vehicle
    }

    /// Number of jobs in the route.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if the route services no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job rank at the given position.
    pub fn at(&self, rank: usize) -> usize {
        self.jobs[rank]
    }

    /// Job ranks in visit order.
    pub fn jobs(&self) -> &[usize] {
        &self.jobs
    }

    /// Earliest feasible service start at the given position.
    pub fn earliest(&self, rank: usize) -> Duration {
        self.earliest[rank]
    }

    /// Latest feasible service start at the given position.
    pub fn latest(&self, rank: usize) -> Duration {
        self.latest[rank]
    }

    /// Which of the job's time windows the schedule currently uses.
    pub fn tw_rank(&self, rank: usize) -> usize {
        self.tw_rank[rank]
    }

    /// Cumulative amount after servicing the given position.
    pub fn load_at(&self, rank: usize) -> &Amount {
        &self.current_load[rank]
    }

    /// Total amount carried over the whole route.
    pub fn total_load(&self, instance: &Instance) -> Amount {
        match self.current_load.last() {
            Some(load) => load.clone(),
            None => Amount::zero(instance.amount_dimension()),
        }
    }

    /// Travel cost from an optional location, zero when absent.
    fn travel(instance: &Instance, from: Option<usize>, to: usize) -> Duration {
        from.map_or(0, |f| instance.cost(f, to))
    }

    /// Departure time and location heading into the slot before `rank`:
    /// the vehicle start for `rank == 0`, otherwise the end of service
    /// at `rank - 1`.
    fn departure_before(&self, instance: &Instance, rank: usize) -> (Duration, Option<usize>) {
        if rank == 0 {
            let vehicle = instance.vehicle(self.vehicle);
            (vehicle.time_window().start(), vehicle.start())
        } else {
            let job = instance.job(self.jobs[rank - 1]);
            (self.earliest[rank - 1] + job.service(), Some(job.location()))
        }
    }

    /// Core probe: can positions `first..last` be replaced by `jobs`
    /// without breaking the schedule?
    ///
    /// Walks forward through the replacement picking the earliest usable
    /// window of each job, then tests the arrival at position `last`
    /// against its cached `latest` bound (or the working-hours end when
    /// the edit reaches the route tail). Time windows only; capacity is
    /// checked separately.
    pub fn is_valid_replacement(
        &self,
        instance: &Instance,
        first: usize,
        last: usize,
        jobs: &[usize],
    ) -> bool {
        let (mut time, mut prev) = self.departure_before(instance, first);

        for &rank in jobs {
            let job = instance.job(rank);
            let arrival = time + Self::travel(instance, prev, job.location());
            match job.earliest_service_start(arrival) {
                Some((_, start)) => {
                    time = start + job.service();
                    prev = Some(job.location());
                }
                None => return false,
            }
        }

        let vehicle = instance.vehicle(self.vehicle);
        if last == self.jobs.len() {
            let end_time = match vehicle.end() {
                Some(end) => time + Self::travel(instance, prev, end),
                None => time,
            };
            end_time <= vehicle.time_window().end()
        } else {
            let next = instance.job(self.jobs[last]);
            let arrival = time + Self::travel(instance, prev, next.location());
            arrival <= self.latest[last]
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
        let removed = self.load_in(instance, first, last);
        let load = &(&self.total_load(instance) - &removed) + added;
        load.fits_within(instance.vehicle(self.vehicle).capacity())
    }

    /// Amount serviced by positions `first..last`.
    fn load_in(&self, instance: &Instance, first: usize, last: usize) -> Amount {
        if first >= last {
            return Amount::zero(instance.amount_dimension());
        }
        let upto = self.current_load[last - 1].clone();
        if first == 0 {
            upto
        } else {
            &upto - &self.current_load[first - 1]
        }
    }

    /// Replaces positions `first..last` with `jobs` and rebuilds the
    /// schedule caches.
    ///
    /// Fails if the resulting route is infeasible; callers probe with
    /// [`TwRoute::is_valid_replacement`] before mutating, so an error
    /// here is an internal inconsistency, not user input.
    pub fn replace(
        &mut self,
        instance: &Instance,
        first: usize,
        last: usize,
        jobs: &[usize],
    ) -> Result<()> {
        self.jobs.splice(first..last, jobs.iter().copied());
        self.rebuild(instance)
    }

    /// Inserts `jobs` contiguously before `rank` and rebuilds.
    pub fn add(&mut self, instance: &Instance, jobs: &[usize], rank: usize) -> Result<()> {
        self.replace(instance, rank, rank, jobs)
    }

    /// Removes positions `rank..rank + count` and rebuilds.
    pub fn remove(&mut self, instance: &Instance, rank: usize, count: usize) -> Result<()> {
        self.replace(instance, rank, rank + count, &[])
    }

    /// Recomputes `earliest`, `latest`, `tw_rank`, and `current_load`
    /// from scratch in O(n).
    pub fn rebuild(&mut self, instance: &Instance) -> Result<()> {
        let vehicle = instance.vehicle(self.vehicle);
        let n = self.jobs.len();

        self.earliest.resize(n, 0);
        self.latest.resize(n, 0);
        self.tw_rank.resize(n, 0);
        self.current_load
            .resize(n, Amount::zero(instance.amount_dimension()));

        let mut time = vehicle.time_window().start();
        let mut prev = vehicle.start();
        let mut load = Amount::zero(instance.amount_dimension());
        for k in 0..n {
            let job = instance.job(self.jobs[k]);
            let arrival = time + Self::travel(instance, prev, job.location());
            let (tw_rank, start) = job.earliest_service_start(arrival).ok_or_else(|| {
                anyhow!(
                    "no usable time window for vehicle {} at rank {}",
                    vehicle.id(),
                    k
                )
            })?;
            self.earliest[k] = start;
            self.tw_rank[k] = tw_rank;
            load += job.amount();
            self.current_load[k] = load.clone();
            time = start + job.service();
            prev = Some(job.location());
        }

        let mut bound = vehicle.time_window().end();
        let mut next = vehicle.end();
        for k in (0..n).rev() {
            let job = instance.job(self.jobs[k]);
            let window_end = job.time_windows()[self.tw_rank[k]].end();
            let outgoing = match next {
                Some(location) => job.service() + instance.cost(job.location(), location),
                None => job.service(),
            };
            let slack = bound.checked_sub(outgoing).ok_or_else(|| {
                anyhow!(
                    "schedule underflow for vehicle {} at rank {}",
                    vehicle.id(),
                    k
                )
            })?;
            self.latest[k] = window_end.min(slack);
            if self.earliest[k] > self.latest[k] {
                bail!(
                    "inconsistent schedule for vehicle {} at rank {}: earliest {} > latest {}",
                    vehicle.id(),
                    k,
                    self.earliest[k],
                    self.latest[k]
                );
            }
            bound = self.latest[k];
            next = Some(job.location());
        }

        Ok(())
    }
}
