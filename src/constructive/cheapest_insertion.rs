//! Greedy cheapest-insertion construction.
//!
//! # Algorithm
//!
//! Repeatedly inserts the unassigned job with the globally cheapest
//! feasible insertion slot, over all vehicles and positions, until every
//! job is placed. Feasibility covers skills, capacity, and the schedule
//! probes of time-window routes, so the descent starts from a fully
//! feasible assignment.
//!
//! # Complexity
//!
//! O(n³) over jobs and positions; construction runs once per solve.
//!
//! # Reference
//!
//! Rosenkrantz, D.J., Stearns, R.E. & Lewis, P.M. (1977). "An Analysis
//! of Several Heuristics for the Traveling Salesman Problem", *SIAM
//! Journal on Computing* 6(3).

use anyhow::{bail, Result};

use crate::models::Instance;
use crate::routes::RouteSlot;
use crate::{Cost, Gain};

/// Assigns every job of the instance to the route slots.
///
/// Fails when some job cannot be placed anywhere without breaking a
/// constraint, which makes the instance infeasible for this fleet.
pub fn cheapest_insertion(instance: &Instance, slots: &mut [RouteSlot]) -> Result<()> {
    let mut unassigned: Vec<usize> = (0..instance.jobs().len()).collect();

    while !unassigned.is_empty() {
        let mut best: Option<(Gain, usize, usize, usize)> = None;

        for (position, &job) in unassigned.iter().enumerate() {
            let amount = instance.job(job).amount();
            for (vehicle, slot) in slots.iter().enumerate() {
                if !instance.vehicle_ok_with_job(vehicle, job) {
                    continue;
                }
                if !slot.fits_capacity_after(instance, 0, 0, amount) {
                    continue;
                }
                for rank in 0..=slot.len() {
                    let delta = insertion_delta(instance, slot, job, rank);
                    if best.is_some_and(|(best_delta, ..)| best_delta <= delta) {
                        continue;
                    }
                    if slot.is_valid_addition(instance, &[job], rank) {
                        best = Some((delta, position, vehicle, rank));
                    }
                }
            }
        }

        match best {
            Some((_, position, vehicle, rank)) => {
                let job = unassigned.remove(position);
                slots[vehicle].replace(instance, rank, rank, &[job])?;
            }
            None => bail!(
                "no feasible insertion left for {} unassigned job(s)",
                unassigned.len()
            ),
        }
    }

    Ok(())
}

/// Added travel cost of inserting `job` at slot `rank`.
fn insertion_delta(instance: &Instance, slot: &RouteSlot, job: usize, rank: usize) -> Gain {
    let vehicle = instance.vehicle(slot.vehicle());
    let location = instance.job(job).location();

    let prev = if rank == 0 {
        vehicle.start()
    } else {
        Some(instance.job(slot.at(rank - 1)).location())
    };
    let next = if rank == slot.len() {
        vehicle.end()
    } else {
        Some(instance.job(slot.at(rank)).location())
    };

    let incoming: Cost = prev.map_or(0, |p| instance.cost(p, location));
    let outgoing: Cost = next.map_or(0, |n| instance.cost(location, n));
    let bridged: Cost = match (prev, next) {
        (Some(p), Some(n)) => instance.cost(p, n),
        _ => 0,
    };
    incoming as Gain + outgoing as Gain - bridged as Gain
}
