//! Per-vehicle solution-state caches.
//!
//! The local search prices every candidate move from a handful of cached
//! quantities so that gain computation is O(1) per candidate:
//!
//! - `fwd_amounts[k]` — cumulative amount over the route prefix `0..=k`
//! - `fwd_costs[k]` / `bwd_costs[k]` — cumulative travel cost of the
//!   first `k` route edges, following and against the route direction
//!   (the backward array prices whole-fragment reversals)
//! - `edge_costs_around_node[k]` — cost of entering and leaving the job
//!   at `k`
//! - `edge_costs_around_edge[k]` — cost of entering and leaving the edge
//!   `(k, k+1)`, excluding the edge itself
//!
//! After an accepted move, the caches of exactly the touched vehicles
//! are rebuilt in O(|route|); buffers are reused across iterations.

use crate::models::{Amount, Instance};
use crate::routes::RouteSlot;
use crate::Cost;

/// Cached per-vehicle quantities derived from the current routes.
#[derive(Debug)]
pub struct SolutionState {
    fwd_amounts: Vec<Vec<Amount>>,
    fwd_costs: Vec<Vec<Cost>>,
    bwd_costs: Vec<Vec<Cost>>,
    edge_costs_around_node: Vec<Vec<Cost>>,
    edge_costs_around_edge: Vec<Vec<Cost>>,
}

impl SolutionState {
    /// Creates empty caches for the given fleet size.
    pub fn new(nb_vehicles: usize) -> Self {
        Self {
            fwd_amounts: vec![Vec::new(); nb_vehicles],
            fwd_costs: vec![Vec::new(); nb_vehicles],
            bwd_costs: vec![Vec::new(); nb_vehicles],
            edge_costs_around_node: vec![Vec::new(); nb_vehicles],
            edge_costs_around_edge: vec![Vec::new(); nb_vehicles],
        }
    }

    /// Rebuilds the caches for every vehicle.
    pub fn setup(&mut self, instance: &Instance, slots: &[RouteSlot]) {
        for slot in slots {
            self.update(instance, slot);
        }
    }

    /// Rebuilds the caches for one vehicle from its current route.
    pub fn update(&mut self, instance: &Instance, slot: &RouteSlot) {
        let vehicle_index = slot.vehicle();
        let vehicle = instance.vehicle(vehicle_index);
        let jobs = slot.jobs();
        let n = jobs.len();

        let amounts = &mut self.fwd_amounts[vehicle_index];
        amounts.clear();
        let mut load = Amount::zero(instance.amount_dimension());
        for &job in jobs {
            load += instance.job(job).amount();
            amounts.push(load.clone());
        }

        let fwd = &mut self.fwd_costs[vehicle_index];
        let bwd = &mut self.bwd_costs[vehicle_index];
        fwd.clear();
        bwd.clear();
        if n > 0 {
            fwd.push(0);
            bwd.push(0);
            for k in 1..n {
                let from = instance.job(jobs[k - 1]).location();
                let to = instance.job(jobs[k]).location();
                fwd.push(fwd[k - 1] + instance.cost(from, to));
                bwd.push(bwd[k - 1] + instance.cost(to, from));
            }
        }

        let around_node = &mut self.edge_costs_around_node[vehicle_index];
        around_node.clear();
        for k in 0..n {
            let location = instance.job(jobs[k]).location();
            let incoming = if k == 0 {
                vehicle.start().map_or(0, |s| instance.cost(s, location))
            } else {
                instance.cost(instance.job(jobs[k - 1]).location(), location)
            };
            let outgoing = if k == n - 1 {
                vehicle.end().map_or(0, |e| instance.cost(location, e))
            } else {
                instance.cost(location, instance.job(jobs[k + 1]).location())
            };
            around_node.push(incoming + outgoing);
        }

        let around_edge = &mut self.edge_costs_around_edge[vehicle_index];
        around_edge.clear();
        for k in 0..n.saturating_sub(1) {
            let first = instance.job(jobs[k]).location();
            let second = instance.job(jobs[k + 1]).location();
            let incoming = if k == 0 {
                vehicle.start().map_or(0, |s| instance.cost(s, first))
            } else {
                instance.cost(instance.job(jobs[k - 1]).location(), first)
            };
            let outgoing = if k + 1 == n - 1 {
                vehicle.end().map_or(0, |e| instance.cost(second, e))
            } else {
                instance.cost(second, instance.job(jobs[k + 2]).location())
            };
            around_edge.push(incoming + outgoing);
        }
    }

    /// Cumulative amount over the route prefix `0..=rank`.
    pub fn fwd_amount(&self, vehicle: usize, rank: usize) -> &Amount {
        &self.fwd_amounts[vehicle][rank]
    }

    /// Total amount carried by the vehicle's route.
    pub fn route_amount(&self, instance: &Instance, vehicle: usize) -> Amount {
        match self.fwd_amounts[vehicle].last() {
            Some(amount) => amount.clone(),
            None => Amount::zero(instance.amount_dimension()),
        }
    }

    /// Cumulative cost of the first `rank` route edges, in route order.
    pub fn fwd_cost(&self, vehicle: usize, rank: usize) -> Cost {
        self.fwd_costs[vehicle][rank]
    }

    /// Cumulative cost of the first `rank` route edges, against route
    /// order.
    pub fn bwd_cost(&self, vehicle: usize, rank: usize) -> Cost {
        self.bwd_costs[vehicle][rank]
    }

    /// Cost of entering and leaving the job at `rank`.
    pub fn edge_cost_around_node(&self, vehicle: usize, rank: usize) -> Cost {
        self.edge_costs_around_node[vehicle][rank]
    }

    /// Cost of entering and leaving the edge `(rank, rank + 1)`,
    /// excluding the edge itself.
    pub fn edge_cost_around_edge(&self, vehicle: usize, rank: usize) -> Cost {
        self.edge_costs_around_edge[vehicle][rank]
    }
}
