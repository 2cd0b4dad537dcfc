//! Top-level solve entry point.

use anyhow::{anyhow, Result};
use log::info;

use crate::constructive::cheapest_insertion;
use crate::local_search::{DescentReport, LocalSearch};
use crate::models::{Amount, Instance, RouteSummary, Solution};
use crate::routes::RouteSlot;
use crate::state::SolutionState;
use crate::{Cost, Duration};

/// Solves the instance: builds an initial feasible assignment, descends
/// to a local optimum, and assembles the per-route summaries.
///
/// The exploration level (clamped to `0..=5`) widens the neighbourhood
/// the descent considers; level 5 enumerates exhaustively.
///
/// # Examples
///
/// ```
/// use route_descent::matrix::CostMatrix;
/// use route_descent::models::{Amount, Instance, Job, Vehicle};
/// use route_descent::solve;
///
/// let matrix = CostMatrix::from_line(&[0, 1, 2]);
/// let jobs = vec![
///     Job::new(1, 1).with_amount(Amount::new(vec![1])),
///     Job::new(2, 2).with_amount(Amount::new(vec![1])),
/// ];
/// let vehicles = vec![Vehicle::new(0)
///     .with_start(0)
///     .with_end(0)
///     .with_capacity(Amount::new(vec![2]))];
/// let instance = Instance::new(jobs, vehicles, matrix).unwrap();
///
/// let solution = solve(&instance, 5).unwrap();
/// assert_eq!(solution.jobs_serviced(), 2);
/// assert_eq!(solution.total_cost(), 4);
/// ```
pub fn solve(instance: &Instance, exploration_level: u8) -> Result<Solution> {
    let mut slots: Vec<RouteSlot> = (0..instance.vehicles().len())
        .map(|vehicle| RouteSlot::for_instance(instance, vehicle))
        .collect();

    cheapest_insertion(instance, &mut slots)?;

    let mut state = SolutionState::new(instance.vehicles().len());
    state.setup(instance, &slots);

    let search = LocalSearch::new(exploration_level);
    let report = search.run(instance, &mut slots, &mut state)?;
    info!(
        "descent applied {} move(s) for a gain of {}",
        report.moves_applied, report.total_gain
    );

    build_solution(instance, &slots, report)
}

/// Walks each final route once to derive its cost and timing summary.
fn build_solution(
    instance: &Instance,
    slots: &[RouteSlot],
    report: DescentReport,
) -> Result<Solution> {
    let mut routes = Vec::with_capacity(slots.len());
    for slot in slots {
        routes.push(summarize_route(instance, slot)?);
    }
    Ok(Solution::new(
        routes,
        report.moves_applied,
        report.total_gain,
    ))
}

fn summarize_route(instance: &Instance, slot: &RouteSlot) -> Result<RouteSummary> {
    let vehicle = instance.vehicle(slot.vehicle());
    let mut cost: Cost = 0;
    let mut service: Duration = 0;
    let mut waiting_time: Duration = 0;
    let mut amount = Amount::zero(instance.amount_dimension());
    let mut job_ids = Vec::with_capacity(slot.len());

    let departure = vehicle.time_window().start();
    let mut time = departure;
    let mut prev = vehicle.start();

    for &rank in slot.jobs() {
        let job = instance.job(rank);
        let travel = prev.map_or(0, |p| instance.cost(p, job.location()));
        let arrival = time + travel;
        let (_, start) = job.earliest_service_start(arrival).ok_or_else(|| {
            anyhow!(
                "final schedule misses a window for vehicle {} at job {}",
                vehicle.id(),
                job.id()
            )
        })?;

        cost += travel;
        service += job.service();
        waiting_time += start - arrival;
        amount += job.amount();
        job_ids.push(job.id());

        time = start + job.service();
        prev = Some(job.location());
    }

    if !slot.is_empty() {
        if let (Some(last), Some(end)) = (prev, vehicle.end()) {
            let travel = instance.cost(last, end);
            cost += travel;
            time += travel;
        }
    }

    let duration = if slot.is_empty() { 0 } else { time - departure };
    Ok(RouteSummary {
        vehicle_id: vehicle.id(),
        job_ids,
        cost,
        service,
        duration,
        waiting_time,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CostMatrix;
    use crate::models::{Job, TimeWindow, Vehicle};

    #[test]
    fn test_solve_single_job() {
        let matrix = CostMatrix::from_line(&[0, 7]);
        let jobs = vec![Job::new(9, 1).with_service(3)];
        let vehicles = vec![Vehicle::new(1).with_start(0).with_end(0)];
        let instance = Instance::new(jobs, vehicles, matrix).expect("valid");

        let solution = solve(&instance, 5).expect("solve");
        assert_eq!(solution.moves_applied(), 0);
        assert_eq!(solution.total_gain(), 0);
        assert_eq!(solution.total_cost(), 14);

        let route = &solution.routes()[0];
        assert_eq!(route.vehicle_id, 1);
        assert_eq!(route.job_ids, vec![9]);
        assert_eq!(route.service, 3);
        assert_eq!(route.duration, 17);
        assert_eq!(route.waiting_time, 0);
    }

    #[test]
    fn test_solve_reports_waiting_time() {
        let matrix = CostMatrix::from_line(&[0, 5]);
        let jobs = vec![Job::new(1, 1)
            .with_service(2)
            .with_time_windows(vec![TimeWindow::new(20, 30).expect("valid")])];
        let vehicles = vec![Vehicle::new(0).with_start(0).with_end(0)];
        let instance = Instance::new(jobs, vehicles, matrix).expect("valid");

        let solution = solve(&instance, 5).expect("solve");
        let route = &solution.routes()[0];
        // Arrive at 5, wait until 20, serve 2, ride home 5.
        assert_eq!(route.waiting_time, 15);
        assert_eq!(route.duration, 27);
        assert_eq!(route.cost, 10);
    }

    #[test]
    fn test_solve_no_start_no_end() {
        let matrix = CostMatrix::from_line(&[0, 3, 5]);
        let jobs = vec![Job::new(1, 1), Job::new(2, 2)];
        let vehicles = vec![Vehicle::new(0)];
        let instance = Instance::new(jobs, vehicles, matrix).expect("valid");

        let solution = solve(&instance, 5).expect("solve");
        // Only the inter-job leg costs anything.
        assert_eq!(solution.total_cost(), 2);
    }

    #[test]
    fn test_solve_infeasible_capacity() {
        let matrix = CostMatrix::from_line(&[0, 1]);
        let jobs = vec![Job::new(1, 1).with_amount(Amount::new(vec![5]))];
        let vehicles = vec![Vehicle::new(0).with_capacity(Amount::new(vec![1]))];
        let instance = Instance::new(jobs, vehicles, matrix).expect("valid");
        assert!(solve(&instance, 5).is_err());
    }
}
