//! Solution output types.

use serde::Serialize;

use super::Amount;
use crate::{Cost, Duration, Gain};

/// The solved route of one vehicle.
///
/// Carries the serviced job ids in visit order together with the route's
/// cost and timing summary.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    /// Vehicle id from the input.
    pub vehicle_id: u64,
    /// Job ids in visit order.
    pub job_ids: Vec<u64>,
    /// Total travel cost, including start/end legs when present.
    pub cost: Cost,
    /// Total service time over all jobs.
    pub service: Duration,
    /// Route duration from leaving the start to finishing the last leg.
    pub duration: Duration,
    /// Total time spent waiting for time windows to open.
    pub waiting_time: Duration,
    /// Total amount carried.
    pub amount: Amount,
}

/// A complete solution: one route per vehicle plus the descent report.
///
/// # Examples
///
/// ```
/// use route_descent::models::Solution;
///
/// let solution = Solution::new(vec![], 0, 0);
/// assert_eq!(solution.total_cost(), 0);
/// assert_eq!(solution.routes().len(), 0);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    routes: Vec<RouteSummary>,
    total_cost: Cost,
    moves_applied: usize,
    total_gain: Gain,
}

impl Solution {
    /// Assembles a solution from per-vehicle summaries and the descent
    /// report.
    pub fn new(routes: Vec<RouteSummary>, moves_applied: usize, total_gain: Gain) -> Self {
        let total_cost = routes.iter().map(|r| r.cost).sum();
        Self {
            routes,
            total_cost,
            moves_applied,
            total_gain,
        }
    }

    /// Per-vehicle route summaries, in vehicle order.
    pub fn routes(&self) -> &[RouteSummary] {
        &self.routes
    }

    /// Total travel cost over all routes.
    pub fn total_cost(&self) -> Cost {
        self.total_cost
    }

    /// Number of local-search moves applied during the descent.
    pub fn moves_applied(&self) -> usize {
        self.moves_applied
    }

    /// Total gain accumulated by the descent.
    pub fn total_gain(&self) -> Gain {
        self.total_gain
    }

    /// Number of jobs serviced across all routes.
    pub fn jobs_serviced(&self) -> usize {
        self.routes.iter().map(|r| r.job_ids.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(vehicle_id: u64, job_ids: Vec<u64>, cost: Cost) -> RouteSummary {
        RouteSummary {
            vehicle_id,
            job_ids,
            cost,
            service: 0,
            duration: cost,
            waiting_time: 0,
            amount: Amount::zero(0),
        }
    }

    #[test]
    fn test_solution_totals() {
        let solution = Solution::new(
            vec![summary(0, vec![1, 2], 10), summary(1, vec![3], 4)],
            5,
            6,
        );
        assert_eq!(solution.total_cost(), 14);
        assert_eq!(solution.jobs_serviced(), 3);
        assert_eq!(solution.moves_applied(), 5);
    }

    #[test]
    fn test_solution_empty() {
        let solution = Solution::new(vec![], 0, 0);
        assert_eq!(solution.total_cost(), 0);
        assert_eq!(solution.jobs_serviced(), 0);
    }
}
