//! Immutable problem instance.

use anyhow::{bail, Result};

use super::{Job, Vehicle};
use crate::matrix::CostMatrix;
use crate::Cost;

/// An immutable vehicle routing problem instance.
///
/// Owns the jobs, the vehicles, and the travel cost matrix, and
/// precomputes vehicle/job skill compatibility plus per-job neighbour
/// lists used by the local-search driver to prune candidate moves.
///
/// Construction validates the input once; the solver never re-checks it.
///
/// # Examples
///
/// ```
/// use route_descent::matrix::CostMatrix;
/// use route_descent::models::{Amount, Instance, Job, Vehicle};
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
///
/// let instance = Instance::new(jobs, vehicles, matrix).unwrap();
/// assert_eq!(instance.jobs().len(), 2);
/// assert!(!instance.has_time_windows());
/// ```
#[derive(Debug)]
pub struct Instance {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    matrix: CostMatrix,
    vehicle_ok_with_job: Vec<Vec<bool>>,
    neighbours: Vec<Vec<usize>>,
    amount_dimension: usize,
    has_time_windows: bool,
}

impl Instance {
    /// Builds and validates an instance.
    ///
    /// Checks that every referenced location fits the matrix, that every
    /// job has at least one time window and non-overlapping sorted
    /// windows, that amounts share one dimension, and that every job is
    /// skill-compatible with at least one vehicle.
    pub fn new(jobs: Vec<Job>, vehicles: Vec<Vehicle>, matrix: CostMatrix) -> Result<Self> {
        if vehicles.is_empty() {
            bail!("instance has no vehicles");
        }

        let amount_dimension = vehicles[0].capacity().dimension();
        for vehicle in &vehicles {
            if vehicle.capacity().dimension() != amount_dimension {
                bail!(
                    "inconsistent capacity dimension for vehicle {}",
                    vehicle.id()
                );
            }
            if !vehicle.capacity().is_non_negative() {
                bail!("negative capacity for vehicle {}", vehicle.id());
            }
            for location in [vehicle.start(), vehicle.end()].into_iter().flatten() {
                if location >= matrix.size() {
                    bail!(
                        "location {} of vehicle {} exceeds matrix size {}",
                        location,
                        vehicle.id(),
                        matrix.size()
                    );
                }
            }
        }

        for job in &jobs {
            if job.location() >= matrix.size() {
                bail!(
                    "location {} of job {} exceeds matrix size {}",
                    job.location(),
                    job.id(),
                    matrix.size()
                );
            }
            if job.amount().dimension() != amount_dimension {
                bail!("inconsistent amount dimension for job {}", job.id());
            }
            if !job.amount().is_non_negative() {
                bail!("negative amount for job {}", job.id());
            }
            if job.time_windows().is_empty() {
                bail!("no time window for job {}", job.id());
            }
            for pair in job.time_windows().windows(2) {
                if pair[1].start() <= pair[0].end() {
                    bail!("overlapping time windows for job {}", job.id());
                }
            }
            if !vehicles.iter().any(|v| v.handles(job)) {
                bail!("no vehicle with suitable skills for job {}", job.id());
            }
        }

        let vehicle_ok_with_job = vehicles
            .iter()
            .map(|v| jobs.iter().map(|j| v.handles(j)).collect())
            .collect();

        let neighbours = Self::rank_neighbours(&jobs, &matrix);

        let has_time_windows = jobs.iter().any(|j| !j.is_unconstrained())
            || vehicles.iter().any(|v| !v.time_window().is_horizon());

        Ok(Self {
            jobs,
            vehicles,
            matrix,
            vehicle_ok_with_job,
            neighbours,
            amount_dimension,
            has_time_windows,
        })
    }

    /// For each job, the other jobs sorted by travel cost from it.
    fn rank_neighbours(jobs: &[Job], matrix: &CostMatrix) -> Vec<Vec<usize>> {
        (0..jobs.len())
            .map(|rank| {
                let mut others: Vec<usize> =
                    (0..jobs.len()).filter(|&other| other != rank).collect();
                others.sort_by_key(|&other| {
                    (
                        matrix.get(jobs[rank].location(), jobs[other].location()),
                        other,
                    )
                });
                others
            })
            .collect()
    }

    /// All jobs, in input order. Routes store ranks into this slice.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// All vehicles, in input order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// The job at the given rank.
    pub fn job(&self, rank: usize) -> &Job {
        &self.jobs[rank]
    }

    /// The vehicle at the given index.
    pub fn vehicle(&self, index: usize) -> &Vehicle {
        &self.vehicles[index]
    }

    /// The travel cost matrix.
    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Travel cost between two matrix locations.
    pub fn cost(&self, from: usize, to: usize) -> Cost {
        self.matrix.get(from, to)
    }

    /// Precomputed skill compatibility.
    pub fn vehicle_ok_with_job(&self, vehicle: usize, job_rank: usize) -> bool {
        self.vehicle_ok_with_job[vehicle][job_rank]
    }

    /// Job ranks sorted by travel cost from the given job, closest first.
    pub fn neighbours(&self, job_rank: usize) -> &[usize] {
        &self.neighbours[job_rank]
    }

    /// Shared dimension of every amount and capacity in the instance.
    pub fn amount_dimension(&self) -> usize {
        self.amount_dimension
    }

    /// Returns `true` if any job or vehicle carries a real time window,
    /// in which case routes use the time-window-aware representation.
    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Amount, TimeWindow};
    use crate::SkillSet;

    fn line_instance() -> Instance {
        let matrix = CostMatrix::from_line(&[0, 1, 2, 3]);
        let jobs = vec![
            Job::new(1, 1).with_amount(Amount::new(vec![1])),
            Job::new(2, 2).with_amount(Amount::new(vec![1])),
            Job::new(3, 3).with_amount(Amount::new(vec![1])),
        ];
        let vehicles = vec![Vehicle::new(0)
            .with_start(0)
            .with_end(0)
            .with_capacity(Amount::new(vec![3]))];
        Instance::new(jobs, vehicles, matrix).expect("valid instance")
    }

    #[test]
    fn test_instance_valid() {
        let instance = line_instance();
        assert_eq!(instance.jobs().len(), 3);
        assert_eq!(instance.vehicles().len(), 1);
        assert_eq!(instance.amount_dimension(), 1);
        assert!(!instance.has_time_windows());
        assert!(instance.vehicle_ok_with_job(0, 2));
    }

    #[test]
    fn test_instance_neighbours_sorted() {
        let instance = line_instance();
        // From the job at location 1, the job at location 2 comes first.
        assert_eq!(instance.neighbours(0), &[1, 2]);
        // From the job at location 3, reverse order.
        assert_eq!(instance.neighbours(2), &[1, 0]);
    }

    #[test]
    fn test_instance_rejects_no_vehicles() {
        let matrix = CostMatrix::new(1);
        assert!(Instance::new(vec![], vec![], matrix).is_err());
    }

    #[test]
    fn test_instance_rejects_bad_location() {
        let matrix = CostMatrix::new(2);
        let jobs = vec![Job::new(1, 5)];
        let vehicles = vec![Vehicle::new(0)];
        assert!(Instance::new(jobs, vehicles, matrix).is_err());
    }

    #[test]
    fn test_instance_rejects_dimension_mismatch() {
        let matrix = CostMatrix::new(2);
        let jobs = vec![Job::new(1, 1).with_amount(Amount::new(vec![1, 2]))];
        let vehicles = vec![Vehicle::new(0).with_capacity(Amount::new(vec![5]))];
        assert!(Instance::new(jobs, vehicles, matrix).is_err());
    }

    #[test]
    fn test_instance_rejects_overlapping_windows() {
        let matrix = CostMatrix::new(2);
        let jobs = vec![Job::new(1, 1).with_time_windows(vec![
            TimeWindow::new(0, 10).expect("valid"),
            TimeWindow::new(5, 20).expect("valid"),
        ])];
        let vehicles = vec![Vehicle::new(0)];
        assert!(Instance::new(jobs, vehicles, matrix).is_err());
    }

    #[test]
    fn test_instance_rejects_unservable_job() {
        let matrix = CostMatrix::new(2);
        let mut skills = SkillSet::new();
        skills.insert(7);
        let jobs = vec![Job::new(1, 1).with_skills(skills)];
        let vehicles = vec![Vehicle::new(0)];
        assert!(Instance::new(jobs, vehicles, matrix).is_err());
    }

    #[test]
    fn test_instance_detects_time_windows() {
        let matrix = CostMatrix::new(2);
        let jobs =
            vec![Job::new(1, 1).with_time_windows(vec![TimeWindow::new(0, 100).expect("valid")])];
        let vehicles = vec![Vehicle::new(0)];
        let instance = Instance::new(jobs, vehicles, matrix).expect("valid");
        assert!(instance.has_time_windows());
    }
}
