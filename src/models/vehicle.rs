//! Vehicle type with start/end locations, capacity, and working hours.

use super::{Amount, Job, TimeWindow};
use crate::SkillSet;

/// A vehicle servicing one route.
///
/// Start and end locations are optional matrix indices; an absent start
/// or end removes the corresponding travel legs from the route. The
/// single time window bounds the vehicle's working hours.
///
/// # Examples
///
/// ```
/// use route_descent::models::{Amount, Vehicle};
///
/// let v = Vehicle::new(0)
///     .with_start(0)
///     .with_end(0)
///     .with_capacity(Amount::new(vec![4]));
/// assert!(v.has_start());
/// assert_eq!(v.start(), Some(0));
/// assert_eq!(v.capacity().component(0), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: u64,
    start: Option<usize>,
    end: Option<usize>,
    capacity: Amount,
    skills: SkillSet,
    time_window: TimeWindow,
}

impl Vehicle {
    /// Creates a vehicle with the given stable id.
    ///
    /// Defaults: no start, no end, empty capacity, no skills, horizon
    /// working hours.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            start: None,
            end: None,
            capacity: Amount::default(),
            skills: SkillSet::new(),
            time_window: TimeWindow::horizon(),
        }
    }

    /// Sets the start location (matrix index).
    pub fn with_start(mut self, location: usize) -> Self {
        self.start = Some(location);
        self
    }

    /// Sets the end location (matrix index).
    pub fn with_end(mut self, location: usize) -> Self {
        self.end = Some(location);
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: Amount) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the available skill set.
    pub fn with_skills(mut self, skills: SkillSet) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the working-hours time window.
    pub fn with_time_window(mut self, tw: TimeWindow) -> Self {
        self.time_window = tw;
        self
    }

    /// Stable id from the input.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Start location, if any.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// End location, if any.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Returns `true` if this vehicle has a start location.
    pub fn has_start(&self) -> bool {
        self.start.is_some()
    }

    /// Returns `true` if this vehicle has an end location.
    pub fn has_end(&self) -> bool {
        self.end.is_some()
    }

    /// Capacity bound.
    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    /// Available skills.
    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    /// Working-hours window.
    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    /// Returns `true` if this vehicle provides every skill the job needs.
    pub fn handles(&self, job: &Job) -> bool {
        job.skills().is_subset(&self.skills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_defaults() {
        let v = Vehicle::new(3);
        assert_eq!(v.id(), 3);
        assert!(!v.has_start());
        assert!(!v.has_end());
        assert!(v.time_window().is_horizon());
    }

    #[test]
    fn test_vehicle_builder() {
        let v = Vehicle::new(0)
            .with_start(1)
            .with_end(2)
            .with_capacity(Amount::new(vec![10, 5]))
            .with_time_window(TimeWindow::new(100, 200).expect("valid"));
        assert_eq!(v.start(), Some(1));
        assert_eq!(v.end(), Some(2));
        assert_eq!(v.capacity().components(), &[10, 5]);
        assert_eq!(v.time_window().start(), 100);
    }

    #[test]
    fn test_vehicle_handles_skills() {
        let mut v_skills = SkillSet::new();
        v_skills.insert(1);
        v_skills.insert(2);
        let v = Vehicle::new(0).with_skills(v_skills);

        let mut j_skills = SkillSet::new();
        j_skills.insert(1);
        let job = Job::new(0, 0).with_skills(j_skills.clone());
        assert!(v.handles(&job));

        j_skills.insert(9);
        let picky = Job::new(1, 0).with_skills(j_skills);
        assert!(!v.handles(&picky));

        // A job with no requirements is handled by anyone.
        assert!(Vehicle::new(1).handles(&Job::new(2, 0)));
    }
}
