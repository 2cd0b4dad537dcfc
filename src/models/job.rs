//! Job and time window types.

use super::Amount;
use crate::{Duration, SkillSet};

/// A service time window.
///
/// Service at a job may start no earlier than `start` and no later than
/// `end`; a vehicle arriving before `start` waits. The default window
/// spans the whole planning horizon.
///
/// # Examples
///
/// ```
/// use route_descent::models::TimeWindow;
///
/// let tw = TimeWindow::new(100, 200).unwrap();
/// assert!(tw.contains(150));
/// assert!(!tw.contains(250));
/// assert!(TimeWindow::new(200, 100).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: Duration,
    end: Duration,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `start > end`.
    pub fn new(start: Duration, end: Duration) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// The whole planning horizon, `[0, Duration::MAX]`.
    pub fn horizon() -> Self {
        Self {
            start: 0,
            end: Duration::MAX,
        }
    }

    /// Earliest allowed service start.
    pub fn start(&self) -> Duration {
        self.start
    }

    /// Latest allowed service start.
    pub fn end(&self) -> Duration {
        self.end
    }

    /// Returns `true` if the given time falls within this window.
    pub fn contains(&self, time: Duration) -> bool {
        self.start <= time && time <= self.end
    }

    /// Returns `true` if this window spans the whole planning horizon.
    pub fn is_horizon(&self) -> bool {
        self.start == 0 && self.end == Duration::MAX
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::horizon()
    }
}

/// A job to be serviced at a known matrix location.
///
/// Jobs carry a service duration, a capacity amount, a skill requirement
/// set, and a sorted list of candidate time windows. Several jobs may
/// share one matrix location.
///
/// # Examples
///
/// ```
/// use route_descent::models::{Amount, Job, TimeWindow};
///
/// let job = Job::new(7, 2)
///     .with_service(300)
///     .with_amount(Amount::new(vec![1]))
///     .with_time_windows(vec![TimeWindow::new(0, 3600).unwrap()]);
/// assert_eq!(job.id(), 7);
/// assert_eq!(job.location(), 2);
/// assert_eq!(job.service(), 300);
/// ```
#[derive(Debug, Clone)]
pub struct Job {
    id: u64,
    location: usize,
    service: Duration,
    amount: Amount,
    skills: SkillSet,
    time_windows: Vec<TimeWindow>,
}

impl Job {
    /// Creates a job with the given stable id and matrix location.
    ///
    /// Defaults: zero service, empty amount, no skills, horizon window.
    pub fn new(id: u64, location: usize) -> Self {
        Self {
            id,
            location,
            service: 0,
            amount: Amount::default(),
            skills: SkillSet::new(),
            time_windows: vec![TimeWindow::horizon()],
        }
    }

    /// Sets the service duration.
    pub fn with_service(mut self, service: Duration) -> Self {
        self.service = service;
        self
    }

    /// Sets the capacity amount this job adds to a vehicle's load.
    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the required skill set.
    pub fn with_skills(mut self, skills: SkillSet) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the candidate time windows, sorting them by start.
    pub fn with_time_windows(mut self, mut windows: Vec<TimeWindow>) -> Self {
        windows.sort_by_key(|tw| (tw.start(), tw.end()));
        self.time_windows = windows;
        self
    }

    /// Stable id from the input.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Matrix index of this job's location.
    pub fn location(&self) -> usize {
        self.location
    }

    /// Service duration at this job.
    pub fn service(&self) -> Duration {
        self.service
    }

    /// Capacity amount.
    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    /// Required skills.
    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    /// Candidate time windows, sorted by start.
    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    /// Returns `true` if every window spans the whole horizon.
    pub fn is_unconstrained(&self) -> bool {
        self.time_windows.iter().all(|tw| tw.is_horizon())
    }

    /// Picks the first usable window for a vehicle arriving at `arrival`.
    ///
    /// A window is usable if service can still start inside it, i.e. its
    /// end is not before the arrival. Returns the window rank and the
    /// resulting service start (`max(arrival, window.start)`), or `None`
    /// when every window has closed.
    pub fn earliest_service_start(&self, arrival: Duration) -> Option<(usize, Duration)> {
        self.time_windows
            .iter()
            .position(|tw| arrival <= tw.end())
            .map(|rank| (rank, arrival.max(self.time_windows[rank].start())))
    }
}
