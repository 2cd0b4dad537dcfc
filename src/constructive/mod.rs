//! Constructive heuristics for building the initial assignment.
//!
//! - [`cheapest_insertion`] — greedy cheapest feasible insertion, O(n³)

mod cheapest_insertion;

pub use cheapest_insertion::cheapest_insertion;
