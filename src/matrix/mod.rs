//! Dense travel cost/duration matrix.

mod square;

pub use square::CostMatrix;
