//! Multi-dimensional capacity amounts.

use serde::Serialize;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A vector of integer capacity components.
///
/// Jobs declare the amount they add to a vehicle's load; vehicles declare
/// the capacity they can carry. Comparisons are componentwise: an amount
/// fits within another iff every component does. All amounts in one
/// problem instance share the same number of components.
///
/// # Examples
///
/// ```
/// use route_descent::models::Amount;
///
/// let load = Amount::new(vec![2, 1]);
/// let capacity = Amount::new(vec![3, 1]);
/// assert!(load.fits_within(&capacity));
/// assert!(!capacity.fits_within(&load));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Amount(Vec<i64>);

impl Amount {
    /// Creates an amount from its components.
    pub fn new(components: Vec<i64>) -> Self {
        Self(components)
    }

    /// Creates a zero amount with the given number of components.
    pub fn zero(dimension: usize) -> Self {
        Self(vec![0; dimension])
    }

    /// Number of components.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Returns the component at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn component(&self, index: usize) -> i64 {
        self.0[index]
    }

    /// Returns the raw components.
    pub fn components(&self) -> &[i64] {
        &self.0
    }

    /// Returns `true` if every component is non-negative.
    pub fn is_non_negative(&self) -> bool {
        self.0.iter().all(|&c| c >= 0)
    }

    /// Componentwise comparison: `true` iff every component of `self` is
    /// less than or equal to the matching component of `other`.
    ///
    /// Amounts of different dimensions never fit within each other.
    pub fn fits_within(&self, other: &Amount) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        debug_assert_eq!(self.0.len(), rhs.0.len());
        Amount(self.0.iter().zip(&rhs.0).map(|(a, b)| a + b).collect())
    }
}

impl Sub<&Amount> for &Amount {
    type Output = Amount;

    fn sub(self, rhs: &Amount) -> Amount {
        debug_assert_eq!(self.0.len(), rhs.0.len());
        Amount(self.0.iter().zip(&rhs.0).map(|(a, b)| a - b).collect())
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        debug_assert_eq!(self.0.len(), rhs.0.len());
        for (a, b) in self.0.iter_mut().zip(&rhs.0) {
            *a += b;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        debug_assert_eq!(self.0.len(), rhs.0.len());
        for (a, b) in self.0.iter_mut().zip(&rhs.0) {
            *a -= b;
        }
    }
}
