//! Random inputs: distributions and the scalar-or-random resolver

mod variable;
mod value;

pub use variable::{Distribution, RandomVariable};
pub use value::ScalarOrRandom;

use ndarray::Array2;

/// Grid shape as (n_periods, n_simulations)
pub type Shape = (usize, usize);

/// Outcome of sampling or resolving an input
///
/// A request without a shape yields a `Scalar`; a request with a shape yields a
/// `Grid` of exactly that shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Scalar(f64),
    Grid(Array2<f64>),
}

impl Sample {
    /// Convert to a grid, broadcasting a scalar to `shape`
    pub fn into_grid(self, shape: Shape) -> Array2<f64> {
        match self {
            Sample::Scalar(value) => Array2::from_elem(shape, value),
            Sample::Grid(grid) => grid,
        }
    }

    /// Scalar value, if this sample is not a grid
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Sample::Scalar(value) => Some(*value),
            Sample::Grid(_) => None,
        }
    }
}
