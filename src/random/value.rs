//! Scalar-or-random model inputs
//!
//! `ScalarOrRandom` is the single place where absent, constant and random inputs
//! are normalised. Models call `resolve_grid` and never inspect the variant.

use ndarray::Array2;
use rand::Rng;

use super::{RandomVariable, Sample, Shape};
use crate::error::{ensure_finite, ModelResult};

/// A model input that may be unset, fixed, or random
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScalarOrRandom {
    /// Not configured; resolves to zero so it can be summed unconditionally
    #[default]
    Absent,
    /// Fixed value for every period and trial
    Constant(f64),
    /// Sampled independently for every period and trial
    Random(RandomVariable),
}

impl ScalarOrRandom {
    /// Resolve to a scalar when `shape` is `None`, otherwise a grid of that shape
    pub fn resolve<R: Rng + ?Sized>(&self, shape: Option<Shape>, rng: &mut R) -> Sample {
        match (self, shape) {
            (ScalarOrRandom::Random(rv), _) => rv.sample(shape, rng),
            (ScalarOrRandom::Constant(value), Some(shape)) => Sample::Grid(Array2::from_elem(shape, *value)),
            (ScalarOrRandom::Constant(value), None) => Sample::Scalar(*value),
            (ScalarOrRandom::Absent, Some(shape)) => Sample::Grid(Array2::zeros(shape)),
            (ScalarOrRandom::Absent, None) => Sample::Scalar(0.0),
        }
    }

    /// Resolve straight to a grid of `shape`
    pub fn resolve_grid<R: Rng + ?Sized>(&self, shape: Shape, rng: &mut R) -> Array2<f64> {
        self.resolve(Some(shape), rng).into_grid(shape)
    }

    /// Reject non-finite constants; random inputs were checked when built
    pub fn validate(self, name: &str) -> ModelResult<Self> {
        if let ScalarOrRandom::Constant(value) = self {
            ensure_finite(name, value)?;
        }
        Ok(self)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ScalarOrRandom::Absent)
    }

    /// Whether resolving this input consumes random numbers
    pub fn is_random(&self) -> bool {
        matches!(self, ScalarOrRandom::Random(_))
    }
}

impl From<f64> for ScalarOrRandom {
    fn from(value: f64) -> Self {
        ScalarOrRandom::Constant(value)
    }
}

impl From<RandomVariable> for ScalarOrRandom {
    fn from(rv: RandomVariable) -> Self {
        ScalarOrRandom::Random(rv)
    }
}

impl From<Option<f64>> for ScalarOrRandom {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ScalarOrRandom::Absent, ScalarOrRandom::Constant)
    }
}
