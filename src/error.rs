//! Error types for model construction and scenario loading
//!
//! - `ModelError`: invalid parameters caught when a model is built
//! - `ConfigError`: failures while reading or validating a scenario file
//!
//! Numeric singularities inside a run (zero equity bases and similar) are not
//! errors; they surface as infinite or NaN cells in the result grids.

use thiserror::Error;

/// Invalid model or distribution parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Probability outside the closed unit interval.
    #[error("Probability {probability} outside [0, 1]")]
    InvalidProbability {
        /// The rejected probability
        probability: f64,
    },

    /// Lower bound not strictly below upper bound.
    #[error("Lower bound {lower} must be strictly below upper bound {upper}")]
    InvalidBounds {
        /// Lower bound supplied
        lower: f64,
        /// Upper bound supplied
        upper: f64,
    },

    /// Standard deviation negative, non-finite, or zero where a spread is required.
    #[error("Invalid standard deviation: {sigma}")]
    InvalidStandardDeviation {
        /// The rejected standard deviation
        sigma: f64,
    },

    /// A schedule or simulation needs at least one period.
    #[error("Number of periods must be at least 1")]
    ZeroPeriods,

    /// A simulation needs at least one trial.
    #[error("Number of simulations must be at least 1")]
    ZeroSimulations,

    /// Any other invalid scalar input.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors raised while loading a scenario description.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Scenario file could not be read.
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario JSON is malformed or has mistyped inputs.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// Scenario values were parsed but are not valid model parameters.
    #[error("Invalid scenario: {0}")]
    Model(#[from] ModelError),
}

/// Result alias for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Fail with `InvalidParameter` unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> ModelResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::InvalidParameter(format!("{} must be finite, got {}", name, value)))
    }
}

/// Fail with `InvalidParameter` unless `value` is finite and non-negative.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> ModelResult<f64> {
    let value = ensure_finite(name, value)?;
    if value < 0.0 {
        return Err(ModelError::InvalidParameter(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(value)
}
