//! Random variables with a single sampling capability
//!
//! Every variant is validated when the `RandomVariable` is built, so sampling
//! itself cannot fail.

use log::trace;
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::{Sample, Shape};
use crate::error::{ModelError, ModelResult};

/// Distribution family and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Distribution {
    /// Gaussian; a missing or zero `sigma` degenerates to the constant `mu`
    Normal {
        mu: f64,
        #[serde(default)]
        sigma: Option<f64>,
    },
    /// Rate of change `exp(N(mu - sigma²/2, sigma)) - 1`; a missing or zero
    /// `sigma` degenerates to the constant `mu`
    LogNormal {
        mu: f64,
        #[serde(default)]
        sigma: Option<f64>,
    },
    /// Bernoulli draw in {0, 1}
    Indicator { probability: f64 },
    /// Continuous uniform on [lower_bound, upper_bound)
    Uniform { lower_bound: f64, upper_bound: f64 },
    /// Gaussian truncated to the open interval (lower_bound, upper_bound)
    BoundedNormal {
        mu: f64,
        sigma: f64,
        lower_bound: f64,
        upper_bound: f64,
    },
}

impl Distribution {
    fn validate(&self) -> ModelResult<()> {
        match *self {
            Distribution::Normal { mu, sigma } | Distribution::LogNormal { mu, sigma } => {
                check_mean(mu)?;
                if let Some(sigma) = sigma {
                    if !sigma.is_finite() || sigma < 0.0 {
                        return Err(ModelError::InvalidStandardDeviation { sigma });
                    }
                }
            }
            Distribution::Indicator { probability } => {
                if !(0.0..=1.0).contains(&probability) {
                    return Err(ModelError::InvalidProbability { probability });
                }
            }
            Distribution::Uniform { lower_bound, upper_bound } => {
                // Width must be finite too, or the sampler overflows
                let width = upper_bound - lower_bound;
                if !lower_bound.is_finite() || !upper_bound.is_finite() || !width.is_finite() || width <= 0.0 {
                    return Err(ModelError::InvalidBounds { lower: lower_bound, upper: upper_bound });
                }
            }
            Distribution::BoundedNormal { mu, sigma, lower_bound, upper_bound } => {
                check_mean(mu)?;
                if !sigma.is_finite() || sigma <= 0.0 {
                    return Err(ModelError::InvalidStandardDeviation { sigma });
                }
                // Infinite bounds are allowed for one-sided truncation
                if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound >= upper_bound {
                    return Err(ModelError::InvalidBounds { lower: lower_bound, upper: upper_bound });
                }
            }
        }
        Ok(())
    }
}

fn check_mean(mu: f64) -> ModelResult<()> {
    if mu.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter(format!("mu must be finite, got {}", mu)))
    }
}

/// A validated random variable
///
/// Parameters are immutable after construction. The generator is always passed
/// in by the caller; no state is shared between calls apart from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
    distribution: Distribution,
}

impl RandomVariable {
    /// Validate a distribution and wrap it
    pub fn new(distribution: Distribution) -> ModelResult<Self> {
        distribution.validate()?;
        Ok(Self { distribution })
    }

    pub fn normal(mu: f64, sigma: Option<f64>) -> ModelResult<Self> {
        Self::new(Distribution::Normal { mu, sigma })
    }

    pub fn log_normal(mu: f64, sigma: Option<f64>) -> ModelResult<Self> {
        Self::new(Distribution::LogNormal { mu, sigma })
    }

    pub fn indicator(probability: f64) -> ModelResult<Self> {
        Self::new(Distribution::Indicator { probability })
    }

    pub fn uniform(lower_bound: f64, upper_bound: f64) -> ModelResult<Self> {
        Self::new(Distribution::Uniform { lower_bound, upper_bound })
    }

    pub fn bounded_normal(mu: f64, sigma: f64, lower_bound: f64, upper_bound: f64) -> ModelResult<Self> {
        Self::new(Distribution::BoundedNormal { mu, sigma, lower_bound, upper_bound })
    }

    /// The underlying distribution parameters
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Draw a scalar when `shape` is `None`, otherwise a grid of that shape
    pub fn sample<R: Rng + ?Sized>(&self, shape: Option<Shape>, rng: &mut R) -> Sample {
        match shape {
            None => Sample::Scalar(self.sample_scalar(rng)),
            Some(shape) => Sample::Grid(self.sample_grid(shape, rng)),
        }
    }

    /// Draw a single value
    pub fn sample_scalar<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.distribution {
            Distribution::BoundedNormal { mu, sigma, lower_bound, upper_bound } => loop {
                let value = gaussian(mu, sigma, rng);
                if lower_bound < value && value < upper_bound {
                    break value;
                }
            },
            _ => self.draw(rng),
        }
    }

    /// Draw an i.i.d. grid of the given shape, filled in row-major order
    pub fn sample_grid<R: Rng + ?Sized>(&self, shape: Shape, rng: &mut R) -> Array2<f64> {
        let mut grid = Array2::from_shape_simple_fn(shape, || self.draw(rng));

        if let Distribution::BoundedNormal { mu, sigma, lower_bound, upper_bound } = self.distribution {
            let outside = |v: f64| v <= lower_bound || v >= upper_bound;
            let mut rounds = 0usize;
            // Redraw only the rejected cells until a full pass accepts everything
            loop {
                let mut rejected = 0usize;
                for cell in grid.iter_mut().filter(|cell| outside(**cell)) {
                    *cell = gaussian(mu, sigma, rng);
                    rejected += 1;
                }
                if rejected == 0 {
                    break;
                }
                rounds += 1;
            }
            trace!("bounded normal accepted after {} resampling rounds", rounds);
        }

        grid
    }

    /// One unconstrained draw from the variant's base distribution
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.distribution {
            Distribution::Normal { mu, sigma } => match spread(sigma) {
                Some(sigma) => gaussian(mu, sigma, rng),
                None => mu,
            },
            Distribution::LogNormal { mu, sigma } => match spread(sigma) {
                Some(sigma) => gaussian(mu - 0.5 * sigma * sigma, sigma, rng).exp() - 1.0,
                None => mu,
            },
            Distribution::Indicator { probability } => {
                if rng.gen_bool(probability) {
                    1.0
                } else {
                    0.0
                }
            }
            Distribution::Uniform { lower_bound, upper_bound } => rng.gen_range(lower_bound..upper_bound),
            Distribution::BoundedNormal { mu, sigma, .. } => gaussian(mu, sigma, rng),
        }
    }
}

/// A zero spread means "no uncertainty"
fn spread(sigma: Option<f64>) -> Option<f64> {
    sigma.filter(|&s| s != 0.0)
}

fn gaussian<R: Rng + ?Sized>(mu: f64, sigma: f64, rng: &mut R) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mu + sigma * z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn mean(grid: &Array2<f64>) -> f64 {
        grid.sum() / grid.len() as f64
    }

    #[test]
    fn test_normal_without_sigma_is_constant() {
        let mut rng = StdRng::seed_from_u64(1);
        let rv = RandomVariable::normal(0.95, None).unwrap();
        assert_eq!(rv.sample(None, &mut rng), Sample::Scalar(0.95));

        let zero_sigma = RandomVariable::normal(0.95, Some(0.0)).unwrap();
        let grid = zero_sigma.sample_grid((4, 5), &mut rng);
        assert!(grid.iter().all(|&v| v == 0.95));
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = StdRng::seed_from_u64(999);
        let rv = RandomVariable::normal(50.0, Some(5.0)).unwrap();
        let grid = rv.sample_grid((100, 200), &mut rng);

        let m = mean(&grid);
        let var = grid.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / (grid.len() - 1) as f64;
        assert_abs_diff_eq!(m, 50.0, epsilon = 0.5);
        assert!(var > 20.0 && var < 30.0, "variance out of range: {}", var);
    }

    #[test]
    fn test_log_normal_is_mean_adjusted_rate() {
        let mut rng = StdRng::seed_from_u64(7);
        let rv = RandomVariable::log_normal(0.03, Some(0.1)).unwrap();
        let grid = rv.sample_grid((200, 100), &mut rng);

        // E[exp(N(mu - s²/2, s))] = exp(mu), re-centred by -1
        assert_abs_diff_eq!(mean(&grid), 0.03_f64.exp() - 1.0, epsilon = 0.005);
        assert!(grid.iter().all(|&v| v > -1.0));
    }

    #[test]
    fn test_log_normal_without_sigma_returns_mu() {
        let mut rng = StdRng::seed_from_u64(7);
        let rv = RandomVariable::log_normal(0.04, None).unwrap();
        assert_eq!(rv.sample_scalar(&mut rng), 0.04);
    }

    #[test]
    fn test_indicator_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let always = RandomVariable::indicator(1.0).unwrap();
        let never = RandomVariable::indicator(0.0).unwrap();

        assert!(always.sample_grid((12, 50), &mut rng).iter().all(|&v| v == 1.0));
        assert!(never.sample_grid((12, 50), &mut rng).iter().all(|&v| v == 0.0));
        assert_eq!(always.sample_scalar(&mut rng), 1.0);
    }

    #[test]
    fn test_indicator_frequency() {
        let mut rng = StdRng::seed_from_u64(11);
        let rv = RandomVariable::indicator(0.99).unwrap();
        let grid = rv.sample_grid((100, 100), &mut rng);

        assert!(grid.iter().all(|&v| v == 0.0 || v == 1.0));
        assert_abs_diff_eq!(mean(&grid), 0.99, epsilon = 0.01);
    }

    #[test]
    fn test_indicator_rejects_probability_outside_unit_interval() {
        assert_eq!(
            RandomVariable::indicator(1.2),
            Err(ModelError::InvalidProbability { probability: 1.2 })
        );
        assert!(RandomVariable::indicator(-0.1).is_err());
        assert!(RandomVariable::indicator(f64::NAN).is_err());
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = StdRng::seed_from_u64(789);
        let rv = RandomVariable::uniform(10.0, 20.0).unwrap();
        let grid = rv.sample_grid((50, 200), &mut rng);

        assert!(grid.iter().all(|&v| (10.0..20.0).contains(&v)));
        assert_abs_diff_eq!(mean(&grid), 15.0, epsilon = 0.3);
    }

    #[test]
    fn test_uniform_rejects_inverted_bounds() {
        assert!(matches!(
            RandomVariable::uniform(5.0, 5.0),
            Err(ModelError::InvalidBounds { .. })
        ));
        assert!(RandomVariable::uniform(6.0, 5.0).is_err());
    }

    #[test]
    fn test_uniform_rejects_overflowing_width() {
        assert!(matches!(
            RandomVariable::uniform(-1e308, 1e308),
            Err(ModelError::InvalidBounds { .. })
        ));

        let mut rng = StdRng::seed_from_u64(3);
        let wide = RandomVariable::uniform(-1e307, 1e307).unwrap();
        let value = wide.sample_scalar(&mut rng);
        assert!((-1e307..1e307).contains(&value));
    }

    #[test]
    fn test_bounded_normal_stays_strictly_inside() {
        let mut rng = StdRng::seed_from_u64(42);
        // Mean sits on the upper bound so roughly half of the first draws are rejected
        let rv = RandomVariable::bounded_normal(1.0, 0.2, 0.5, 1.0).unwrap();
        let grid = rv.sample_grid((120, 100), &mut rng);

        assert_eq!(grid.dim(), (120, 100));
        assert!(grid.iter().all(|&v| v > 0.5 && v < 1.0));

        for _ in 0..1000 {
            let v = rv.sample_scalar(&mut rng);
            assert!(v > 0.5 && v < 1.0, "scalar draw {} escaped the bounds", v);
        }
    }

    #[test]
    fn test_bounded_normal_one_sided() {
        let mut rng = StdRng::seed_from_u64(5);
        let rv = RandomVariable::bounded_normal(0.0, 1.0, 0.0, f64::INFINITY).unwrap();
        assert!(rv.sample_grid((30, 30), &mut rng).iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_bounded_normal_validation() {
        assert!(matches!(
            RandomVariable::bounded_normal(0.5, 0.1, 1.0, 0.0),
            Err(ModelError::InvalidBounds { .. })
        ));
        assert!(matches!(
            RandomVariable::bounded_normal(0.5, 0.0, 0.0, 1.0),
            Err(ModelError::InvalidStandardDeviation { .. })
        ));
        assert!(RandomVariable::normal(0.0, Some(-1.0)).is_err());
        assert!(RandomVariable::normal(f64::NAN, None).is_err());
    }

    #[test]
    fn test_sample_shape_contract() {
        let mut rng = StdRng::seed_from_u64(8);
        let rv = RandomVariable::uniform(0.0, 1.0).unwrap();

        assert!(rv.sample(None, &mut rng).as_scalar().is_some());
        match rv.sample(Some((7, 3)), &mut rng) {
            Sample::Grid(grid) => assert_eq!(grid.dim(), (7, 3)),
            Sample::Scalar(_) => panic!("Expected a grid"),
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let rv = RandomVariable::bounded_normal(0.9, 0.1, 0.0, 1.0).unwrap();
        let a = rv.sample_grid((12, 40), &mut StdRng::seed_from_u64(2024));
        let b = rv.sample_grid((12, 40), &mut StdRng::seed_from_u64(2024));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distribution_deserializes_from_tagged_json() {
        let json = r#"{"distribution": "bounded_normal", "mu": 0.9, "sigma": 0.05, "lower_bound": 0.0, "upper_bound": 1.0}"#;
        let dist: Distribution = serde_json::from_str(json).unwrap();
        assert_eq!(
            dist,
            Distribution::BoundedNormal { mu: 0.9, sigma: 0.05, lower_bound: 0.0, upper_bound: 1.0 }
        );

        let json = r#"{"distribution": "normal", "mu": 120.0}"#;
        let dist: Distribution = serde_json::from_str(json).unwrap();
        assert_eq!(dist, Distribution::Normal { mu: 120.0, sigma: None });
    }
}
