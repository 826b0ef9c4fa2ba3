//! Rental revenue model

use ndarray::Array2;
use rand::Rng;

use crate::error::{ensure_non_negative, ModelResult};
use crate::random::{Sample, ScalarOrRandom, Shape};

/// Revenue = rent × occupancy, per period and trial
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueModel {
    /// Expected periodic rent
    rent: f64,
    /// Fraction of the period that is let; not clamped to [0, 1]
    occupancy_rate: ScalarOrRandom,
}

impl RevenueModel {
    pub fn new(rent: f64, occupancy_rate: impl Into<ScalarOrRandom>) -> ModelResult<Self> {
        Ok(Self {
            rent: ensure_non_negative("rent", rent)?,
            occupancy_rate: ScalarOrRandom::validate(occupancy_rate.into(), "occupancy rate")?,
        })
    }

    pub fn rent(&self) -> f64 {
        self.rent
    }

    pub fn occupancy_rate(&self) -> &ScalarOrRandom {
        &self.occupancy_rate
    }

    /// Scalar revenue when `shape` is `None`, otherwise a grid
    pub fn sample<R: Rng + ?Sized>(&self, shape: Option<Shape>, rng: &mut R) -> Sample {
        match self.occupancy_rate.resolve(shape, rng) {
            Sample::Scalar(occupancy) => Sample::Scalar(self.rent * occupancy),
            Sample::Grid(occupancy) => Sample::Grid(occupancy * self.rent),
        }
    }

    pub fn revenue<R: Rng + ?Sized>(&self, shape: Shape, rng: &mut R) -> Array2<f64> {
        self.occupancy_rate.resolve_grid(shape, rng) * self.rent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::random::RandomVariable;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_constant_occupancy() {
        let mut rng = StdRng::seed_from_u64(1);
        let model = RevenueModel::new(2000.0, 0.9).unwrap();
        let grid = model.revenue((12, 10), &mut rng);

        assert_eq!(grid.dim(), (12, 10));
        assert!(grid.iter().all(|&v| (v - 1800.0).abs() < 1e-9));
        assert_eq!(model.sample(None, &mut rng), Sample::Scalar(1800.0));
    }

    #[test]
    fn test_random_occupancy_scales_draws() {
        let occupancy = RandomVariable::bounded_normal(0.9, 0.05, 0.0, 1.0).unwrap();
        let model = RevenueModel::new(1500.0, occupancy.clone()).unwrap();

        let draws = occupancy.sample_grid((6, 8), &mut StdRng::seed_from_u64(4));
        let revenue = model.revenue((6, 8), &mut StdRng::seed_from_u64(4));
        assert_eq!(revenue, draws * 1500.0);
        assert!(revenue.iter().all(|&v| v > 0.0 && v < 1500.0));
    }

    #[test]
    fn test_zero_rent_or_occupancy_is_zero_revenue() {
        let mut rng = StdRng::seed_from_u64(1);
        let no_rent = RevenueModel::new(0.0, 0.95).unwrap();
        let vacant = RevenueModel::new(1200.0, 0.0).unwrap();
        let unset = RevenueModel::new(1200.0, ScalarOrRandom::Absent).unwrap();

        for model in [no_rent, vacant, unset] {
            assert!(model.revenue((3, 3), &mut rng).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_negative_rent_rejected() {
        assert!(RevenueModel::new(-10.0, 1.0).is_err());
    }

    #[test]
    fn test_non_finite_occupancy_rejected() {
        assert!(matches!(
            RevenueModel::new(1000.0, f64::NAN),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(RevenueModel::new(1000.0, f64::INFINITY).is_err());
    }
}
