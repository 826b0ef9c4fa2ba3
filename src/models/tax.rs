//! Tax benefit model: interest, depreciation and property-tax deductions

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ModelError, ModelResult};
use crate::random::Shape;

/// Deduction assumptions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxAssumptions {
    /// Haircut on the straight-line depreciation deduction (observed at 1.0 and 0.5)
    pub uncertainty_discount_factor: f64,
    /// Share of interest expense recovered through the deduction
    pub interest_deduction_rate: f64,
    /// Annual property tax as a share of property value
    pub property_tax_rate: f64,
    /// Cap on the periodic property-tax deduction
    pub property_tax_cap: f64,
    /// Replace the formula with a constant benefit per period
    pub fixed_benefit: Option<f64>,
}

impl Default for TaxAssumptions {
    fn default() -> Self {
        Self {
            uncertainty_discount_factor: 1.0,
            interest_deduction_rate: 0.3,
            property_tax_rate: 0.02,
            property_tax_cap: 10_000.0,
            fixed_benefit: None,
        }
    }
}

impl TaxAssumptions {
    fn validate(&self) -> ModelResult<()> {
        ensure_non_negative("uncertainty discount factor", self.uncertainty_discount_factor)?;
        ensure_non_negative("interest deduction rate", self.interest_deduction_rate)?;
        ensure_non_negative("property tax rate", self.property_tax_rate)?;
        ensure_non_negative("property tax cap", self.property_tax_cap)?;
        if let Some(fixed) = self.fixed_benefit {
            crate::error::ensure_finite("fixed tax benefit", fixed)?;
        }
        Ok(())
    }
}

/// Periodic tax benefit for a property held over `n_periods`
#[derive(Debug, Clone, PartialEq)]
pub struct TaxBenefitModel {
    n_periods: usize,
    property_value: f64,
    assumptions: TaxAssumptions,
}

impl TaxBenefitModel {
    pub fn new(n_periods: usize, property_value: f64, assumptions: TaxAssumptions) -> ModelResult<Self> {
        if n_periods == 0 {
            return Err(ModelError::ZeroPeriods);
        }
        assumptions.validate()?;
        Ok(Self {
            n_periods,
            property_value: ensure_non_negative("property value", property_value)?,
            assumptions,
        })
    }

    /// Constant benefit per period regardless of interest paid
    pub fn fixed(n_periods: usize, property_value: f64, benefit: f64) -> ModelResult<Self> {
        Self::new(
            n_periods,
            property_value,
            TaxAssumptions {
                fixed_benefit: Some(benefit),
                ..TaxAssumptions::default()
            },
        )
    }

    /// Holding period the depreciation is spread over
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    pub fn assumptions(&self) -> &TaxAssumptions {
        &self.assumptions
    }

    pub fn property_value(&self) -> f64 {
        self.property_value
    }

    /// Depreciation plus property-tax deductions, independent of interest
    pub fn base_deduction(&self) -> f64 {
        let a = &self.assumptions;
        let depreciation = self.property_value / self.n_periods as f64;
        let property_tax = (self.property_value * a.property_tax_rate / 12.0).min(a.property_tax_cap);
        depreciation * a.uncertainty_discount_factor + property_tax
    }

    /// Benefit for a single period's interest expense
    pub fn benefit_scalar(&self, interest_expense: f64) -> f64 {
        match self.assumptions.fixed_benefit {
            Some(fixed) => fixed,
            None => interest_expense * self.assumptions.interest_deduction_rate + self.base_deduction(),
        }
    }

    /// Benefit grid of `shape`
    ///
    /// `interest_expense` must broadcast to `shape`; the simulator passes the
    /// schedule's (n_periods, 1) interest column.
    pub fn benefit(&self, interest_expense: &Array2<f64>, shape: Shape) -> Array2<f64> {
        let mut grid = Array2::zeros(shape);
        match self.assumptions.fixed_benefit {
            Some(fixed) => grid.fill(fixed),
            None => grid += &interest_expense.mapv(|interest| self.benefit_scalar(interest)),
        }
        grid
    }
}
