//! Level-payment amortization schedule for a fixed-rate loan

use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ModelError, ModelResult};

/// A single period of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Period index (0-indexed)
    pub period: usize,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    /// Outstanding debt after this period's payment
    pub remaining_debt: f64,
    /// Principal repaid so far, including this period
    pub cumulative_equity: f64,
}

/// Complete schedule, computed once at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    debt: f64,
    rate: f64,
    n_periods: usize,
    payment: f64,
    rows: Vec<AmortizationRow>,
}

impl AmortizationSchedule {
    /// Build the schedule for `debt` at periodic `rate` over `n_periods` payments
    pub fn new(debt: f64, rate: f64, n_periods: usize) -> ModelResult<Self> {
        if n_periods == 0 {
            return Err(ModelError::ZeroPeriods);
        }
        let debt = ensure_non_negative("debt", debt)?;
        let rate = ensure_non_negative("periodic rate", rate)?;

        let payment = level_payment(debt, rate, n_periods);
        debug!(
            "amortization: debt={:.2} rate={} periods={} payment={:.4}",
            debt, rate, n_periods, payment
        );

        let mut rows = Vec::with_capacity(n_periods);
        let mut remaining_debt = debt;
        let mut cumulative_equity = 0.0;

        // Each period's interest depends on the prior period's closing balance
        for period in 0..n_periods {
            let interest = remaining_debt * rate;
            let principal = payment - interest;

            remaining_debt -= principal;
            cumulative_equity += principal;

            rows.push(AmortizationRow {
                period,
                payment,
                interest,
                principal,
                remaining_debt,
                cumulative_equity,
            });
        }

        Ok(Self { debt, rate, n_periods, payment, rows })
    }

    pub fn debt(&self) -> f64 {
        self.debt
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    /// Constant periodic payment
    pub fn payment(&self) -> f64 {
        self.payment
    }

    pub fn rows(&self) -> &[AmortizationRow] {
        &self.rows
    }

    pub fn payments(&self) -> Array1<f64> {
        self.series(|r| r.payment)
    }

    pub fn interest(&self) -> Array1<f64> {
        self.series(|r| r.interest)
    }

    pub fn principal(&self) -> Array1<f64> {
        self.series(|r| r.principal)
    }

    pub fn remaining_debt(&self) -> Array1<f64> {
        self.series(|r| r.remaining_debt)
    }

    pub fn cumulative_equity(&self) -> Array1<f64> {
        self.series(|r| r.cumulative_equity)
    }

    /// Interest as an (n_periods, 1) column for broadcasting across trials
    pub fn interest_column(&self) -> Array2<f64> {
        self.interest().insert_axis(Axis(1))
    }

    /// Principal as an (n_periods, 1) column for broadcasting across trials
    pub fn principal_column(&self) -> Array2<f64> {
        self.principal().insert_axis(Axis(1))
    }

    /// Cumulative equity as an (n_periods, 1) column for broadcasting across trials
    pub fn equity_column(&self) -> Array2<f64> {
        self.cumulative_equity().insert_axis(Axis(1))
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.interest).sum()
    }

    pub fn total_paid(&self) -> f64 {
        self.payment * self.n_periods as f64
    }

    fn series(&self, field: impl Fn(&AmortizationRow) -> f64) -> Array1<f64> {
        self.rows.iter().map(field).collect()
    }
}

/// Level payment that retires `debt` in exactly `n_periods` payments
///
/// An exactly-zero rate falls back to straight-line repayment.
fn level_payment(debt: f64, rate: f64, n_periods: usize) -> f64 {
    if rate == 0.0 {
        debt / n_periods as f64
    } else {
        // 1 - (1 + r)^-n
        let discount = -(-(n_periods as f64) * rate.ln_1p()).exp_m1();
        debt * rate / discount
    }
}
