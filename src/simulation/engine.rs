//! Monte Carlo engine combining amortization, revenue, expense and tax models

use std::time::Instant;

use log::{info, warn};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::results::{SimulationResults, SimulationSummary};
use crate::amortization::AmortizationSchedule;
use crate::error::{ensure_non_negative, ModelError, ModelResult};
use crate::models::{ExpenseModel, RevenueModel, TaxBenefitModel};

/// Periods per "year" used when annualising cumulative returns
pub const DEFAULT_CAGR_PERIOD_BASIS: f64 = 30.0;

/// Run-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of independent trials
    pub n_simulations: usize,

    /// Initial equity contributed at purchase
    pub equity: f64,

    /// Seed for the generator; `None` draws one from the OS
    pub seed: Option<u64>,

    /// CAGR exponent is 1 / (n_periods / cagr_period_basis)
    pub cagr_period_basis: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_simulations: 1_000,
            equity: 0.0,
            seed: None,
            cagr_period_basis: DEFAULT_CAGR_PERIOD_BASIS,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> ModelResult<()> {
        if self.n_simulations == 0 {
            return Err(ModelError::ZeroSimulations);
        }
        ensure_non_negative("equity", self.equity)?;
        if !(self.cagr_period_basis.is_finite() && self.cagr_period_basis > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "CAGR period basis must be positive, got {}",
                self.cagr_period_basis
            )));
        }
        Ok(())
    }
}

/// Monte Carlo simulator for one leveraged property
///
/// Lifecycle: constructed, then populated by `run`. Each `run` recomputes every
/// grid from scratch; the generator keeps advancing between runs unless
/// `reseed` is called.
pub struct MonteCarloSimulator {
    schedule: AmortizationSchedule,
    revenue: RevenueModel,
    expenses: ExpenseModel,
    tax_benefit: TaxBenefitModel,
    config: SimulationConfig,
    rng: StdRng,
    results: Option<SimulationResults>,
}

impl MonteCarloSimulator {
    pub fn new(
        schedule: AmortizationSchedule,
        revenue: RevenueModel,
        expenses: ExpenseModel,
        tax_benefit: TaxBenefitModel,
        config: SimulationConfig,
    ) -> ModelResult<Self> {
        config.validate()?;
        if tax_benefit.n_periods() != schedule.n_periods() {
            return Err(ModelError::InvalidParameter(format!(
                "tax benefit spread over {} periods but the loan runs {}",
                tax_benefit.n_periods(),
                schedule.n_periods()
            )));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            schedule,
            revenue,
            expenses,
            tax_benefit,
            config,
            rng,
            results: None,
        })
    }

    pub fn schedule(&self) -> &AmortizationSchedule {
        &self.schedule
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Debt plus initial equity
    pub fn property_value(&self) -> f64 {
        self.schedule.debt() + self.config.equity
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.schedule.n_periods(), self.config.n_simulations)
    }

    /// Restart the generator so the next run is reproducible
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn is_populated(&self) -> bool {
        self.results.is_some()
    }

    /// Results of the latest run, if any
    pub fn results(&self) -> Option<&SimulationResults> {
        self.results.as_ref()
    }

    /// Recompute every result grid
    pub fn run(&mut self) -> &SimulationResults {
        let results = self.simulate();
        self.results.insert(results)
    }

    /// Summary of the populated results, running once first if needed
    pub fn analyze(&mut self) -> SimulationSummary {
        let results = match self.results.take() {
            Some(results) => results,
            None => self.simulate(),
        };
        let summary = results.summary();
        self.results = Some(results);
        summary
    }

    fn simulate(&mut self) -> SimulationResults {
        let start = Instant::now();
        let shape = self.shape();
        let (n_periods, n_simulations) = shape;
        info!(
            "simulating {} periods x {} trials (debt={:.2}, equity={:.2})",
            n_periods, n_simulations, self.schedule.debt(), self.config.equity
        );

        // Stochastic inputs, sampled in a fixed order
        let revenue = self.revenue.revenue(shape, &mut self.rng);
        let expense = self.expenses.total(shape, &mut self.rng);

        // Deterministic debt service, shared by every trial
        let interest = self.schedule.interest_column();
        let principal = self.schedule.principal_column();
        let equity = self.schedule.equity_column();

        let tax_benefit = self.tax_benefit.benefit(&interest, shape);

        let cash_flow = &revenue + &tax_benefit - &expense - &interest - &principal;
        let total_return = &cash_flow + &principal;

        // Equity base before this period's principal paydown
        let equity_base = &equity + self.config.equity - &principal;
        let cash_return_on_equity = &cash_flow / &equity_base;
        let total_return_on_equity = &total_return / &equity_base;

        let cumulative_cash_return = cumulative_return(&cash_flow, self.config.equity);
        let cumulative_total_return = cumulative_return(&total_return, self.config.equity);

        let years = n_periods as f64 / self.config.cagr_period_basis;
        let cash_cagr = annualise(&cumulative_cash_return, years);
        let total_cagr = annualise(&cumulative_total_return, years);

        let results = SimulationResults {
            n_periods,
            n_simulations,
            revenue,
            expense,
            tax_benefit,
            cash_flow,
            total_return,
            cash_return_on_equity,
            total_return_on_equity,
            cumulative_cash_return,
            cumulative_total_return,
            cash_cagr,
            total_cagr,
        };

        let non_finite = results.non_finite_cells();
        if non_finite > 0 {
            warn!("{} result cells are infinite or NaN (zero equity base)", non_finite);
        }
        info!("simulation complete in {:?}", start.elapsed());

        results
    }
}

/// Running sum over the time axis, divided by initial equity
fn cumulative_return(grid: &Array2<f64>, initial_equity: f64) -> Array2<f64> {
    let mut cumulative = grid.clone();
    cumulative.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
    cumulative / initial_equity
}

/// (1 + final cumulative return)^(1 / years) - 1 for each trial
fn annualise(cumulative: &Array2<f64>, years: f64) -> Array1<f64> {
    let last = cumulative.nrows() - 1;
    cumulative
        .row(last)
        .mapv(|r| (1.0 + r).powf(1.0 / years) - 1.0)
}
