//! Result grids and their summaries

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Output grids of one simulation run
///
/// Every grid has shape (n_periods, n_simulations); the CAGR series hold one
/// value per trial.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResults {
    pub n_periods: usize,
    pub n_simulations: usize,

    pub revenue: Array2<f64>,
    pub expense: Array2<f64>,
    pub tax_benefit: Array2<f64>,

    /// Revenue plus tax benefit, less expenses and debt service
    pub cash_flow: Array2<f64>,
    /// Cash flow plus the principal repaid this period
    pub total_return: Array2<f64>,

    pub cash_return_on_equity: Array2<f64>,
    pub total_return_on_equity: Array2<f64>,

    /// Running sum of cash flow over initial equity
    pub cumulative_cash_return: Array2<f64>,
    /// Running sum of total return over initial equity
    pub cumulative_total_return: Array2<f64>,

    pub cash_cagr: Array1<f64>,
    pub total_cagr: Array1<f64>,
}

/// Selects one of the result grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    Expense,
    TaxBenefit,
    CashFlow,
    TotalReturn,
    CashReturnOnEquity,
    TotalReturnOnEquity,
    CumulativeCashReturn,
    CumulativeTotalReturn,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Revenue,
        Metric::Expense,
        Metric::TaxBenefit,
        Metric::CashFlow,
        Metric::TotalReturn,
        Metric::CashReturnOnEquity,
        Metric::TotalReturnOnEquity,
        Metric::CumulativeCashReturn,
        Metric::CumulativeTotalReturn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::Expense => "expense",
            Metric::TaxBenefit => "tax_benefit",
            Metric::CashFlow => "cash_flow",
            Metric::TotalReturn => "total_return",
            Metric::CashReturnOnEquity => "cash_return_on_equity",
            Metric::TotalReturnOnEquity => "total_return_on_equity",
            Metric::CumulativeCashReturn => "cumulative_cash_return",
            Metric::CumulativeTotalReturn => "cumulative_total_return",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == key)
            .ok_or_else(|| format!("Unknown metric: {}", s))
    }
}

/// Cross-trial statistics for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    /// Period number (1-indexed)
    pub period: usize,
    pub mean: f64,
    /// Sample variance (n - 1 denominator, 0 for a single trial)
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

/// Headline figures for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub n_periods: usize,
    pub n_simulations: usize,

    // Cash flow summed over the holding period, per trial
    pub terminal_cash_flow_mean: f64,
    pub terminal_cash_flow_min: f64,
    pub terminal_cash_flow_max: f64,

    // Across every period and trial
    pub periodic_cash_flow_mean: f64,
    pub periodic_cash_flow_std: f64,
    pub cash_flow_sharpe_ratio: f64,

    pub mean_revenue: f64,
    pub mean_expense: f64,
    pub mean_tax_benefit: f64,

    pub mean_cash_cagr: f64,
    pub mean_total_cagr: f64,
}

impl SimulationResults {
    pub fn shape(&self) -> (usize, usize) {
        (self.n_periods, self.n_simulations)
    }

    pub fn grid(&self, metric: Metric) -> &Array2<f64> {
        match metric {
            Metric::Revenue => &self.revenue,
            Metric::Expense => &self.expense,
            Metric::TaxBenefit => &self.tax_benefit,
            Metric::CashFlow => &self.cash_flow,
            Metric::TotalReturn => &self.total_return,
            Metric::CashReturnOnEquity => &self.cash_return_on_equity,
            Metric::TotalReturnOnEquity => &self.total_return_on_equity,
            Metric::CumulativeCashReturn => &self.cumulative_cash_return,
            Metric::CumulativeTotalReturn => &self.cumulative_total_return,
        }
    }

    /// Number of infinite or NaN cells across all grids
    pub fn non_finite_cells(&self) -> usize {
        Metric::ALL
            .iter()
            .map(|&m| self.grid(m).iter().filter(|v| !v.is_finite()).count())
            .sum()
    }

    /// Per-period statistics of `metric` across trials
    pub fn period_statistics(&self, metric: Metric) -> Vec<PeriodStatistics> {
        let grid = self.grid(metric);
        (0..grid.nrows())
            .into_par_iter()
            .map(|t| {
                let moments = Moments::from_values(grid.row(t).iter().copied());
                PeriodStatistics {
                    period: t + 1,
                    mean: moments.mean,
                    variance: moments.variance,
                    min: moments.min,
                    max: moments.max,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> SimulationSummary {
        let totals = self.cash_flow.sum_axis(Axis(0));
        let terminal = Moments::from_values(totals.iter().copied());
        let periodic = Moments::from_values(self.cash_flow.iter().copied());

        SimulationSummary {
            n_periods: self.n_periods,
            n_simulations: self.n_simulations,
            terminal_cash_flow_mean: terminal.mean,
            terminal_cash_flow_min: terminal.min,
            terminal_cash_flow_max: terminal.max,
            periodic_cash_flow_mean: periodic.mean,
            periodic_cash_flow_std: periodic.std(),
            cash_flow_sharpe_ratio: periodic.mean / periodic.std(),
            mean_revenue: grid_mean(&self.revenue),
            mean_expense: grid_mean(&self.expense),
            mean_tax_benefit: grid_mean(&self.tax_benefit),
            mean_cash_cagr: Moments::from_values(self.cash_cagr.iter().copied()).mean,
            mean_total_cagr: Moments::from_values(self.total_cagr.iter().copied()).mean,
        }
    }
}

fn grid_mean(grid: &Array2<f64>) -> f64 {
    grid.mean().unwrap_or(f64::NAN)
}

/// Single-pass sample statistics
#[derive(Debug, Clone, Copy)]
struct Moments {
    mean: f64,
    variance: f64,
    min: f64,
    max: f64,
}

impl Moments {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        // Welford update
        let mut n = 0usize;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for x in values {
            n += 1;
            let delta = x - mean;
            mean += delta / n as f64;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }

        match n {
            0 => Self { mean: f64::NAN, variance: f64::NAN, min: f64::NAN, max: f64::NAN },
            1 => Self { mean, variance: 0.0, min, max },
            _ => Self { mean, variance: m2 / (n - 1) as f64, min, max },
        }
    }

    fn std(&self) -> f64 {
        self.variance.sqrt()
    }
}
