//! Monte Carlo simulation of leveraged property returns

mod engine;
mod results;

pub use engine::{MonteCarloSimulator, SimulationConfig, DEFAULT_CAGR_PERIOD_BASIS};
pub use results::{Metric, PeriodStatistics, SimulationResults, SimulationSummary};
