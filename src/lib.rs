//! Real-estate simulator - Monte Carlo engine for leveraged rental property returns
//!
//! This library provides:
//! - Random inputs that are constant, absent or drawn from a distribution
//! - Level-payment loan amortization
//! - Revenue, expense and tax-benefit models
//! - Cash flow, return on equity and CAGR grids across many trials
//! - JSON scenario files and a parallel scenario runner

pub mod error;
pub mod random;
pub mod amortization;
pub mod models;
pub mod simulation;
pub mod config;
pub mod scenario;

// Re-export commonly used types
pub use error::{ConfigError, ModelError, ModelResult};
pub use random::{Distribution, RandomVariable, ScalarOrRandom};
pub use amortization::{AmortizationRow, AmortizationSchedule};
pub use models::{ExpenseAccounting, ExpenseCategory, ExpenseModel, RevenueModel, TaxAssumptions, TaxBenefitModel};
pub use simulation::{Metric, MonteCarloSimulator, SimulationConfig, SimulationResults, SimulationSummary};
pub use config::ScenarioConfig;
pub use scenario::{ScenarioOutcome, ScenarioRunner};
