//! Revenue, expense and tax-benefit models feeding the simulator

mod revenue;
mod expense;
mod tax;

pub use revenue::RevenueModel;
pub use expense::{ExpenseAccounting, ExpenseBreakdown, ExpenseCategory, ExpenseGroup, ExpenseModel};
pub use tax::{TaxAssumptions, TaxBenefitModel};
