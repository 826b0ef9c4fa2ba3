//! Deterministic loan amortization

mod schedule;

pub use schedule::{AmortizationRow, AmortizationSchedule};
