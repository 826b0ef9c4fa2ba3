//! Expense model keyed by named categories
//!
//! Each configured category is sampled once per run. Categories roll up into
//! reporting groups; a few belong to two groups (loan and inspection are both
//! operating and financing costs, permit and furnishing are both operating and
//! one-time costs). `ExpenseAccounting` decides whether the total counts those
//! categories once or once per group.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::random::{ScalarOrRandom, Shape};

/// Reporting group an expense rolls up into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseGroup {
    Operating,
    CapitalExpenditure,
    FinancingAndTransaction,
    OneTime,
}

/// Named expense category
///
/// Serialized as its snake_case name; a trailing `_expense` is accepted when
/// parsing. Unknown names become `Other` and count as operating expenses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExpenseCategory {
    Hoa,
    Loan,
    Legal,
    Permit,
    Leasing,
    Utility,
    Security,
    Software,
    Insurance,
    Appraisal,
    Marketing,
    Furnishing,
    Inspection,
    Accounting,
    Landscaping,
    Maintenance,
    Refinancing,
    Advertising,
    PropertyTax,
    PestControl,
    Miscellaneous,
    TenantIncentive,
    PropertyManagement,
    CapitalExpenditure,
    InsuranceDeductible,
    RegulatoryCompliance,
    ProfessionalDevelopment,
    Other(String),
}

impl ExpenseCategory {
    /// Every named category, in sampling order
    pub const NAMED: [ExpenseCategory; 27] = [
        ExpenseCategory::Hoa,
        ExpenseCategory::Loan,
        ExpenseCategory::Legal,
        ExpenseCategory::Permit,
        ExpenseCategory::Leasing,
        ExpenseCategory::Utility,
        ExpenseCategory::Security,
        ExpenseCategory::Software,
        ExpenseCategory::Insurance,
        ExpenseCategory::Appraisal,
        ExpenseCategory::Marketing,
        ExpenseCategory::Furnishing,
        ExpenseCategory::Inspection,
        ExpenseCategory::Accounting,
        ExpenseCategory::Landscaping,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Refinancing,
        ExpenseCategory::Advertising,
        ExpenseCategory::PropertyTax,
        ExpenseCategory::PestControl,
        ExpenseCategory::Miscellaneous,
        ExpenseCategory::TenantIncentive,
        ExpenseCategory::PropertyManagement,
        ExpenseCategory::CapitalExpenditure,
        ExpenseCategory::InsuranceDeductible,
        ExpenseCategory::RegulatoryCompliance,
        ExpenseCategory::ProfessionalDevelopment,
    ];

    pub fn name(&self) -> &str {
        match self {
            ExpenseCategory::Hoa => "hoa",
            ExpenseCategory::Loan => "loan",
            ExpenseCategory::Legal => "legal",
            ExpenseCategory::Permit => "permit",
            ExpenseCategory::Leasing => "leasing",
            ExpenseCategory::Utility => "utility",
            ExpenseCategory::Security => "security",
            ExpenseCategory::Software => "software",
            ExpenseCategory::Insurance => "insurance",
            ExpenseCategory::Appraisal => "appraisal",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Furnishing => "furnishing",
            ExpenseCategory::Inspection => "inspection",
            ExpenseCategory::Accounting => "accounting",
            ExpenseCategory::Landscaping => "landscaping",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Refinancing => "refinancing",
            ExpenseCategory::Advertising => "advertising",
            ExpenseCategory::PropertyTax => "property_tax",
            ExpenseCategory::PestControl => "pest_control",
            ExpenseCategory::Miscellaneous => "miscellaneous",
            ExpenseCategory::TenantIncentive => "tenant_incentive",
            ExpenseCategory::PropertyManagement => "property_management",
            ExpenseCategory::CapitalExpenditure => "capital_expenditure",
            ExpenseCategory::InsuranceDeductible => "insurance_deductible",
            ExpenseCategory::RegulatoryCompliance => "regulatory_compliance",
            ExpenseCategory::ProfessionalDevelopment => "professional_development",
            ExpenseCategory::Other(name) => name,
        }
    }

    /// Groups this category contributes to
    pub fn groups(&self) -> &'static [ExpenseGroup] {
        use ExpenseGroup::*;
        match self {
            ExpenseCategory::Loan | ExpenseCategory::Inspection => &[Operating, FinancingAndTransaction],
            ExpenseCategory::Permit | ExpenseCategory::Furnishing => &[Operating, OneTime],
            ExpenseCategory::Appraisal | ExpenseCategory::Refinancing => &[FinancingAndTransaction],
            ExpenseCategory::InsuranceDeductible | ExpenseCategory::RegulatoryCompliance => &[OneTime],
            ExpenseCategory::CapitalExpenditure => &[CapitalExpenditure],
            _ => &[Operating],
        }
    }
}

impl From<String> for ExpenseCategory {
    fn from(name: String) -> Self {
        let key = name.trim().to_ascii_lowercase();
        let key = key.strip_suffix("_expense").unwrap_or(&key);
        ExpenseCategory::NAMED
            .iter()
            .find(|category| category.name() == key)
            .cloned()
            .unwrap_or_else(|| ExpenseCategory::Other(key.to_string()))
    }
}

impl From<&str> for ExpenseCategory {
    fn from(name: &str) -> Self {
        ExpenseCategory::from(name.to_string())
    }
}

impl From<ExpenseCategory> for String {
    fn from(category: ExpenseCategory) -> Self {
        category.name().to_string()
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How categories in more than one group enter the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseAccounting {
    /// Every category counts once
    #[default]
    Flat,
    /// Total is the sum of group subtotals, so shared categories count once per group
    Grouped,
}

/// Group subtotals and total from a single set of draws
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseBreakdown {
    pub operating: Array2<f64>,
    pub capital_expenditure: Array2<f64>,
    pub financing_and_transaction: Array2<f64>,
    pub one_time: Array2<f64>,
    pub total: Array2<f64>,
}

impl ExpenseBreakdown {
    fn zeros(shape: Shape) -> Self {
        Self {
            operating: Array2::zeros(shape),
            capital_expenditure: Array2::zeros(shape),
            financing_and_transaction: Array2::zeros(shape),
            one_time: Array2::zeros(shape),
            total: Array2::zeros(shape),
        }
    }

    pub fn group(&self, group: ExpenseGroup) -> &Array2<f64> {
        match group {
            ExpenseGroup::Operating => &self.operating,
            ExpenseGroup::CapitalExpenditure => &self.capital_expenditure,
            ExpenseGroup::FinancingAndTransaction => &self.financing_and_transaction,
            ExpenseGroup::OneTime => &self.one_time,
        }
    }

    fn group_mut(&mut self, group: ExpenseGroup) -> &mut Array2<f64> {
        match group {
            ExpenseGroup::Operating => &mut self.operating,
            ExpenseGroup::CapitalExpenditure => &mut self.capital_expenditure,
            ExpenseGroup::FinancingAndTransaction => &mut self.financing_and_transaction,
            ExpenseGroup::OneTime => &mut self.one_time,
        }
    }
}

/// Periodic expenses built from any number of categories
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpenseModel {
    expenses: BTreeMap<ExpenseCategory, ScalarOrRandom>,
    accounting: ExpenseAccounting,
}

impl ExpenseModel {
    pub fn new(accounting: ExpenseAccounting) -> Self {
        Self {
            expenses: BTreeMap::new(),
            accounting,
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, category: impl Into<ExpenseCategory>, input: impl Into<ScalarOrRandom>) -> ModelResult<Self> {
        self.set(category, input)?;
        Ok(self)
    }

    /// Configure a category; an `Absent` input removes it
    pub fn set(&mut self, category: impl Into<ExpenseCategory>, input: impl Into<ScalarOrRandom>) -> ModelResult<()> {
        let category = category.into();
        match ScalarOrRandom::validate(input.into(), category.name())? {
            ScalarOrRandom::Absent => {
                self.expenses.remove(&category);
            }
            input => {
                self.expenses.insert(category, input);
            }
        }
        Ok(())
    }

    /// Configured input for a category, `None` when it is absent
    pub fn get(&self, category: &ExpenseCategory) -> Option<&ScalarOrRandom> {
        self.expenses.get(category)
    }

    pub fn accounting(&self) -> ExpenseAccounting {
        self.accounting
    }

    pub fn categories(&self) -> impl Iterator<Item = &ExpenseCategory> {
        self.expenses.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Total expense grid
    pub fn total<R: Rng + ?Sized>(&self, shape: Shape, rng: &mut R) -> Array2<f64> {
        self.breakdown(shape, rng).total
    }

    /// Group subtotals and total, sampling each category exactly once
    pub fn breakdown<R: Rng + ?Sized>(&self, shape: Shape, rng: &mut R) -> ExpenseBreakdown {
        debug!(
            "sampling {} expense categories ({:?} accounting)",
            self.expenses.len(),
            self.accounting
        );

        let mut breakdown = ExpenseBreakdown::zeros(shape);
        for (category, input) in &self.expenses {
            let draws = input.resolve_grid(shape, rng);
            let groups = category.groups();
            for group in groups {
                *breakdown.group_mut(*group) += &draws;
            }
            match self.accounting {
                ExpenseAccounting::Flat => breakdown.total += &draws,
                ExpenseAccounting::Grouped => breakdown.total.scaled_add(groups.len() as f64, &draws),
            }
        }
        breakdown
    }
}
