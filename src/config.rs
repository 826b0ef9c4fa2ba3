//! JSON scenario descriptions
//!
//! A scenario file names the loan, the equity stake and every model input.
//! Inputs are written as a plain number, a distribution object tagged with
//! `"distribution"`, or `null`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::amortization::AmortizationSchedule;
use crate::error::{ensure_finite, ConfigError, ModelResult};
use crate::models::{ExpenseAccounting, ExpenseCategory, ExpenseModel, RevenueModel, TaxAssumptions, TaxBenefitModel};
use crate::random::{Distribution, RandomVariable, ScalarOrRandom};
use crate::simulation::{MonteCarloSimulator, SimulationConfig, DEFAULT_CAGR_PERIOD_BASIS};

/// Loan terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanConfig {
    pub debt: f64,
    /// Interest rate per period
    pub periodic_rate: f64,
    pub n_periods: usize,
}

/// A single model input as written in a scenario file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputConfig {
    Constant(f64),
    Random(Distribution),
}

// Numbers are constants, objects are distributions
impl<'de> Deserialize<'de> for InputConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InputVisitor;

        impl<'de> Visitor<'de> for InputVisitor {
            type Value = InputConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a distribution object")
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<InputConfig, E> {
                Ok(InputConfig::Constant(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<InputConfig, E> {
                Ok(InputConfig::Constant(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<InputConfig, E> {
                Ok(InputConfig::Constant(value as f64))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<InputConfig, A::Error> {
                Distribution::deserialize(de::value::MapAccessDeserializer::new(map)).map(InputConfig::Random)
            }
        }

        deserializer.deserialize_any(InputVisitor)
    }
}

impl InputConfig {
    /// Validate into a resolvable input
    pub fn to_input(&self) -> ModelResult<ScalarOrRandom> {
        match self {
            InputConfig::Constant(value) => Ok(ScalarOrRandom::Constant(ensure_finite("input", *value)?)),
            InputConfig::Random(distribution) => Ok(RandomVariable::new(distribution.clone())?.into()),
        }
    }
}

fn to_input(input: &Option<InputConfig>) -> ModelResult<ScalarOrRandom> {
    input.as_ref().map_or(Ok(ScalarOrRandom::Absent), InputConfig::to_input)
}

/// Expense map keyed by category; names that normalise to the same category are rejected
fn deserialize_expenses<'de, D>(deserializer: D) -> Result<BTreeMap<ExpenseCategory, Option<InputConfig>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<InputConfig>>::deserialize(deserializer)?;
    let mut expenses = BTreeMap::new();
    for (name, input) in raw {
        let category = ExpenseCategory::from(name.as_str());
        if expenses.contains_key(&category) {
            return Err(de::Error::custom(format!(
                "expense `{}` duplicates category `{}`",
                name, category
            )));
        }
        expenses.insert(category, input);
    }
    Ok(expenses)
}

fn default_simulations() -> usize {
    SimulationConfig::default().n_simulations
}

fn default_cagr_period_basis() -> f64 {
    DEFAULT_CAGR_PERIOD_BASIS
}

/// Complete description of one simulated property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub loan: LoanConfig,

    /// Initial equity contributed at purchase
    pub equity: f64,

    #[serde(default = "default_simulations")]
    pub n_simulations: usize,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Gross rent per period
    pub rent: f64,

    #[serde(default)]
    pub occupancy_rate: Option<InputConfig>,

    #[serde(default, deserialize_with = "deserialize_expenses")]
    pub expenses: BTreeMap<ExpenseCategory, Option<InputConfig>>,

    #[serde(default)]
    pub expense_accounting: ExpenseAccounting,

    #[serde(default)]
    pub tax: TaxAssumptions,

    #[serde(default = "default_cagr_period_basis")]
    pub cagr_period_basis: f64,
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        debug!("loaded scenario from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 30-year loan on a single rental with a handful of uncertain expenses
    pub fn example() -> Self {
        let expenses = [
            (ExpenseCategory::Utility, InputConfig::Constant(150.0)),
            (
                ExpenseCategory::Insurance,
                InputConfig::Random(Distribution::Normal { mu: 120.0, sigma: Some(10.0) }),
            ),
            (
                ExpenseCategory::Maintenance,
                InputConfig::Random(Distribution::Uniform { lower_bound: 50.0, upper_bound: 300.0 }),
            ),
            (ExpenseCategory::PropertyTax, InputConfig::Constant(350.0)),
            (ExpenseCategory::PropertyManagement, InputConfig::Constant(200.0)),
        ];

        Self {
            loan: LoanConfig { debt: 300_000.0, periodic_rate: 0.005, n_periods: 360 },
            equity: 75_000.0,
            n_simulations: 1_000,
            seed: Some(42),
            rent: 2_500.0,
            occupancy_rate: Some(InputConfig::Random(Distribution::BoundedNormal {
                mu: 0.93,
                sigma: 0.05,
                lower_bound: 0.0,
                upper_bound: 1.0,
            })),
            expenses: expenses.into_iter().map(|(category, input)| (category, Some(input))).collect(),
            expense_accounting: ExpenseAccounting::Flat,
            tax: TaxAssumptions::default(),
            cagr_period_basis: DEFAULT_CAGR_PERIOD_BASIS,
        }
    }

    /// Debt plus equity
    pub fn property_value(&self) -> f64 {
        self.loan.debt + self.equity
    }

    pub fn build_schedule(&self) -> ModelResult<AmortizationSchedule> {
        AmortizationSchedule::new(self.loan.debt, self.loan.periodic_rate, self.loan.n_periods)
    }

    pub fn build_revenue(&self) -> ModelResult<RevenueModel> {
        RevenueModel::new(self.rent, to_input(&self.occupancy_rate)?)
    }

    pub fn build_expenses(&self) -> ModelResult<ExpenseModel> {
        let mut model = ExpenseModel::new(self.expense_accounting);
        for (category, input) in &self.expenses {
            model.set(category.clone(), to_input(input)?)?;
        }
        debug!(
            "expense model: {} categories, {:?} accounting",
            model.categories().count(),
            self.expense_accounting
        );
        Ok(model)
    }

    pub fn build_tax_benefit(&self) -> ModelResult<TaxBenefitModel> {
        TaxBenefitModel::new(self.loan.n_periods, self.property_value(), self.tax)
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            n_simulations: self.n_simulations,
            equity: self.equity,
            seed: self.seed,
            cagr_period_basis: self.cagr_period_basis,
        }
    }

    /// Validate every input and assemble a simulator ready to run
    pub fn build_simulator(&self) -> ModelResult<MonteCarloSimulator> {
        MonteCarloSimulator::new(
            self.build_schedule()?,
            self.build_revenue()?,
            self.build_expenses()?,
            self.build_tax_benefit()?,
            self.simulation_config(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    const SCENARIO: &str = r#"{
        "loan": { "debt": 300000, "periodic_rate": 0.005, "n_periods": 360 },
        "equity": 75000,
        "n_simulations": 200,
        "seed": 42,
        "rent": 2500,
        "occupancy_rate": { "distribution": "bounded_normal", "mu": 0.93, "sigma": 0.05, "lower_bound": 0.0, "upper_bound": 1.0 },
        "expenses": {
            "utility": 150.0,
            "insurance": { "distribution": "normal", "mu": 120, "sigma": 10 },
            "pest_control_expense": null,
            "pool_cleaning": 40
        },
        "tax": { "uncertainty_discount_factor": 0.5 }
    }"#;

    #[test]
    fn test_parse_scenario() {
        let config = ScenarioConfig::from_json_str(SCENARIO).unwrap();

        assert_eq!(config.loan.n_periods, 360);
        assert_eq!(config.n_simulations, 200);
        assert_eq!(config.expense_accounting, ExpenseAccounting::Flat);
        assert_eq!(config.cagr_period_basis, 30.0);
        assert_eq!(config.tax.uncertainty_discount_factor, 0.5);
        assert_eq!(config.tax.interest_deduction_rate, 0.3);
        assert_eq!(config.expenses.get(&ExpenseCategory::Utility), Some(&Some(InputConfig::Constant(150.0))));
        assert_eq!(config.expenses.get(&ExpenseCategory::PestControl), Some(&None));
        assert!(config.expenses.contains_key(&ExpenseCategory::Other("pool_cleaning".to_string())));
    }

    #[test]
    fn test_null_expense_is_absent() {
        let config = ScenarioConfig::from_json_str(SCENARIO).unwrap();
        let expenses = config.build_expenses().unwrap();

        assert!(expenses.get(&ExpenseCategory::PestControl).is_none());
        assert_eq!(expenses.categories().count(), 3);
    }

    #[test]
    fn test_defaults_when_optional_fields_missing() {
        let config = ScenarioConfig::from_json_str(
            r#"{ "loan": { "debt": 1000, "periodic_rate": 0.0, "n_periods": 10 }, "equity": 100, "rent": 50 }"#,
        )
        .unwrap();

        assert_eq!(config.n_simulations, 1_000);
        assert_eq!(config.seed, None);
        assert_eq!(config.occupancy_rate, None);
        assert!(config.expenses.is_empty());
        assert!(config.build_revenue().unwrap().occupancy_rate().is_absent());
    }

    #[test]
    fn test_malformed_input_fails_to_parse() {
        let err = ScenarioConfig::from_json_str(
            r#"{ "loan": { "debt": 1, "periodic_rate": 0.0, "n_periods": 1 }, "equity": 1, "rent": 1,
                 "occupancy_rate": "high" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    fn parse_error(occupancy: &str) -> String {
        let json = format!(
            r#"{{ "loan": {{ "debt": 1, "periodic_rate": 0.0, "n_periods": 1 }}, "equity": 1, "rent": 1,
                  "occupancy_rate": {} }}"#,
            occupancy
        );
        match ScenarioConfig::from_json_str(&json) {
            Err(ConfigError::Parse(err)) => err.to_string(),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_distribution_names_the_problem() {
        let missing = parse_error(r#"{ "distribution": "normal", "mean": 0.9 }"#);
        assert!(missing.contains("missing field `mu`"), "{}", missing);

        let unknown = parse_error(r#"{ "distribution": "poisson", "lambda": 2 }"#);
        assert!(unknown.contains("unknown variant `poisson`"), "{}", unknown);

        let wrong_type = parse_error(r#""high""#);
        assert!(wrong_type.contains("a number or a distribution object"), "{}", wrong_type);
    }

    #[test]
    fn test_integer_and_float_constants_parse() {
        let config = ScenarioConfig::from_json_str(SCENARIO).unwrap();
        assert_eq!(
            config.expenses.get(&ExpenseCategory::Other("pool_cleaning".to_string())),
            Some(&Some(InputConfig::Constant(40.0)))
        );
    }

    #[test]
    fn test_colliding_expense_names_rejected() {
        let err = ScenarioConfig::from_json_str(
            r#"{ "loan": { "debt": 1, "periodic_rate": 0.0, "n_periods": 1 }, "equity": 1, "rent": 1,
                 "expenses": { "utility": 100, "utility_expense": 120 } }"#,
        )
        .unwrap_err();
        assert!(matches!(&err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("duplicates category `utility`"), "{}", err);
    }

    #[test]
    fn test_invalid_distribution_rejected_when_building() {
        let mut config = ScenarioConfig::example();
        config.occupancy_rate = Some(InputConfig::Random(Distribution::Indicator { probability: 1.2 }));

        assert!(matches!(
            config.build_simulator(),
            Err(ModelError::InvalidProbability { probability }) if probability == 1.2
        ));
    }

    #[test]
    fn test_example_round_trips_and_builds() {
        let example = ScenarioConfig::example();
        let json = example.to_json_pretty().unwrap();
        assert_eq!(ScenarioConfig::from_json_str(&json).unwrap(), example);

        let simulator = example.build_simulator().unwrap();
        assert_eq!(simulator.shape(), (360, 1_000));
        assert_eq!(simulator.property_value(), 375_000.0);
    }

    #[test]
    fn test_from_missing_path() {
        let err = ScenarioConfig::from_path(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
