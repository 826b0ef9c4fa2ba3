//! Real-estate simulator CLI
//!
//! Runs one scenario file and prints the summary report

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use real_estate_sim::{AmortizationSchedule, Metric, ScenarioConfig, SimulationResults, SimulationSummary};

#[derive(Parser, Debug)]
#[command(name = "real-estate-sim")]
#[command(version, about = "Monte Carlo simulation of leveraged rental property returns", long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of trials
    #[arg(short = 'n', long)]
    simulations: Option<usize>,

    /// Write per-period statistics of --metric to this CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Result grid summarised in the CSV output
    #[arg(long, default_value = "cash_flow")]
    metric: Metric,

    /// Write the amortization schedule to this CSV file
    #[arg(long, value_name = "FILE")]
    schedule: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut scenario = ScenarioConfig::from_path(&cli.config)
        .with_context(|| format!("loading scenario {}", cli.config.display()))?;
    if let Some(seed) = cli.seed {
        scenario.seed = Some(seed);
    }
    if let Some(n) = cli.simulations {
        scenario.n_simulations = n;
    }

    let mut simulator = scenario.build_simulator().context("building simulator")?;
    let summary = simulator.analyze();

    if let Some(path) = &cli.schedule {
        write_schedule(path, simulator.schedule())?;
        info!("wrote amortization schedule to {}", path.display());
    }
    if let Some(path) = &cli.csv {
        if let Some(results) = simulator.results() {
            write_period_statistics(path, results, cli.metric)?;
            info!("wrote {} statistics to {}", cli.metric, path.display());
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&scenario, simulator.schedule(), &summary);
    }
    Ok(())
}

fn write_schedule(path: &Path, schedule: &AmortizationSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in schedule.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_period_statistics(path: &Path, results: &SimulationResults, metric: Metric) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for stats in results.period_statistics(metric) {
        writer.serialize(stats)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(scenario: &ScenarioConfig, schedule: &AmortizationSchedule, summary: &SimulationSummary) {
    println!("Real-Estate Simulator v{}", env!("CARGO_PKG_VERSION"));
    println!("==========================\n");

    println!("Property value:   ${:.2}", scenario.property_value());
    println!("  Debt:           ${:.2}", schedule.debt());
    println!("  Equity:         ${:.2}", scenario.equity);
    println!("  Payment:        ${:.2} x {} periods", schedule.payment(), schedule.n_periods());
    println!("  Total interest: ${:.2}", schedule.total_interest());
    println!();

    println!("Trials: {}", summary.n_simulations);
    println!();

    println!("Cash flow over holding period");
    println!("  Mean: ${:.2}", summary.terminal_cash_flow_mean);
    println!("  Min:  ${:.2}", summary.terminal_cash_flow_min);
    println!("  Max:  ${:.2}", summary.terminal_cash_flow_max);
    println!();

    println!("Periodic cash flow");
    println!("  Mean:         ${:.2}", summary.periodic_cash_flow_mean);
    println!("  Std dev:      ${:.2}", summary.periodic_cash_flow_std);
    println!("  Sharpe ratio: {:.4}", summary.cash_flow_sharpe_ratio);
    println!();

    println!("Mean revenue:     ${:.2}", summary.mean_revenue);
    println!("Mean expense:     ${:.2}", summary.mean_expense);
    println!("Mean tax benefit: ${:.2}", summary.mean_tax_benefit);
    println!();

    println!("Mean cash CAGR:  {:.4}%", summary.mean_cash_cagr * 100.0);
    println!("Mean total CAGR: {:.4}%", summary.mean_total_cagr * 100.0);
}
