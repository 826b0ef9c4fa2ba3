//! Sweep the loan rate for one scenario file
//!
//! Every rate runs with the scenario's seed, so the trials differ only in debt service.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use real_estate_sim::ScenarioRunner;

#[derive(Parser, Debug)]
#[command(name = "rate_sweep")]
#[command(version, about = "Run a scenario across a range of periodic loan rates", long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Periodic rates to run
    #[arg(short, long, value_delimiter = ',', default_values_t = [0.003, 0.004, 0.005, 0.006, 0.007])]
    rates: Vec<f64>,

    /// Write the sweep to this CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let runner = ScenarioRunner::from_path(&cli.config)
        .with_context(|| format!("loading scenario {}", cli.config.display()))?;

    let start = Instant::now();
    let outcomes = runner.run_rate_sweep(&cli.rates)?;
    println!("Ran {} rates in {:?}\n", outcomes.len(), start.elapsed());

    println!("{:>10} {:>14} {:>14} {:>12} {:>12}", "Rate", "Mean CF", "CF Std", "Cash CAGR", "Total CAGR");
    for outcome in &outcomes {
        let s = &outcome.summary;
        println!(
            "{:>10.4} {:>14.2} {:>14.2} {:>11.4}% {:>11.4}%",
            outcome.periodic_rate,
            s.periodic_cash_flow_mean,
            s.periodic_cash_flow_std,
            s.mean_cash_cagr * 100.0,
            s.mean_total_cagr * 100.0,
        );
    }

    if let Some(path) = &cli.csv {
        let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(["periodic_rate", "periodic_cash_flow_mean", "periodic_cash_flow_std", "mean_cash_cagr", "mean_total_cagr"])?;
        for outcome in &outcomes {
            let s = &outcome.summary;
            writer.write_record(&[
                outcome.periodic_rate.to_string(),
                s.periodic_cash_flow_mean.to_string(),
                s.periodic_cash_flow_std.to_string(),
                s.mean_cash_cagr.to_string(),
                s.mean_total_cagr.to_string(),
            ])?;
        }
        writer.flush()?;
        println!("\nOutput written to {}", path.display());
    }
    Ok(())
}
