use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use home_finance_lib::input::Scenario;

mod output;
mod report;

#[derive(Debug, StructOpt)]
#[structopt(name = "home_finance", about = "Mortgage and buy-vs-rent calculators")]
struct Opts {
    /// The path to your scenario file
    #[structopt(parse(from_os_str))]
    scenario_file: PathBuf,
    #[structopt(subcommand)]
    output: output::OutputType,
}

fn main() -> Result<()> {
    let opt = Opts::from_args();

    let content = std::fs::read_to_string(&opt.scenario_file).context(format!(
        "Failed to read scenario file {}",
        opt.scenario_file.display()
    ))?;
    let scenario = Scenario::from_toml(&content).context("Failed to load scenario")?;
    let report = report::run_scenario(&scenario).context("Failed to run scenario")?;
    opt.output.output(&report)
}
