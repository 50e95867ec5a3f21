//! IDI Reserves CLI
//!
//! Runs disabled or active life reserves for an extract and writes projected,
//! time-zero and error CSVs.
//!
//! Usage:
//!   idi_reserves disabled --extract data/extracts/disabled-lives.csv --valuation-dt 2020-12-31
//!   idi_reserves active --extract data/extracts/active-lives.csv --riders data/extracts/active-riders.csv

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use idi_reserves::output::{write_batch, CsvRow};
use idi_reserves::policy::{
    load_active_policies, load_disabled_claims, load_rider_attributes, merge_rider_attributes,
};
use idi_reserves::{
    ActiveLifeModel, BatchOutput, DisabledLifeModel, PopulationDispatcher, ReserveContext, RunConfig,
};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "idi_reserves")]
#[command(about = "Active and disabled life reserves for individual disability income")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disabled life reserves for open claims
    Disabled(RunArgs),
    /// Active life reserves for in-force policies
    Active(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Policy or claim extract (CSV)
    #[arg(long)]
    extract: PathBuf,

    /// Rider attribute extract (CSV)
    #[arg(long)]
    riders: Option<PathBuf>,

    /// Run configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Valuation date, overrides the configuration
    #[arg(long)]
    valuation_dt: Option<NaiveDate>,

    /// stat, gaap or best-estimate, overrides the configuration
    #[arg(long)]
    assumption_set: Option<String>,

    /// NLP, PT1 or PT2, overrides the configuration
    #[arg(long)]
    net_benefit_method: Option<String>,

    /// Directory for the output files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Output file name prefix
    #[arg(long)]
    prefix: Option<String>,
}

impl RunArgs {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => RunConfig::default(),
        };
        if let Some(dt) = self.valuation_dt {
            config.valuation_dt = dt;
        }
        if let Some(set) = &self.assumption_set {
            config.assumption_set = set.clone();
        }
        if let Some(method) = &self.net_benefit_method {
            config.net_benefit_method = method.clone();
        }
        Ok(config)
    }

    fn context(&self) -> Result<Arc<ReserveContext>> {
        let config = self.run_config()?;
        info!(
            "valuation {} basis {} method {}",
            config.valuation_dt, config.assumption_set, config.net_benefit_method
        );
        let store = Arc::new(config.table_store());
        Ok(Arc::new(ReserveContext::from_config(&config, store)?))
    }
}

fn write_output<R: CsvRow>(args: &RunArgs, default_prefix: &str, output: &BatchOutput<R>) -> Result<()> {
    let prefix = args.prefix.as_deref().unwrap_or(default_prefix);
    let paths = write_batch(&args.output_dir, prefix, output)
        .with_context(|| format!("writing results to {}", args.output_dir.display()))?;
    for path in &paths {
        println!("  {}", path.display());
    }
    Ok(())
}

fn summarize<R>(output: &BatchOutput<R>) {
    println!(
        "{} succeeded, {} failed, {} projected rows in {:?}",
        output.success_count(),
        output.error_count(),
        output.row_count(),
        output.elapsed
    );
}

fn run_disabled(args: &RunArgs) -> Result<()> {
    let ctx = args.context()?;
    let mut claims = load_disabled_claims(&args.extract)
        .with_context(|| format!("loading {}", args.extract.display()))?;
    merge_riders(&mut claims, args.riders.as_deref())?;
    println!("Loaded {} claims", claims.len());

    let dispatcher = PopulationDispatcher::new(DisabledLifeModel::new(ctx));
    let output = dispatcher.run_batch(&claims);
    summarize(&output);
    write_output(args, "dlr", &output)
}

fn run_active(args: &RunArgs) -> Result<()> {
    let ctx = args.context()?;
    let mut policies = load_active_policies(&args.extract)
        .with_context(|| format!("loading {}", args.extract.display()))?;
    merge_riders(&mut policies, args.riders.as_deref())?;
    println!("Loaded {} policies", policies.len());

    let dispatcher = PopulationDispatcher::new(ActiveLifeModel::new(ctx));
    let output = dispatcher.run_batch(&policies);
    summarize(&output);
    let cache = dispatcher.model().cache();
    println!(
        "Claim cost cache: {} entries, hit rate {:.1}%",
        cache.len(),
        cache.hit_rate() * 100.0
    );
    write_output(args, "alr", &output)
}

fn merge_riders<T: idi_reserves::policy::loader::RiderTarget>(
    records: &mut [T],
    riders: Option<&Path>,
) -> Result<()> {
    if let Some(path) = riders {
        let rows = load_rider_attributes(path)
            .with_context(|| format!("loading riders {}", path.display()))?;
        merge_rider_attributes(records, &rows).context("merging rider attributes")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Disabled(args) => run_disabled(args),
        Command::Active(args) => run_active(args),
    }
}
