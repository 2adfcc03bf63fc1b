#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a warren scenario headlessly.

mod report;
mod scenario;
mod scripts;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warren_core::Command;
use warren_system_scheduler::Scheduler;
use warren_world::{self as world, query};

use report::RunReport;
use scenario::{scatter_jobs, Scenario};
use scripts::ScenarioScripts;

/// Runs a job-assignment scenario and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "warren", version)]
struct Cli {
    /// TOML scenario to run; the built-in scenario is used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Extra jobs scattered over walkable tiles before the run.
    #[arg(long, default_value_t = 0)]
    extra_jobs: usize,
    /// Seed for scattering extra jobs.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warren=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Entry point for the warren command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let scenario = Scenario::load(cli.scenario.as_deref())?;
    let (mut world, map) = scenario.build()?;
    scatter_jobs(
        &mut world,
        &map,
        &scenario.scatter_kinds(),
        cli.extra_jobs,
        cli.seed,
    )?;

    let mut scheduler = Scheduler::new(&scenario.simulation);
    let mut scripts = ScenarioScripts::new(scenario.script);
    let mut report = RunReport::default();

    for _ in 0..cli.ticks {
        let events = scheduler.step(&mut world, &map, &mut scripts);
        report.record(&events);

        for job in scripts.take_finished() {
            let Some(owner) = query::job(&world, job).map(|snapshot| snapshot.owner) else {
                continue;
            };
            debug!(job = job.get(), "job completed");
            let mut events = Vec::new();
            world::apply(&mut world, Command::DeleteJob { owner, job }, &mut events);
            report.record(&events);
            report.job_completed();
        }
    }

    info!(
        tick = query::tick(&world),
        remaining_jobs = query::job_view(&world).len(),
        "run finished"
    );
    println!("{report}");
    Ok(())
}
