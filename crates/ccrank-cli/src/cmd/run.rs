//! `ccrank run`: execute a batch of independent simulation runs.

use std::process;

use anyhow::Result;
use ccrank_sim::{BatchSummary, RunResult, Simulation, SimulationConfig, SimulationReport};
use clap::Args;
use serde::Serialize;

use super::{ParamArgs, fmt_alphas};
use crate::output::{OutputMode, fmt_opt, pretty_kv, pretty_section};

/// Arguments for `ccrank run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    /// Number of independent runs.
    #[arg(long)]
    pub simulations: Option<usize>,

    /// Seed for the generator shared by all runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Include per-run results in the output.
    #[arg(long)]
    pub detailed: bool,
}

/// JSON output for `ccrank run`.
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    config: &'a SimulationConfig,
    summary: &'a BatchSummary,
    runs_with_violations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    runs: Option<&'a [RunResult]>,
}

/// Execute `ccrank run`.
pub fn run_batch(args: &RunArgs, output: OutputMode) -> Result<()> {
    let mut config = args.params.resolve()?;
    if let Some(n) = args.simulations {
        config.num_simulations = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let report = Simulation::new(config)?.run()?;
    let unhealthy = report
        .runs
        .iter()
        .filter(|r| !r.violations.is_empty())
        .count();

    match output {
        OutputMode::Json => {
            let out = RunOutput {
                config: &report.config,
                summary: &report.summary,
                runs_with_violations: unhealthy,
                runs: args.detailed.then_some(report.runs.as_slice()),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => render_text(&report, unhealthy, args.detailed),
        OutputMode::Pretty => render_pretty(&report, unhealthy, args.detailed)?,
    }

    // Exit code 1 on invariant violations for CI integration
    if unhealthy > 0 {
        process::exit(1);
    }

    Ok(())
}

fn render_text(report: &SimulationReport, unhealthy: usize, detailed: bool) {
    let config = &report.config;
    let summary = &report.summary;
    println!(
        "batch runs={} users={} creators={} alphas={} seed={} max_follows={}",
        summary.runs,
        config.num_users,
        config.num_creators,
        fmt_alphas(&config.alphas),
        config.seed,
        config.max_follows
    );
    println!(
        "results converged={} mean_timesteps={:.3} min_timesteps={} max_timesteps={} mean_found={} top_share={} violations={}",
        summary.converged_runs,
        summary.mean_timesteps,
        summary.min_timesteps,
        summary.max_timesteps,
        fmt_opt(summary.mean_found_timestep),
        fmt_opt(summary.mean_top_share),
        unhealthy
    );
    if detailed {
        for run in &report.runs {
            println!(
                "run index={} timesteps={} converged={} final_mean_rank={} violations={}",
                run.index,
                run.timesteps,
                run.did_converge(),
                fmt_opt(run.report.mean_best_rank.last().copied().flatten()),
                run.violations.len()
            );
        }
    }
}

fn render_pretty(report: &SimulationReport, unhealthy: usize, detailed: bool) -> Result<()> {
    let config = &report.config;
    let summary = &report.summary;
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    pretty_section(&mut w, "Simulation Batch")?;
    pretty_kv(&mut w, "Runs", summary.runs.to_string())?;
    pretty_kv(&mut w, "Users", config.num_users.to_string())?;
    pretty_kv(&mut w, "Creators", config.num_creators.to_string())?;
    pretty_kv(&mut w, "Alphas", fmt_alphas(&config.alphas))?;
    pretty_kv(&mut w, "Seed", config.seed.to_string())?;
    pretty_kv(
        &mut w,
        "Step budget",
        config
            .num_steps
            .map_or_else(|| "until converged".to_string(), |n| n.to_string()),
    )?;
    if config.max_follows > 0 {
        pretty_kv(&mut w, "Follow cap", config.max_follows.to_string())?;
    }
    pretty_kv(
        &mut w,
        "Converged",
        format!(
            "{} / {} ({:.0}%)",
            summary.converged_runs,
            summary.runs,
            summary.convergence_rate() * 100.0
        ),
    )?;
    pretty_kv(
        &mut w,
        "Timesteps",
        format!(
            "mean {:.2}, min {}, max {}",
            summary.mean_timesteps, summary.min_timesteps, summary.max_timesteps
        ),
    )?;
    pretty_kv(&mut w, "Mean found at", fmt_opt(summary.mean_found_timestep))?;
    pretty_kv(&mut w, "Top share", fmt_opt(summary.mean_top_share))?;
    if unhealthy > 0 {
        pretty_kv(&mut w, "Status", format!("{unhealthy} runs violated invariants"))?;
    }

    if detailed {
        println!();
        pretty_section(&mut w, "Runs")?;
        for run in &report.runs {
            println!(
                "run {:<6} timesteps={:<8} converged={:<5} final_mean_rank={}",
                run.index,
                run.timesteps,
                run.did_converge(),
                fmt_opt(run.report.mean_best_rank.last().copied().flatten())
            );
            for violation in &run.violations {
                println!("  - {violation}");
            }
        }
    }

    Ok(())
}
