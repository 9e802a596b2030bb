//! `ccrank replay`: re-run a single seed and show its full outputs.

use std::process;

use anyhow::Result;
use ccrank_core::CreatorId;
use ccrank_sim::{RunResult, Simulation, SimulationConfig};
use clap::Args;
use serde::Serialize;

use super::{ParamArgs, fmt_alphas};
use crate::output::{OutputMode, fmt_opt, pretty_kv, pretty_section};

/// Arguments for `ccrank replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Seed to replay.
    #[arg(long)]
    pub seed: u64,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Number of trailing mean-rank history entries to show.
    #[arg(long, default_value = "10")]
    pub tail: usize,
}

/// JSON output for `ccrank replay`.
#[derive(Debug, Serialize)]
struct ReplayOutput<'a> {
    seed: u64,
    config: &'a SimulationConfig,
    #[serde(flatten)]
    run: &'a RunResult,
}

/// Execute `ccrank replay`.
pub fn run_replay(args: &ReplayArgs, output: OutputMode) -> Result<()> {
    let mut config = args.params.resolve()?;
    config.seed = args.seed;
    config.num_simulations = 1;

    let run = Simulation::replay(args.seed, &config)?;

    match output {
        OutputMode::Json => {
            let out = ReplayOutput {
                seed: args.seed,
                config: &config,
                run: &run,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => render_text(args, &config, &run),
        OutputMode::Pretty => render_pretty(args, &config, &run)?,
    }

    if !run.violations.is_empty() {
        process::exit(1);
    }

    Ok(())
}

fn history_tail(run: &RunResult, tail: usize) -> &[Option<f64>] {
    let history = &run.report.mean_best_rank;
    &history[history.len().saturating_sub(tail)..]
}

fn fmt_best(best: Option<CreatorId>) -> String {
    best.map_or_else(|| "-".to_string(), |c| c.to_string())
}

fn fmt_found(found: Option<u64>) -> String {
    found.map_or_else(|| "-".to_string(), |t| t.to_string())
}

fn render_text(args: &ReplayArgs, config: &SimulationConfig, run: &RunResult) {
    let report = &run.report;
    println!(
        "replay seed={} users={} creators={} alphas={} max_follows={}",
        args.seed,
        config.num_users,
        config.num_creators,
        fmt_alphas(&config.alphas),
        config.max_follows
    );
    println!(
        "result timesteps={} converged={} violations={}",
        run.timesteps,
        run.did_converge(),
        run.violations.len()
    );
    for violation in &run.violations {
        println!("violation={violation}");
    }
    for (creator, followers) in report.num_followers.iter().enumerate() {
        println!("creator id={creator} followers={followers}");
    }
    for (user, followees) in report.num_followees.iter().enumerate() {
        println!(
            "user id={user} followees={followees} best={} found_at={}",
            fmt_best(report.satisfaction[user]),
            fmt_found(report.found_at[user])
        );
    }
    let offset = report.mean_best_rank.len() - history_tail(run, args.tail).len();
    for (i, rank) in history_tail(run, args.tail).iter().enumerate() {
        println!("mean_rank timestep={} value={}", offset + i + 1, fmt_opt(*rank));
    }
    for timestep in report.evolution.keys() {
        println!("snapshot timestep={timestep}");
    }
}

fn render_pretty(args: &ReplayArgs, config: &SimulationConfig, run: &RunResult) -> Result<()> {
    let report = &run.report;
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    pretty_section(&mut w, &format!("Replay Seed {}", args.seed))?;
    pretty_kv(&mut w, "Users", config.num_users.to_string())?;
    pretty_kv(&mut w, "Creators", config.num_creators.to_string())?;
    pretty_kv(&mut w, "Alphas", fmt_alphas(&config.alphas))?;
    pretty_kv(&mut w, "Timesteps", run.timesteps.to_string())?;
    pretty_kv(&mut w, "Converged", run.did_converge().to_string())?;
    let found = report.found_at.iter().filter(|f| f.is_some()).count();
    pretty_kv(
        &mut w,
        "Found top",
        format!("{found} / {} users", report.found_at.len()),
    )?;
    pretty_kv(
        &mut w,
        "Snapshots",
        if report.evolution.is_empty() {
            "none".to_string()
        } else {
            report
                .evolution
                .keys()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        },
    )?;
    pretty_kv(&mut w, "Oracle", run.violations.is_empty().to_string())?;

    if !run.violations.is_empty() {
        println!();
        pretty_section(&mut w, "Violations")?;
        for violation in &run.violations {
            println!("  - {violation}");
        }
    }

    println!();
    pretty_section(&mut w, "Followers per Creator")?;
    for (creator, followers) in report.num_followers.iter().enumerate() {
        println!("{:<8} {followers}", CreatorId(creator).to_string());
    }

    println!();
    pretty_section(&mut w, "Mean Best Rank (tail)")?;
    let tail = history_tail(run, args.tail);
    let offset = report.mean_best_rank.len() - tail.len();
    for (i, rank) in tail.iter().enumerate() {
        println!("t={:<8} {}", offset + i + 1, fmt_opt(*rank));
    }

    Ok(())
}
