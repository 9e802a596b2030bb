#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::io;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ccrank: how popularity-biased recommendations lead users to the best creator",
    long_about = None
)]
struct Cli {
    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run a batch of simulations",
        long_about = "Run independent simulations that share one seeded generator and\n\
                      report convergence statistics across the batch.",
        after_help = "EXAMPLES:\n    # 100 users, 10 creators, alpha 1\n    ccrank run\n\n\
                      # Mix two popularity exponents over 50 runs\n    ccrank run --alpha 0 --alpha 2 --simulations 50\n\n\
                      # Load parameters from a file, include per-run results\n    ccrank run --config sim.toml --detailed --format json"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        about = "Replay a single seed with full outputs",
        long_about = "Re-run one simulation from a seed and print follower counts, best\n\
                      creators, first-success timesteps, and the mean-rank history.",
        after_help = "EXAMPLES:\n    # Replay seed 7\n    ccrank replay --seed 7\n\n\
                      # Capped follows with evolution snapshots\n    ccrank replay --seed 7 --max-follows 2 --evolution 5 --format json"
    )]
    Replay(cmd::replay::ReplayArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CCRANK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ccrank=debug,info"
        } else {
            "ccrank=info,warn"
        })
    });

    let format = env::var("CCRANK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = output::resolve_output_mode(cli.format, cli.json);

    match cli.command {
        Commands::Run(ref args) => cmd::run::run_batch(args, output),
        Commands::Replay(ref args) => cmd::replay::run_replay(args, output),
    }
}
