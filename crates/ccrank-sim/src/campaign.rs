//! Batch runner for independent simulation runs.
//!
//! Executes `num_simulations` runs that share one seeded generator, checks
//! every finished run against the invariant oracle, and aggregates summary
//! statistics.

use anyhow::{Context, Result};
use ccrank_core::oracle::{InvariantOracle, InvariantViolation};
use ccrank_core::{DeterministicRng, Platform, PlatformReport};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::summary::BatchSummary;

/// Log a progress warning this often while running until convergence.
const UNBOUNDED_WARN_EVERY: u64 = 100_000;

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Zero-based position of the run within its batch.
    pub index: usize,
    /// Timesteps executed.
    pub timesteps: u64,
    /// Everything the platform produced.
    pub report: PlatformReport,
    /// Invariant violations found after the run (empty when healthy).
    pub violations: Vec<String>,
}

impl RunResult {
    /// Whether the run converged.
    #[must_use]
    pub const fn did_converge(&self) -> bool {
        self.report.converged
    }
}

/// Results of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Configuration the batch ran with.
    pub config: SimulationConfig,
    /// Aggregate statistics.
    pub summary: BatchSummary,
    /// Per-run results in execution order.
    pub runs: Vec<RunResult>,
}

/// Batch simulation driver owning the shared generator.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    rng: DeterministicRng,
    completed: usize,
}

impl Simulation {
    /// Validate `config` and seed the shared generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rng = DeterministicRng::new(config.seed);
        Ok(Self {
            config,
            rng,
            completed: 0,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Execute every run of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if a run fails to construct or step its platform.
    pub fn run(&mut self) -> Result<SimulationReport> {
        let runs = (0..self.config.num_simulations)
            .map(|_| self.run_once())
            .collect::<Result<Vec<_>>>()?;

        let summary = BatchSummary::from_runs(&runs);
        info!(
            runs = summary.runs,
            converged = summary.converged_runs,
            mean_timesteps = summary.mean_timesteps,
            "simulation batch complete"
        );

        Ok(SimulationReport {
            config: self.config.clone(),
            summary,
            runs,
        })
    }

    /// Execute the next run, continuing the shared random stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be built or stepped.
    pub fn run_once(&mut self) -> Result<RunResult> {
        let index = self.completed;
        let result = run_single(index, &self.config, &mut self.rng)?;
        self.completed += 1;
        Ok(result)
    }

    /// Replay a single run from `seed` with the other parameters of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when config validation or the run fails.
    pub fn replay(seed: u64, config: &SimulationConfig) -> Result<RunResult> {
        config.validate()?;
        let mut rng = DeterministicRng::new(seed);
        run_single(0, config, &mut rng)
    }
}

/// Build a fresh platform over `rng`, drive it per the step policy, and check it.
fn run_single<R: Rng + ?Sized>(
    index: usize,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<RunResult> {
    let mut platform = Platform::new(config.platform_config(), rng)
        .with_context(|| format!("failed to build platform for run {index}"))?;

    match config.num_steps {
        Some(limit) => {
            while platform.timestep() < limit {
                if platform.iterate()? {
                    break;
                }
            }
        }
        None => {
            while !platform.check_convergence() {
                platform.iterate()?;
                if platform.timestep() % UNBOUNDED_WARN_EVERY == 0 {
                    warn!(
                        run = index,
                        timestep = platform.timestep(),
                        searching = platform.searching_users().len(),
                        "run still has not converged"
                    );
                }
            }
        }
    }

    let report = platform.report();
    let oracle = InvariantOracle::check_all(platform.graph(), &report);
    let violations: Vec<String> = oracle.violations.iter().map(format_violation).collect();
    if !oracle.passed {
        warn!(run = index, count = violations.len(), "run violated invariants");
    }

    let timesteps = report.iterations;
    debug!(
        run = index,
        timesteps,
        converged = report.converged,
        "run complete"
    );

    Ok(RunResult {
        index,
        timesteps,
        report,
        violations,
    })
}

/// Format an invariant violation into a human-readable string.
fn format_violation(v: &InvariantViolation) -> String {
    match v {
        InvariantViolation::FollowerCount {
            creator,
            recorded,
            actual,
        } => format!("FollowerCount: {creator} records {recorded} followers, adjacency has {actual}"),
        InvariantViolation::FolloweeCount {
            user,
            recorded,
            actual,
        } => format!("FolloweeCount: user {user} records {recorded} followees, adjacency has {actual}"),
        InvariantViolation::CapExceeded {
            user,
            followees,
            cap,
        } => format!("CapExceeded: user {user} follows {followees} creators (cap {cap})"),
        InvariantViolation::BestMismatch {
            user,
            recorded,
            actual,
        } => format!("BestMismatch: user {user} best={recorded:?} but follows best {actual:?}"),
        InvariantViolation::RankRegressed {
            user,
            before,
            after,
        } => format!("RankRegressed: user {user} went from {before:?} to {after:?}"),
        InvariantViolation::FoundOutOfRange {
            user,
            timestep,
            iterations,
        } => format!("FoundOutOfRange: user {user} found at {timestep} of {iterations} iterations"),
        InvariantViolation::ConvergedWithSearchers { users } => {
            format!("ConvergedWithSearchers: {} users never found the top creator", users.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            num_simulations: 5,
            num_users: 30,
            num_creators: 6,
            alphas: vec![1.0],
            num_steps: None,
            seed: 42,
            evolution_interval: 0,
            max_follows: 0,
        }
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = SimulationConfig {
            num_users: 0,
            ..small_config()
        };
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn unbounded_runs_all_converge() {
        let mut sim = Simulation::new(small_config()).expect("valid");
        let report = sim.run().expect("run");
        assert_eq!(report.runs.len(), 5);
        for (i, run) in report.runs.iter().enumerate() {
            assert_eq!(run.index, i);
            assert!(run.did_converge());
            assert!(run.violations.is_empty(), "{:?}", run.violations);
            assert!(run.report.found_at.iter().all(Option::is_some));
        }
        assert_eq!(report.summary.converged_runs, 5);
    }

    #[test]
    fn step_budget_caps_iterations() {
        let config = SimulationConfig {
            num_simulations: 3,
            num_users: 200,
            num_creators: 500,
            num_steps: Some(3),
            ..small_config()
        };
        let mut sim = Simulation::new(config).expect("valid");
        let report = sim.run().expect("run");
        for run in &report.runs {
            assert!(run.timesteps <= 3);
            assert_eq!(run.timesteps, run.report.iterations);
            if !run.did_converge() {
                assert_eq!(run.timesteps, 3);
                assert!(run.report.found_at.iter().any(Option::is_none));
            }
        }
    }

    #[test]
    fn step_budget_stops_early_on_convergence() {
        let config = SimulationConfig {
            num_simulations: 2,
            num_creators: 1,
            num_steps: Some(50),
            ..small_config()
        };
        let mut sim = Simulation::new(config).expect("valid");
        let report = sim.run().expect("run");
        assert!(report.runs.iter().all(|r| r.timesteps == 1 && r.did_converge()));
    }

    #[test]
    fn runs_share_the_generator_but_not_state() {
        let mut sim = Simulation::new(small_config()).expect("valid");
        let first = sim.run_once().expect("run 0");
        let second = sim.run_once().expect("run 1");
        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        // Each run starts from an empty graph.
        assert_eq!(second.report.num_followees.len(), 30);
        assert!(second.report.num_followees.iter().all(|n| *n >= 1));
        assert_ne!(first.report.found_at, second.report.found_at);
    }

    #[test]
    fn batch_is_deterministic_for_a_seed() {
        let a = Simulation::new(small_config()).expect("valid").run().expect("run");
        let b = Simulation::new(small_config()).expect("valid").run().expect("run");
        assert_eq!(a, b);
    }

    #[test]
    fn replay_matches_first_run_of_batch() {
        let config = small_config();
        let batch = Simulation::new(config.clone()).expect("valid").run().expect("run");
        let replay = Simulation::replay(config.seed, &config).expect("replay");
        assert_eq!(replay.report, batch.runs[0].report);
    }

    #[test]
    fn evolution_snapshots_flow_into_results() {
        let config = SimulationConfig {
            num_simulations: 1,
            num_creators: 40,
            num_steps: Some(6),
            evolution_interval: 2,
            ..small_config()
        };
        let run = Simulation::replay(1, &config).expect("replay");
        let keys: Vec<u64> = run.report.evolution.keys().copied().collect();
        let expected: Vec<u64> = [2, 4, 6].into_iter().filter(|t| *t <= run.timesteps).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn report_serializes_to_json() {
        let config = SimulationConfig {
            num_simulations: 2,
            ..small_config()
        };
        let report = Simulation::new(config).expect("valid").run().expect("run");
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"num_simulations\":2"));
        assert!(json.contains("\"converged_runs\":2"));
        assert!(json.contains("\"found_at\""));
    }

    #[test]
    fn format_violation_produces_readable_strings() {
        let v = InvariantViolation::CapExceeded {
            user: 3,
            followees: 5,
            cap: 2,
        };
        let s = format_violation(&v);
        assert!(s.contains("CapExceeded"));
        assert!(s.contains("user 3"));
    }
}
