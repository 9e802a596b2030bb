//! Aggregate statistics over a batch of runs.

use serde::{Deserialize, Serialize};

use crate::campaign::RunResult;

/// Statistics aggregated over every run of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs executed.
    pub runs: usize,
    /// Runs in which every user found the top creator.
    pub converged_runs: usize,
    /// Mean timesteps per run.
    pub mean_timesteps: f64,
    /// Fewest timesteps in any run.
    pub min_timesteps: u64,
    /// Most timesteps in any run.
    pub max_timesteps: u64,
    /// Mean first-success timestep over every user that found the top creator.
    pub mean_found_timestep: Option<f64>,
    /// Mean share of follow edges pointing at the top creator, over runs with edges.
    pub mean_top_share: Option<f64>,
}

impl BatchSummary {
    /// Summarize `runs`. An empty slice yields zeroed statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_runs(runs: &[RunResult]) -> Self {
        let converged_runs = runs.iter().filter(|r| r.did_converge()).count();
        let total_timesteps: u64 = runs.iter().map(|r| r.timesteps).sum();
        let mean_timesteps = if runs.is_empty() {
            0.0
        } else {
            total_timesteps as f64 / runs.len() as f64
        };

        let found: Vec<u64> = runs
            .iter()
            .flat_map(|r| r.report.found_at.iter().flatten().copied())
            .collect();
        let shares: Vec<f64> = runs.iter().filter_map(top_share).collect();

        Self {
            runs: runs.len(),
            converged_runs,
            mean_timesteps,
            min_timesteps: runs.iter().map(|r| r.timesteps).min().unwrap_or(0),
            max_timesteps: runs.iter().map(|r| r.timesteps).max().unwrap_or(0),
            mean_found_timestep: mean(found.iter().map(|t| *t as f64)),
            mean_top_share: mean(shares.into_iter()),
        }
    }

    /// Fraction of runs that converged.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn convergence_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.converged_runs as f64 / self.runs as f64
        }
    }
}

/// Share of a run's follow edges that point at the top creator.
#[allow(clippy::cast_precision_loss)]
fn top_share(run: &RunResult) -> Option<f64> {
    let followers = &run.report.num_followers;
    let total: usize = followers.iter().sum();
    if total == 0 {
        return None;
    }
    let top = followers.first().copied().unwrap_or(0);
    Some(top as f64 / total as f64)
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
