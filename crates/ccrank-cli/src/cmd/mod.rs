//! Subcommand handlers.

pub mod replay;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use ccrank_sim::SimulationConfig;
use clap::Args;
use tracing::debug;

/// Simulation parameters shared by every subcommand.
///
/// Values given here override those loaded from `--config`.
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// TOML file with simulation parameters.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of users.
    #[arg(long)]
    pub users: Option<usize>,

    /// Number of ranked content creators.
    #[arg(long)]
    pub creators: Option<usize>,

    /// Popularity bias exponent. Repeat to mix several exponents uniformly.
    #[arg(long = "alpha", allow_negative_numbers = true)]
    pub alphas: Vec<f64>,

    /// Timestep budget per run.
    #[arg(long, conflicts_with = "until_converged")]
    pub steps: Option<u64>,

    /// Run until convergence, ignoring any step budget from the config file.
    #[arg(long)]
    pub until_converged: bool,

    /// Record an evolution snapshot every N timesteps (0 disables).
    #[arg(long)]
    pub evolution: Option<u64>,

    /// Maximum creators a user may follow (0 means uncapped).
    #[arg(long)]
    pub max_follows: Option<usize>,
}

impl ParamArgs {
    /// Load the config file (or defaults) and apply flag overrides.
    pub fn resolve(&self) -> Result<SimulationConfig> {
        let mut config = self
            .config
            .as_deref()
            .map_or_else(|| Ok(SimulationConfig::default()), SimulationConfig::load)?;

        if let Some(users) = self.users {
            config.num_users = users;
        }
        if let Some(creators) = self.creators {
            config.num_creators = creators;
        }
        if !self.alphas.is_empty() {
            config.alphas.clone_from(&self.alphas);
        }
        if let Some(steps) = self.steps {
            config.num_steps = Some(steps);
        }
        if self.until_converged {
            config.num_steps = None;
        }
        if let Some(interval) = self.evolution {
            config.evolution_interval = interval;
        }
        if let Some(cap) = self.max_follows {
            config.max_follows = cap;
        }

        debug!(?config, "resolved simulation config");
        Ok(config)
    }
}

/// Render alphas as a comma-separated list.
pub fn fmt_alphas(alphas: &[f64]) -> String {
    alphas
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_flags_yield_defaults() {
        let config = ParamArgs::default().resolve().expect("resolve");
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn flags_override_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "num_users = 7\nnum_creators = 3\nnum_steps = 20\nseed = 9").expect("write");

        let args = ParamArgs {
            config: Some(file.path().to_path_buf()),
            creators: Some(5),
            alphas: vec![0.0, 2.0],
            until_converged: true,
            ..ParamArgs::default()
        };
        let config = args.resolve().expect("resolve");
        assert_eq!(config.num_users, 7);
        assert_eq!(config.num_creators, 5);
        assert_eq!(config.alphas, vec![0.0, 2.0]);
        assert_eq!(config.num_steps, None);
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = ParamArgs {
            config: Some(PathBuf::from("/nonexistent/ccrank.toml")),
            ..ParamArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn alphas_format_as_list() {
        assert_eq!(fmt_alphas(&[1.0, -0.5]), "1,-0.5");
    }
}
