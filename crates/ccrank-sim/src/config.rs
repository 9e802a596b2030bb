use std::path::Path;

use anyhow::{Context, Result, bail};
use ccrank_core::PlatformConfig;
use serde::{Deserialize, Serialize};

/// Parameters for a batch of independent simulation runs.
///
/// Every field has a default, so a TOML file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of independent runs.
    pub num_simulations: usize,
    /// Users per run.
    pub num_users: usize,
    /// Ranked content creators per run.
    pub num_creators: usize,
    /// Popularity bias exponents mixed uniformly by the sampler.
    pub alphas: Vec<f64>,
    /// Step budget per run; `None` runs until convergence.
    pub num_steps: Option<u64>,
    /// Seed for the generator shared by all runs of the batch.
    pub seed: u64,
    /// Snapshot every this many timesteps (0 disables tracking).
    pub evolution_interval: u64,
    /// Per-user follow cap (0 means uncapped).
    pub max_follows: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: 1,
            num_users: 100,
            num_creators: 10,
            alphas: vec![1.0],
            num_steps: None,
            seed: 42,
            evolution_interval: 0,
            max_follows: 0,
        }
    }
}

impl SimulationConfig {
    /// Validate configuration before running.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            bail!("num_simulations must be > 0");
        }
        if self.num_users == 0 {
            bail!("num_users must be > 0");
        }
        if self.num_creators == 0 {
            bail!("num_creators must be > 0");
        }
        if self.alphas.is_empty() {
            bail!("alphas must contain at least one value");
        }
        if let Some(alpha) = self.alphas.iter().find(|a| !a.is_finite()) {
            bail!("alphas must be finite (got {alpha})");
        }
        if self.num_steps == Some(0) {
            bail!("num_steps must be > 0 when set");
        }
        Ok(())
    }

    /// Platform parameters for one run of this batch.
    #[must_use]
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            num_users: self.num_users,
            num_creators: self.num_creators,
            alphas: self.alphas.clone(),
            evolution_interval: self.evolution_interval,
            max_follows: self.max_follows,
        }
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content).context("Failed to parse simulation config")
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_simulations_rejected() {
        let config = SimulationConfig {
            num_simulations: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_users_or_creators_rejected() {
        let users = SimulationConfig {
            num_users: 0,
            ..SimulationConfig::default()
        };
        let creators = SimulationConfig {
            num_creators: 0,
            ..SimulationConfig::default()
        };
        assert!(users.validate().is_err());
        assert!(creators.validate().is_err());
    }

    #[test]
    fn empty_or_nan_alphas_rejected() {
        let empty = SimulationConfig {
            alphas: vec![],
            ..SimulationConfig::default()
        };
        let nan = SimulationConfig {
            alphas: vec![1.0, f64::NAN],
            ..SimulationConfig::default()
        };
        assert!(empty.validate().is_err());
        let err = nan.validate().expect_err("nan must be rejected");
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn zero_step_budget_rejected() {
        let config = SimulationConfig {
            num_steps: Some(0),
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            "num_users = 250\nalphas = [0.5, 2.0]\nnum_steps = 500\n",
        )
        .expect("parse");
        assert_eq!(config.num_users, 250);
        assert_eq!(config.alphas, vec![0.5, 2.0]);
        assert_eq!(config.num_steps, Some(500));
        assert_eq!(config.num_creators, 10);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(SimulationConfig::from_toml_str("num_userz = 3\n").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, "seed = 7\nmax_follows = 2\n").expect("write");
        let config = SimulationConfig::load(&path).expect("load");
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_follows, 2);
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = SimulationConfig::load(Path::new("/nonexistent/ccrank.toml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/ccrank.toml"));
    }

    #[test]
    fn platform_config_carries_run_parameters() {
        let config = SimulationConfig {
            num_users: 12,
            num_creators: 4,
            alphas: vec![0.0],
            evolution_interval: 3,
            max_follows: 2,
            ..SimulationConfig::default()
        };
        let platform = config.platform_config();
        assert_eq!(platform.num_users, 12);
        assert_eq!(platform.num_creators, 4);
        assert_eq!(platform.alphas, vec![0.0]);
        assert_eq!(platform.evolution_interval, 3);
        assert_eq!(platform.max_follows, 2);
    }
}
