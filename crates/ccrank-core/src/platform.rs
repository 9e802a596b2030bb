//! The platform: drives the recommend → follow → converge loop.
//!
//! Each call to [`Platform::iterate`] is one synchronous, population-wide
//! timestep:
//!
//! 1. advance the timestep counter,
//! 2. draw one recommendation per user from the current follower counts,
//! 3. let every still-searching user (ascending id) try to follow its
//!    recommendation, marking it as found when it was offered creator 0,
//! 4. drop found users from the searching set,
//! 5. snapshot the network if evolution tracking is due,
//! 6. record the mean best rank.
//!
//! A user's search ends when it is *offered* the top creator, even if its
//! follow cap stops the edge from being recorded.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PlatformError;
use crate::graph::FollowGraph;
use crate::model::{CreatorId, UserId};
use crate::sampler::RecommendationSampler;
use crate::snapshot::{EvolutionSnapshot, EvolutionTracker};

/// Construction parameters for a [`Platform`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Number of users in the population.
    pub num_users: usize,
    /// Number of ranked content creators.
    pub num_creators: usize,
    /// Popularity bias exponents mixed uniformly by the sampler.
    pub alphas: Vec<f64>,
    /// Snapshot every this many timesteps (0 disables tracking).
    pub evolution_interval: u64,
    /// Per-user follow cap (0 means uncapped).
    pub max_follows: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            num_users: 100,
            num_creators: 10,
            alphas: vec![1.0],
            evolution_interval: 0,
            max_follows: 0,
        }
    }
}

/// Everything a finished (or interrupted) run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformReport {
    /// Timesteps executed.
    pub iterations: u64,
    /// Whether every user found the top creator.
    pub converged: bool,
    /// Final followers per creator.
    pub num_followers: Vec<usize>,
    /// Final followed-creator count per user.
    pub num_followees: Vec<usize>,
    /// Timestep each user was offered the top creator, `None` if not yet.
    pub found_at: Vec<Option<u64>>,
    /// Final best followed creator per user.
    pub satisfaction: Vec<Option<CreatorId>>,
    /// Mean best rank after each timestep, `None` while nobody follows anyone.
    pub mean_best_rank: Vec<Option<f64>>,
    /// Evolution snapshots keyed by timestep (empty when tracking is off).
    pub evolution: BTreeMap<u64, EvolutionSnapshot>,
}

/// One simulation run over an injected random source.
///
/// The random source is borrowed for the lifetime of the platform so one
/// seeded generator can be threaded through several consecutive runs.
pub struct Platform<'r, R: Rng + ?Sized> {
    graph: FollowGraph,
    sampler: RecommendationSampler,
    rng: &'r mut R,
    timestep: u64,
    searching: Vec<UserId>,
    found_at: Vec<Option<u64>>,
    tracker: EvolutionTracker,
    mean_best_rank: Vec<Option<f64>>,
    last_probabilities: Vec<f64>,
}

impl<'r, R: Rng + ?Sized> Platform<'r, R> {
    /// Build a platform with a fresh follow graph.
    ///
    /// # Errors
    ///
    /// Fails fast on an empty population, no creators, or invalid alphas.
    pub fn new(config: PlatformConfig, rng: &'r mut R) -> Result<Self, PlatformError> {
        if config.num_users == 0 {
            return Err(PlatformError::NoUsers);
        }
        if config.num_creators == 0 {
            return Err(PlatformError::NoCreators);
        }
        let sampler = RecommendationSampler::new(config.alphas)?;

        Ok(Self {
            graph: FollowGraph::new(config.num_users, config.num_creators, config.max_follows),
            sampler,
            rng,
            timestep: 0,
            searching: (0..config.num_users).collect(),
            found_at: vec![None; config.num_users],
            tracker: EvolutionTracker::new(config.evolution_interval),
            mean_best_rank: Vec::new(),
            last_probabilities: Vec::new(),
        })
    }

    /// Run one timestep. Returns `true` once every user has found the top creator.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DegenerateDistribution`] if the recommendation
    /// weights cannot be normalized. The platform state, timestep included,
    /// is left untouched in that case.
    pub fn iterate(&mut self) -> Result<bool, PlatformError> {
        let recs = self.sampler.recommend(
            self.graph.counts().followers(),
            self.graph.num_users(),
            &mut *self.rng,
        )?;

        self.timestep += 1;
        let timestep = self.timestep;

        let mut followed = 0_usize;
        for &user in &self.searching {
            let creator = recs.creators[user];
            if self.graph.follow(user, creator).is_followed() {
                followed += 1;
            }
            if creator.is_top() {
                self.found_at[user] = Some(timestep);
            }
        }

        let before = self.searching.len();
        let found_at = &self.found_at;
        self.searching.retain(|&user| found_at[user].is_none());
        let newly_found = before - self.searching.len();

        if self.tracker.observe(timestep, &self.graph, &recs.probabilities) {
            debug!(timestep, "evolution snapshot recorded");
        }

        self.mean_best_rank.push(self.current_mean_best_rank());
        self.last_probabilities = recs.probabilities;

        debug!(
            timestep,
            followed,
            newly_found,
            searching = self.searching.len(),
            "timestep complete"
        );

        let converged = self.check_convergence();
        if converged {
            info!(timestep, users = self.graph.num_users(), "platform converged");
        }
        Ok(converged)
    }

    /// Whether no user is still searching.
    #[must_use]
    pub fn check_convergence(&self) -> bool {
        self.searching.is_empty()
    }

    /// Timesteps executed so far.
    #[must_use]
    pub const fn timestep(&self) -> u64 {
        self.timestep
    }

    /// The follow graph.
    #[must_use]
    pub const fn graph(&self) -> &FollowGraph {
        &self.graph
    }

    /// Users still searching for the top creator, ascending.
    #[must_use]
    pub fn searching_users(&self) -> &[UserId] {
        &self.searching
    }

    /// Timestep each user was offered the top creator.
    #[must_use]
    pub fn found_at(&self) -> &[Option<u64>] {
        &self.found_at
    }

    /// Recommendation distribution of the most recent timestep (empty before the first).
    #[must_use]
    pub fn last_probabilities(&self) -> &[f64] {
        &self.last_probabilities
    }

    /// Mean best rank history, one entry per timestep.
    #[must_use]
    pub fn mean_best_rank(&self) -> &[Option<f64>] {
        &self.mean_best_rank
    }

    /// Evolution snapshots recorded so far.
    #[must_use]
    pub const fn evolution(&self) -> &BTreeMap<u64, EvolutionSnapshot> {
        self.tracker.snapshots()
    }

    /// Build a report of the current state without consuming the platform.
    #[must_use]
    pub fn report(&self) -> PlatformReport {
        PlatformReport {
            iterations: self.timestep,
            converged: self.check_convergence(),
            num_followers: self.graph.counts().followers().to_vec(),
            num_followees: self.graph.counts().followees().to_vec(),
            found_at: self.found_at.clone(),
            satisfaction: self.graph.satisfaction(),
            mean_best_rank: self.mean_best_rank.clone(),
            evolution: self.tracker.snapshots().clone(),
        }
    }

    /// Consume the platform and return its report, releasing the random source.
    #[must_use]
    pub fn into_report(self) -> PlatformReport {
        let converged = self.check_convergence();
        PlatformReport {
            iterations: self.timestep,
            converged,
            num_followers: self.graph.counts().followers().to_vec(),
            num_followees: self.graph.counts().followees().to_vec(),
            satisfaction: self.graph.satisfaction(),
            found_at: self.found_at,
            mean_best_rank: self.mean_best_rank,
            evolution: self.tracker.into_snapshots(),
        }
    }

    fn current_mean_best_rank(&self) -> Option<f64> {
        let ranks: Vec<usize> = self
            .graph
            .users()
            .iter()
            .filter_map(|u| u.best_followed().map(CreatorId::rank))
            .collect();
        if ranks.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = ranks.iter().sum::<usize>() as f64 / ranks.len() as f64;
        Some(mean)
    }
}
