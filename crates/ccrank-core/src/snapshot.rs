//! Periodic snapshots of network state ("evolution tracking").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::FollowGraph;
use crate::model::CreatorId;

/// Copy of the network aggregates at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    /// Timestep the snapshot was taken at.
    pub timestep: u64,
    /// Followers per creator.
    pub num_followers: Vec<usize>,
    /// Followed creators per user.
    pub num_followees: Vec<usize>,
    /// Best followed creator per user.
    pub satisfaction: Vec<Option<CreatorId>>,
    /// Recommendation distribution used at this timestep.
    pub probabilities: Vec<f64>,
}

impl EvolutionSnapshot {
    /// Capture the current graph state together with this timestep's distribution.
    #[must_use]
    pub fn capture(timestep: u64, graph: &FollowGraph, probabilities: &[f64]) -> Self {
        Self {
            timestep,
            num_followers: graph.counts().followers().to_vec(),
            num_followees: graph.counts().followees().to_vec(),
            satisfaction: graph.satisfaction(),
            probabilities: probabilities.to_vec(),
        }
    }
}

/// Collects snapshots every `interval` timesteps. An interval of 0 disables tracking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvolutionTracker {
    interval: Option<u64>,
    snapshots: BTreeMap<u64, EvolutionSnapshot>,
}

impl EvolutionTracker {
    /// Create a tracker for the given interval.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval: (interval > 0).then_some(interval),
            snapshots: BTreeMap::new(),
        }
    }

    /// Whether a snapshot is due at `timestep`.
    #[must_use]
    pub fn is_due(&self, timestep: u64) -> bool {
        self.interval.is_some_and(|every| timestep % every == 0)
    }

    /// Record a snapshot if one is due. Returns whether one was taken.
    pub fn observe(&mut self, timestep: u64, graph: &FollowGraph, probabilities: &[f64]) -> bool {
        if !self.is_due(timestep) {
            return false;
        }
        self.snapshots.insert(
            timestep,
            EvolutionSnapshot::capture(timestep, graph, probabilities),
        );
        true
    }

    /// Snapshots recorded so far, keyed by timestep.
    #[must_use]
    pub const fn snapshots(&self) -> &BTreeMap<u64, EvolutionSnapshot> {
        &self.snapshots
    }

    /// Consume the tracker and return its snapshots.
    #[must_use]
    pub fn into_snapshots(self) -> BTreeMap<u64, EvolutionSnapshot> {
        self.snapshots
    }
}
