//! Bipartite follow graph from users to content creators.
//!
//! The graph owns the per-user [`User`] records and the aggregate counts
//! derived from the adjacency. All mutation goes through
//! [`FollowGraph::follow`], which keeps the aggregates equal to what the
//! adjacency implies at every point in time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::decision::should_follow;
use crate::model::{ContentCreator, CreatorId, User, UserId};

/// Result of a [`FollowGraph::follow`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowOutcome {
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
    /// The decision rule rejected the creator as no better than the current best.
    Declined,
    /// The rule approved the creator but the user is at its follow cap.
    CapReached,
    /// The edge was recorded and the user's best creator updated.
    Followed,
}

impl FollowOutcome {
    /// Whether a new edge was recorded.
    #[must_use]
    pub const fn is_followed(self) -> bool {
        matches!(self, Self::Followed)
    }
}

/// Aggregate counts derived from the adjacency.
///
/// Read-only outside this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowCounts {
    followers: Vec<usize>,
    followees: Vec<usize>,
}

impl FollowCounts {
    fn new(num_users: usize, num_creators: usize) -> Self {
        Self {
            followers: vec![0; num_creators],
            followees: vec![0; num_users],
        }
    }

    /// Number of followers per creator, indexed by creator id.
    #[must_use]
    pub fn followers(&self) -> &[usize] {
        &self.followers
    }

    /// Number of followed creators per user, indexed by user id.
    #[must_use]
    pub fn followees(&self) -> &[usize] {
        &self.followees
    }

    /// Total number of follow edges.
    #[must_use]
    pub fn total_edges(&self) -> usize {
        self.followees.iter().sum()
    }
}

/// Follow graph with an optional per-user follow cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowGraph {
    users: Vec<User>,
    creators: Vec<ContentCreator>,
    adjacency: Vec<BTreeSet<CreatorId>>,
    counts: FollowCounts,
    max_follows: Option<usize>,
}

impl FollowGraph {
    /// Create an empty graph. A `max_follows` of 0 means uncapped.
    #[must_use]
    pub fn new(num_users: usize, num_creators: usize, max_follows: usize) -> Self {
        Self {
            users: (0..num_users).map(User::new).collect(),
            creators: (0..num_creators)
                .map(|id| ContentCreator::new(CreatorId(id)))
                .collect(),
            adjacency: vec![BTreeSet::new(); num_users],
            counts: FollowCounts::new(num_users, num_creators),
            max_follows: (max_follows > 0).then_some(max_follows),
        }
    }

    /// Number of users.
    #[must_use]
    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    /// Number of creators.
    #[must_use]
    pub fn num_creators(&self) -> usize {
        self.creators.len()
    }

    /// All creators, best first.
    #[must_use]
    pub fn creators(&self) -> &[ContentCreator] {
        &self.creators
    }

    /// Per-user follow cap, `None` when uncapped.
    #[must_use]
    pub const fn max_follows(&self) -> Option<usize> {
        self.max_follows
    }

    /// Aggregate follower/followee counts.
    #[must_use]
    pub const fn counts(&self) -> &FollowCounts {
        &self.counts
    }

    /// All user records, indexed by user id.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// The user record for `user`.
    ///
    /// # Panics
    ///
    /// Panics if `user` is out of range.
    #[must_use]
    pub fn user(&self, user: UserId) -> &User {
        self.check_user(user);
        &self.users[user]
    }

    /// Creators followed by `user`, best first.
    ///
    /// # Panics
    ///
    /// Panics if `user` is out of range.
    #[must_use]
    pub fn followees_of(&self, user: UserId) -> &BTreeSet<CreatorId> {
        self.check_user(user);
        &self.adjacency[user]
    }

    /// Best-ranked creator id per user (`None` for users following nobody).
    #[must_use]
    pub fn satisfaction(&self) -> Vec<Option<CreatorId>> {
        self.users.iter().map(User::best_followed).collect()
    }

    /// Whether `user` follows `creator`.
    ///
    /// # Panics
    ///
    /// Panics if either id is out of range.
    #[must_use]
    pub fn is_following(&self, user: UserId, creator: CreatorId) -> bool {
        self.check_user(user);
        self.check_creator(creator);
        self.adjacency[user].contains(&creator)
    }

    /// Attempt to record that `user` follows `creator`.
    ///
    /// The decision rule runs before the cap check, so a capped user keeps
    /// its previous best creator even when the rule approved the new one.
    ///
    /// # Panics
    ///
    /// Panics if either id is out of range.
    pub fn follow(&mut self, user: UserId, creator: CreatorId) -> FollowOutcome {
        if self.is_following(user, creator) {
            return FollowOutcome::AlreadyFollowing;
        }

        if !should_follow(self.users[user].best_followed(), creator) {
            trace!(user, %creator, "follow declined");
            return FollowOutcome::Declined;
        }

        let followees = self.counts.followees[user];
        if self.max_follows.is_some_and(|cap| followees >= cap) {
            trace!(user, %creator, followees, "follow blocked by cap");
            return FollowOutcome::CapReached;
        }

        self.adjacency[user].insert(creator);
        self.counts.followers[creator.0] += 1;
        self.counts.followees[user] += 1;
        self.users[user].set_best_followed(creator);
        trace!(user, %creator, "followed");

        FollowOutcome::Followed
    }

    fn check_user(&self, user: UserId) {
        assert!(
            user < self.users.len(),
            "user id {user} out of range (num_users={})",
            self.users.len()
        );
    }

    fn check_creator(&self, creator: CreatorId) {
        assert!(
            creator.0 < self.num_creators(),
            "creator id {} out of range (num_creators={})",
            creator.0,
            self.num_creators()
        );
    }
}
