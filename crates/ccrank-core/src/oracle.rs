use crate::graph::FollowGraph;
use crate::model::{CreatorId, UserId};
use crate::platform::PlatformReport;

// ── Core result types ─────────────────────────────────────────────────────────

/// Oracle result for an invariant check.
///
/// Returned by each checker and by [`InvariantOracle::check_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    /// Every invariant that was violated.
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A creator's recorded follower count disagrees with the adjacency.
    FollowerCount {
        /// Creator whose count is wrong.
        creator: CreatorId,
        /// Count held in the aggregates.
        recorded: usize,
        /// Count implied by the adjacency.
        actual: usize,
    },

    /// A user's recorded followee count disagrees with the adjacency.
    FolloweeCount {
        /// User whose count is wrong.
        user: UserId,
        /// Count held in the aggregates.
        recorded: usize,
        /// Size of the user's adjacency set.
        actual: usize,
    },

    /// A user follows more creators than the cap allows.
    CapExceeded {
        /// Offending user.
        user: UserId,
        /// Followed creators.
        followees: usize,
        /// Configured cap.
        cap: usize,
    },

    /// A user's best creator is not the best-ranked creator it follows.
    BestMismatch {
        /// Offending user.
        user: UserId,
        /// Best creator recorded on the user.
        recorded: Option<CreatorId>,
        /// Best-ranked creator in the user's adjacency.
        actual: Option<CreatorId>,
    },

    /// A user's best creator got worse between two observations.
    RankRegressed {
        /// Offending user.
        user: UserId,
        /// Best creator at the earlier observation.
        before: Option<CreatorId>,
        /// Best creator at the later observation.
        after: Option<CreatorId>,
    },

    /// A found-at timestep lies outside `1..=iterations`.
    FoundOutOfRange {
        /// Offending user.
        user: UserId,
        /// Recorded timestep.
        timestep: u64,
        /// Iterations the run executed.
        iterations: u64,
    },

    /// A converged run still has users without a found-at timestep.
    ConvergedWithSearchers {
        /// Users that never found the top creator.
        users: Vec<UserId>,
    },
}

// ── Oracle ────────────────────────────────────────────────────────────────────

/// Oracle for verifying follow-graph and run invariants.
///
/// # Invariants checked
///
/// 1. **Aggregate consistency** (`check_aggregates`): follower and followee
///    counts match the adjacency.
/// 2. **Cap** (`check_cap`): nobody exceeds `max_follows`.
/// 3. **Best creator** (`check_best`): each user's best creator is the
///    minimum of its adjacency.
/// 4. **Monotonic rank** (`check_monotonic`): best ranks never get worse.
/// 5. **Found timesteps** (`check_found`): found-at values are in range and
///    a converged run has no stragglers.
pub struct InvariantOracle;

impl InvariantOracle {
    // ── Invariant 1: Aggregate consistency ───────────────────────────────────

    /// Check that aggregate counts equal what the adjacency implies.
    #[must_use]
    pub fn check_aggregates(graph: &FollowGraph) -> OracleResult {
        let mut violations = Vec::new();
        let mut actual_followers = vec![0_usize; graph.num_creators()];

        for user in 0..graph.num_users() {
            let followees = graph.followees_of(user);
            for creator in followees {
                actual_followers[creator.0] += 1;
            }

            let recorded = graph.counts().followees()[user];
            if recorded != followees.len() {
                violations.push(InvariantViolation::FolloweeCount {
                    user,
                    recorded,
                    actual: followees.len(),
                });
            }
        }

        for (creator, (&recorded, &actual)) in graph
            .counts()
            .followers()
            .iter()
            .zip(&actual_followers)
            .enumerate()
        {
            if recorded != actual {
                violations.push(InvariantViolation::FollowerCount {
                    creator: CreatorId(creator),
                    recorded,
                    actual,
                });
            }
        }

        OracleResult::from_violations(violations)
    }

    // ── Invariant 2: Cap ──────────────────────────────────────────────────────

    /// Check that no user follows more creators than the cap allows.
    #[must_use]
    pub fn check_cap(graph: &FollowGraph) -> OracleResult {
        let Some(cap) = graph.max_follows() else {
            return OracleResult::pass();
        };

        let violations = (0..graph.num_users())
            .filter_map(|user| {
                let followees = graph.followees_of(user).len();
                (followees > cap).then_some(InvariantViolation::CapExceeded {
                    user,
                    followees,
                    cap,
                })
            })
            .collect();

        OracleResult::from_violations(violations)
    }

    // ── Invariant 3: Best creator ─────────────────────────────────────────────

    /// Check that every user's best creator is the best-ranked one it follows.
    ///
    /// Edges are only ever added for strictly better creators, so the most
    /// recently adopted creator is always the adjacency minimum.
    #[must_use]
    pub fn check_best(graph: &FollowGraph) -> OracleResult {
        let violations = graph
            .users()
            .iter()
            .filter_map(|user| {
                let actual = graph.followees_of(user.id()).first().copied();
                let recorded = user.best_followed();
                (recorded != actual).then_some(InvariantViolation::BestMismatch {
                    user: user.id(),
                    recorded,
                    actual,
                })
            })
            .collect();

        OracleResult::from_violations(violations)
    }

    // ── Invariant 4: Monotonic rank ───────────────────────────────────────────

    /// Check that no user's best creator got worse from `before` to `after`.
    ///
    /// Both slices are per-user satisfaction vectors of equal length.
    #[must_use]
    pub fn check_monotonic(before: &[Option<CreatorId>], after: &[Option<CreatorId>]) -> OracleResult {
        let violations = before
            .iter()
            .zip(after)
            .enumerate()
            .filter_map(|(user, (&b, &a))| {
                let regressed = match (b, a) {
                    (Some(_), None) => true,
                    (Some(old), Some(new)) => old.outranks(new),
                    (None, _) => false,
                };
                regressed.then_some(InvariantViolation::RankRegressed {
                    user,
                    before: b,
                    after: a,
                })
            })
            .collect();

        OracleResult::from_violations(violations)
    }

    // ── Invariant 5: Found timesteps ──────────────────────────────────────────

    /// Check found-at timesteps against the iterations a run executed.
    #[must_use]
    pub fn check_found(report: &PlatformReport) -> OracleResult {
        let mut violations: Vec<InvariantViolation> = report
            .found_at
            .iter()
            .enumerate()
            .filter_map(|(user, found)| {
                let timestep = (*found)?;
                (timestep == 0 || timestep > report.iterations).then_some(
                    InvariantViolation::FoundOutOfRange {
                        user,
                        timestep,
                        iterations: report.iterations,
                    },
                )
            })
            .collect();

        if report.converged {
            let users: Vec<UserId> = report
                .found_at
                .iter()
                .enumerate()
                .filter(|(_, found)| found.is_none())
                .map(|(user, _)| user)
                .collect();
            if !users.is_empty() {
                violations.push(InvariantViolation::ConvergedWithSearchers { users });
            }
        }

        OracleResult::from_violations(violations)
    }

    // ── Combined entry point ──────────────────────────────────────────────────

    /// Run every graph invariant plus the found-timestep check.
    #[must_use]
    pub fn check_all(graph: &FollowGraph, report: &PlatformReport) -> OracleResult {
        Self::check_aggregates(graph)
            .merge(Self::check_cap(graph))
            .merge(Self::check_best(graph))
            .merge(Self::check_found(report))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn report(iterations: u64, converged: bool, found_at: Vec<Option<u64>>) -> PlatformReport {
        PlatformReport {
            iterations,
            converged,
            num_followers: vec![],
            num_followees: vec![],
            found_at,
            satisfaction: vec![],
            mean_best_rank: vec![],
            evolution: BTreeMap::new(),
        }
    }

    #[test]
    fn graph_built_through_follow_passes() {
        let mut graph = FollowGraph::new(3, 4, 2);
        let _ = graph.follow(0, CreatorId(3));
        let _ = graph.follow(0, CreatorId(1));
        let _ = graph.follow(0, CreatorId(0));
        let _ = graph.follow(1, CreatorId(2));
        let result = InvariantOracle::check_all(&graph, &report(1, false, vec![None; 3]));
        assert!(result.passed, "{:?}", result.violations);
    }

    #[test]
    fn monotonic_detects_regression() {
        let before = [Some(CreatorId(2)), Some(CreatorId(1)), None];
        let after = [Some(CreatorId(1)), Some(CreatorId(3)), Some(CreatorId(5))];
        let result = InvariantOracle::check_monotonic(&before, &after);
        assert!(!result.passed);
        assert_eq!(
            result.violations,
            vec![InvariantViolation::RankRegressed {
                user: 1,
                before: Some(CreatorId(1)),
                after: Some(CreatorId(3)),
            }]
        );
    }

    #[test]
    fn found_out_of_range_is_reported() {
        let result = InvariantOracle::check_found(&report(3, false, vec![Some(4), Some(0), None]));
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn converged_with_searchers_is_reported() {
        let result = InvariantOracle::check_found(&report(3, true, vec![Some(1), None]));
        assert_eq!(
            result.violations,
            vec![InvariantViolation::ConvergedWithSearchers { users: vec![1] }]
        );
    }

    #[test]
    fn merge_accumulates_failures() {
        let ok = OracleResult::pass();
        let bad = OracleResult::from_violations(vec![InvariantViolation::ConvergedWithSearchers {
            users: vec![0],
        }]);
        let merged = ok.merge(bad.clone()).merge(OracleResult::pass());
        assert!(!merged.passed);
        assert_eq!(merged.violations, bad.violations);
    }
}
