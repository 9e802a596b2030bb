//! The follow-decision rule.
//!
//! A user adopts a recommended creator only if it ranks strictly above the
//! best creator the user already follows. Because of this, a user's best
//! followed rank is non-increasing for the whole run.

use crate::model::CreatorId;

/// Decide whether a user whose best followed creator is `best` should follow
/// `candidate`.
#[must_use]
pub const fn should_follow(best: Option<CreatorId>, candidate: CreatorId) -> bool {
    match best {
        None => true,
        Some(current) => candidate.outranks(current),
    }
}
