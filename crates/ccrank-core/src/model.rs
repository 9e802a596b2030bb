//! Entity model: users and ranked content creators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a simulated user.
pub type UserId = usize;

/// Identifier of a content creator, which doubles as its global rank.
///
/// Lower ids are better: `CreatorId(0)` is the single best creator in the
/// network, and ordering on `CreatorId` is rank ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatorId(pub usize);

impl CreatorId {
    /// The globally best creator.
    pub const TOP: Self = Self(0);

    /// Zero-based rank (identical to the id).
    #[must_use]
    pub const fn rank(self) -> usize {
        self.0
    }

    /// Whether this is the top-ranked creator.
    #[must_use]
    pub const fn is_top(self) -> bool {
        self.0 == 0
    }

    /// Whether `self` ranks strictly above `other`.
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cc{}", self.0)
    }
}

/// A content creator. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCreator {
    id: CreatorId,
}

impl ContentCreator {
    /// Create a creator with the given id.
    #[must_use]
    pub const fn new(id: CreatorId) -> Self {
        Self { id }
    }

    /// Return this creator's id.
    #[must_use]
    pub const fn id(&self) -> CreatorId {
        self.id
    }
}

/// A user of the platform and the best creator it currently follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    best_followed: Option<CreatorId>,
}

impl User {
    /// Create a user that follows nobody yet.
    #[must_use]
    pub const fn new(id: UserId) -> Self {
        Self {
            id,
            best_followed: None,
        }
    }

    /// Return this user's id.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Best-ranked creator this user follows, if any.
    #[must_use]
    pub const fn best_followed(&self) -> Option<CreatorId> {
        self.best_followed
    }

    /// Whether the user already follows the top creator and can never improve.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self.best_followed, Some(c) if c.is_top())
    }

    pub(crate) const fn set_best_followed(&mut self, creator: CreatorId) {
        self.best_followed = Some(creator);
    }
}
