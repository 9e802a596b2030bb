//! ccrank-core library.
//!
//! Simulates users discovering a globally ranked set of content creators
//! through popularity-biased recommendations.
//!
//! - [`model`]: users and ranked creators.
//! - [`decision`]: the follow-decision rule.
//! - [`graph`]: the user → creator follow graph and its aggregates.
//! - [`sampler`]: multi-alpha preferential-attachment recommendations.
//! - [`platform`]: the timestep loop and convergence detection.
//! - [`snapshot`]: periodic evolution snapshots.
//! - [`oracle`]: invariant checks over graphs and run reports.
//!
//! # Conventions
//!
//! - **Errors**: Use [`PlatformError`] for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod decision;
pub mod error;
pub mod graph;
pub mod model;
pub mod oracle;
pub mod platform;
pub mod rng;
pub mod sampler;
pub mod snapshot;

pub use error::PlatformError;
pub use graph::{FollowCounts, FollowGraph, FollowOutcome};
pub use model::{ContentCreator, CreatorId, User, UserId};
pub use platform::{Platform, PlatformConfig, PlatformReport};
pub use rng::DeterministicRng;
pub use sampler::{RecommendationSampler, Recommendations};
pub use snapshot::{EvolutionSnapshot, EvolutionTracker};
