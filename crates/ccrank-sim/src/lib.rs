//! ccrank-sim library.
//!
//! Batch driver over [`ccrank_core::Platform`]: configuration files, seeded
//! multi-run batches, single-seed replay, and summary statistics.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

#![forbid(unsafe_code)]

pub mod campaign;
pub mod config;
pub mod summary;

pub use campaign::{RunResult, Simulation, SimulationReport};
pub use config::SimulationConfig;
pub use summary::BatchSummary;
