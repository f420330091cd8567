//! devsample-core - sampling and deviation engine for a system/process activity monitor.
//!
//! This library provides the core functionality shared between a sampling
//! agent (writer/twin-mode) and a replay tool (reader):
//!
//! - [`collector`] - counter sources: parses `/proc`-style pseudo-files and cgroup v2
//!   into typed snapshots.
//! - [`storage`] - data model and string interning shared across the crate.
//! - [`pdb`] - the task database: identity-stable per-task baselines across cycles.
//! - [`deviation`] - the deviation engine: per-cycle differences at system/task/cgroup scope.
//! - [`accounting`] - the process-accounting reader (drains exit records).
//! - [`rawlog`] - the self-describing, compressed, append-only log format.
//! - [`sampling`] - the sampling loop that drives one cycle end-to-end.
//! - [`twin`] - the fork-based twin-mode supervisor (live write + replay read).
//! - [`sink`] - the `Sink` trait that consumes finished cycles.
//! - [`error`] - crate-wide error types and the exit-code taxonomy.

pub mod accounting;
pub mod collector;
pub mod deviation;
pub mod error;
pub mod pdb;
pub mod rawlog;
pub mod sampling;
pub mod sink;
pub mod storage;
pub mod twin;
pub mod util;
