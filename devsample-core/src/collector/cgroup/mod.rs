//! Cgroup v2 metrics collection.
//!
//! This module provides collection of container resource limits and usage
//! from the Linux cgroup v2 filesystem, in two shapes: a single flattened
//! view of the collector's own cgroup (`CgroupInfo`, useful when the agent
//! itself runs inside exactly one container) and a full recursive walk of
//! the whole cgroup v2 tree (`CgroupChainEntry` + pidlist), used to attribute
//! resource usage across an entire host's hierarchy.

mod collector;
mod parser;

pub use collector::{CgroupChainWalk, CgroupCollector};
