//! Cgroup v2 metrics for container environments.
//!
//! These structures store resource limits and usage from Linux cgroup v2 filesystem.
//! Only collected when running inside a container (detected via `is_container()`).

use serde::{Deserialize, Serialize};

/// I/O cgroup metrics (per block device).
///
/// Source file:
/// - `/sys/fs/cgroup/io.stat` - per-device I/O counters for the cgroup
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupIoInfo {
    /// Block device major number.
    pub major: u32,
    /// Block device minor number.
    pub minor: u32,
    /// Bytes read.
    pub rbytes: u64,
    /// Bytes written.
    pub wbytes: u64,
    /// Read I/O operations.
    pub rios: u64,
    /// Write I/O operations.
    pub wios: u64,
}

/// CPU cgroup metrics.
///
/// Source files:
/// - `/sys/fs/cgroup/cpu.max` - quota and period
/// - `/sys/fs/cgroup/cpu.stat` - usage statistics
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupCpuInfo {
    /// CPU quota in microseconds per period (-1 = unlimited).
    /// From `cpu.max` first field.
    pub quota: i64,
    /// CPU period in microseconds.
    /// From `cpu.max` second field.
    pub period: u64,
    /// Total CPU usage in microseconds.
    /// From `cpu.stat` usage_usec.
    pub usage_usec: u64,
    /// User CPU usage in microseconds.
    /// From `cpu.stat` user_usec.
    pub user_usec: u64,
    /// System CPU usage in microseconds.
    /// From `cpu.stat` system_usec.
    pub system_usec: u64,
    /// Time throttled in microseconds.
    /// From `cpu.stat` throttled_usec.
    pub throttled_usec: u64,
    /// Number of throttling events.
    /// From `cpu.stat` nr_throttled.
    pub nr_throttled: u64,
}

/// Memory cgroup metrics.
///
/// Source files:
/// - `/sys/fs/cgroup/memory.max` - memory limit
/// - `/sys/fs/cgroup/memory.current` - current usage
/// - `/sys/fs/cgroup/memory.stat` - detailed statistics
/// - `/sys/fs/cgroup/memory.events` - OOM events
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupMemoryInfo {
    /// Memory limit in bytes (u64::MAX = unlimited).
    /// From `memory.max`.
    pub max: u64,
    /// Current memory usage in bytes.
    /// From `memory.current`.
    pub current: u64,
    /// Anonymous memory in bytes.
    /// From `memory.stat` anon.
    pub anon: u64,
    /// File-backed memory (page cache) in bytes.
    /// From `memory.stat` file.
    pub file: u64,
    /// Kernel memory in bytes.
    /// From `memory.stat` kernel.
    pub kernel: u64,
    /// Slab memory in bytes.
    /// From `memory.stat` slab.
    pub slab: u64,
    /// Number of OOM kills.
    /// From `memory.events` oom_kill.
    pub oom_kill: u64,
}

/// PIDs cgroup metrics.
///
/// Source files:
/// - `/sys/fs/cgroup/pids.current` - current process count
/// - `/sys/fs/cgroup/pids.max` - process limit
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupPidsInfo {
    /// Current number of processes.
    /// From `pids.current`.
    pub current: u64,
    /// Maximum allowed processes (u64::MAX = unlimited).
    /// From `pids.max`.
    pub max: u64,
}

/// Combined cgroup metrics for a container.
///
/// All fields are optional since some cgroup controllers may be disabled.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupInfo {
    /// CPU metrics (if cpu controller is available).
    pub cpu: Option<CgroupCpuInfo>,
    /// Memory metrics (if memory controller is available).
    pub memory: Option<CgroupMemoryInfo>,
    /// PIDs metrics (if pids controller is available).
    pub pids: Option<CgroupPidsInfo>,

    /// I/O metrics (if io controller is available).
    ///
    /// This is a list of devices present in `io.stat`.
    ///
    /// Note: `#[serde(default)]` keeps backward compatibility when loading
    /// older snapshots that were stored without this field.
    #[serde(default)]
    pub io: Vec<CgroupIoInfo>,
}

/// Sentinel for an unlimited cpu/mem/swap configuration value ("max" in the pseudo-file).
pub const CGROUP_CHAIN_MAX: i64 = -1;
/// Sentinel for a configuration value the controller does not expose.
pub const CGROUP_CHAIN_UNDEFINED: i64 = -2;

/// Identity and placement of one cgroup within the full resource hierarchy.
///
/// `path_hash` is the stable matching key across samples: the tree is rewalked
/// every cycle, so a cgroup's position in the walk order (and any `seq`
/// assigned to it) is not guaranteed to stay put, but its path does.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupChainMetadata {
    /// Hash of the cgroup's full path relative to the cgroup v2 mount, interned
    /// for the display name itself.
    pub path_hash: u64,
    /// Sequence number assigned to this entry during the current walk.
    pub seq: u32,
    /// Sequence number of the parent cgroup in the current walk, or `seq` itself at the root.
    pub parent_seq: u32,
    /// Nesting depth, root is 0.
    pub depth: u16,
    /// Hash of the cgroup's own (non-path) name, interned.
    pub name_hash: u64,
}

/// Configured resource limits for one cgroup.
///
/// Fields use [`CGROUP_CHAIN_MAX`] / [`CGROUP_CHAIN_UNDEFINED`] sentinels rather
/// than `Option` so the structure stays a fixed-size, directly-serializable record.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupChainConfig {
    /// `cpu.weight` (1-10000, default 100). -2 if the controller is absent.
    pub cpu_weight: i64,
    /// `cpu.max` quota in microseconds per period. -1 if unlimited, -2 if absent.
    pub cpu_max_quota: i64,
    /// `cpu.max` period in microseconds.
    pub cpu_max_period: u64,
    /// `memory.max` in bytes. -1 if unlimited, -2 if absent.
    pub mem_max: i64,
    /// `memory.swap.max` in bytes. -1 if unlimited, -2 if absent.
    pub swap_max: i64,
}

/// Per-cycle usage metrics for one cgroup.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupChainMetrics {
    pub cpu_user_usec: u64,
    pub cpu_system_usec: u64,
    pub mem_anon: u64,
    pub mem_file: u64,
    pub mem_kernel: u64,
    /// Total microseconds of `some` pressure, `/sys/fs/cgroup/<path>/cpu.pressure`.
    pub cpu_pressure_total: u64,
    /// Total microseconds of `some` pressure, `memory.pressure`.
    pub mem_pressure_total: u64,
    /// Total microseconds of `some` pressure, `io.pressure`.
    pub io_pressure_total: u64,
}

/// One node in the cgroup v2 resource hierarchy, as walked this cycle.
///
/// The pidlist for this cgroup is stored out-of-line (its own rawlog segment /
/// its own field on the containing snapshot) and referenced by range; see
/// [`crate::deviation::CgroupDeviation`] for how chains are matched across cycles.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupChainEntry {
    pub metadata: CgroupChainMetadata,
    pub config: CgroupChainConfig,
    pub metrics: CgroupChainMetrics,
    /// Index range (start, len) into the accompanying pidlist buffer.
    pub pidlist_range: (u32, u32),
}
