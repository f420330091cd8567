//! Data models for the storage system.
//!
//! This module contains all data structures used for storing metrics:
//!
//! - [`process`]: Per-process metrics from `/proc/[pid]/`
//! - [`system`]: System-wide metrics from `/proc/` filesystem
//! - [`cgroup`]: Cgroup v2 resource hierarchy (current container + full chain)
//! - [`snapshot`]: Storage structures (Snapshot, DataBlock)

mod cgroup;
mod process;
mod snapshot;
mod system;

pub use cgroup::{
    CGROUP_CHAIN_MAX, CGROUP_CHAIN_UNDEFINED, CgroupChainConfig, CgroupChainEntry,
    CgroupChainMetadata, CgroupChainMetrics, CgroupCpuInfo, CgroupInfo, CgroupIoInfo,
    CgroupMemoryInfo, CgroupPidsInfo,
};
pub use process::{
    ProcessCpuInfo, ProcessDskInfo, ProcessGpuInfo, ProcessInfo, ProcessMemInfo, ProcessNetInfo,
};
pub use snapshot::{DataBlock, Snapshot};
pub use system::{
    SystemCpuInfo, SystemDiskInfo, SystemFileInfo, SystemInterruptInfo, SystemLoadInfo,
    SystemMemInfo, SystemNetInfo, SystemNetSnmpInfo, SystemPsiInfo, SystemSoftirqInfo,
    SystemStatInfo, SystemVmstatInfo,
};
