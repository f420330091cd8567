//! Main collector that combines process and system counter sources.
//!
//! The `Collector` struct provides a unified interface for collecting
//! all system and per-task metrics into a `Snapshot` for the deviation engine.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::collector::cgroup::CgroupCollector;
use crate::collector::procfs::{CollectError, ProcessCollector, SystemCollector, UserResolver};
use crate::collector::traits::FileSystem;
use crate::storage::interner::StringInterner;
use crate::storage::model::{DataBlock, Snapshot};
use crate::util::is_container;

/// Timing information for each collector phase.
///
/// Used for debugging and performance monitoring.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total snapshot collection time.
    pub total: Duration,
    /// Time to collect process information.
    pub processes: Duration,
    /// Time to collect system memory info.
    pub meminfo: Duration,
    /// Time to collect CPU info.
    pub cpuinfo: Duration,
    /// Time to collect load average.
    pub loadavg: Duration,
    /// Time to collect disk statistics.
    pub diskstats: Duration,
    /// Time to collect network device statistics.
    pub netdev: Duration,
    /// Time to collect PSI (Pressure Stall Information).
    pub psi: Duration,
    /// Time to collect vmstat.
    pub vmstat: Duration,
    /// Time to collect global stat.
    pub stat: Duration,
    /// Time to collect network SNMP statistics.
    pub netsnmp: Duration,
    /// Time to collect cgroup metrics.
    pub cgroup: Duration,
}

/// Main collector that gathers all system and task metrics into one [`Snapshot`].
///
/// Combines process and system counter sources into a single interface
/// that produces complete snapshots for the deviation engine and the raw
/// log writer.
pub struct Collector<F: FileSystem + Clone> {
    fs: F,
    process_collector: ProcessCollector<F>,
    system_collector: SystemCollector<F>,
    user_resolver: UserResolver,
    cgroup_collector: Option<CgroupCollector<F>>,
    /// Timing information from the last collect_snapshot call.
    last_timing: Option<CollectorTiming>,
}

impl<F: FileSystem + Clone> Collector<F> {
    /// Default cgroup path for containers.
    const DEFAULT_CGROUP_PATH: &'static str = "/sys/fs/cgroup";

    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    ///
    /// If running inside a container (detected via `is_container()`),
    /// the cgroup collector is automatically enabled with default path `/sys/fs/cgroup`.
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        let proc_path = proc_path.into();

        let mut user_resolver = UserResolver::new();
        if let Ok(passwd_content) = fs.read_to_string(Path::new("/etc/passwd")) {
            user_resolver.load_from_content(&passwd_content);
        }

        let cgroup_collector = if is_container() {
            Some(CgroupCollector::new(fs.clone(), Self::DEFAULT_CGROUP_PATH))
        } else {
            None
        };

        Self {
            fs: fs.clone(),
            process_collector: ProcessCollector::new(fs.clone(), &proc_path),
            system_collector: SystemCollector::new(fs.clone(), &proc_path),
            user_resolver,
            cgroup_collector,
            last_timing: None,
        }
    }

    /// Enables cgroup metrics collection with a custom path, overriding
    /// automatic container detection.
    pub fn with_cgroup(mut self, cgroup_path: &str) -> Self {
        self.cgroup_collector = Some(CgroupCollector::new(self.fs.clone(), cgroup_path));
        self
    }

    /// Forces cgroup metrics collection regardless of container detection.
    /// Useful for testing on bare metal or when automatic detection fails.
    pub fn force_cgroup(mut self, cgroup_path: Option<&str>) -> Self {
        let path = cgroup_path.unwrap_or(Self::DEFAULT_CGROUP_PATH);
        self.cgroup_collector = Some(CgroupCollector::new(self.fs.clone(), path));
        self
    }

    /// Enables `/proc/[pid]/smaps_rollup` reads for proportional set size.
    /// Off by default: a full smaps walk per process per cycle is
    /// measurably more expensive than the rest of collection combined.
    pub fn with_psize(mut self, enabled: bool) -> Self {
        self.process_collector.set_psize(enabled);
        self
    }

    /// Enables `/proc/[pid]/wchan` reads for the kernel wait-channel name.
    /// Off by default, same cost tradeoff as `with_psize`.
    pub fn with_wchan(mut self, enabled: bool) -> Self {
        self.process_collector.set_wchan(enabled);
        self
    }

    /// Returns whether the cgroup collector is enabled.
    pub fn cgroup_enabled(&self) -> bool {
        self.cgroup_collector.is_some()
    }

    /// Returns a reference to the string interner used for deduplication.
    pub fn interner(&self) -> &StringInterner {
        self.process_collector.interner()
    }

    /// Returns a mutable reference to the string interner.
    pub fn interner_mut(&mut self) -> &mut StringInterner {
        self.process_collector.interner_mut()
    }

    /// Clears the string interner, freeing memory.
    /// Should be called after every raw log record is flushed, since names
    /// and command lines only need to stay interned for the cycle that
    /// produced them.
    pub fn clear_interner(&mut self) {
        self.process_collector.clear_interner();
    }

    /// Returns a reference to the user resolver for UID -> username mapping.
    pub fn user_resolver(&self) -> &UserResolver {
        &self.user_resolver
    }

    /// Returns timing information from the last collect_snapshot call.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }

    /// Collects a complete system snapshot: all present tasks plus
    /// system-wide counters (CPU, memory, load, disk, network, PSI,
    /// vmstat, global stat, net/snmp) and, if enabled, cgroup metrics.
    ///
    /// Any single metric file failing to parse degrades that block to
    /// absent (it is simply not pushed) rather than failing the whole
    /// snapshot — per the counter-source contract, only an inability to
    /// enumerate `/proc/[pid]` itself is fatal.
    pub fn collect_snapshot(&mut self) -> Result<Snapshot, CollectError> {
        let total_start = Instant::now();
        let mut timing = CollectorTiming::default();

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let mut blocks = Vec::new();

        // Collect global stat first to get boot time for process start time calculation
        let start = Instant::now();
        let stat = self.system_collector.collect_stat().ok();
        timing.stat = start.elapsed();
        if let Some(ref stat) = stat {
            self.process_collector.set_boot_time(stat.btime);
        }

        // Collect process information (now with correct boot time)
        let start = Instant::now();
        let processes = self.process_collector.collect_all_processes()?;
        timing.processes = start.elapsed();
        blocks.push(DataBlock::Processes(processes));

        let start = Instant::now();
        if let Ok(meminfo) = self.system_collector.collect_meminfo() {
            blocks.push(DataBlock::SystemMem(meminfo));
        }
        timing.meminfo = start.elapsed();

        let start = Instant::now();
        if let Ok(cpuinfo) = self.system_collector.collect_cpuinfo() {
            blocks.push(DataBlock::SystemCpu(cpuinfo));
        }
        timing.cpuinfo = start.elapsed();

        let start = Instant::now();
        if let Ok(loadavg) = self.system_collector.collect_loadavg() {
            blocks.push(DataBlock::SystemLoad(loadavg));
        }
        timing.loadavg = start.elapsed();

        let start = Instant::now();
        {
            let diskstats_result = if is_container() {
                let mount_devices = self
                    .system_collector
                    .collect_mountinfo_device_ids()
                    .unwrap_or_default();
                self.system_collector
                    .collect_diskstats_with_mountinfo_filter(
                        self.process_collector.interner_mut(),
                        &mount_devices,
                    )
            } else {
                self.system_collector
                    .collect_diskstats(self.process_collector.interner_mut())
            };

            if let Ok(diskstats) = diskstats_result {
                blocks.push(DataBlock::SystemDisk(diskstats));
            }
        }
        timing.diskstats = start.elapsed();

        let start = Instant::now();
        if let Ok(netdev) = self
            .system_collector
            .collect_net_dev(self.process_collector.interner_mut())
        {
            blocks.push(DataBlock::SystemNet(netdev));
        }
        timing.netdev = start.elapsed();

        let start = Instant::now();
        if let Ok(psi) = self.system_collector.collect_psi()
            && !psi.is_empty()
        {
            blocks.push(DataBlock::SystemPsi(psi));
        }
        timing.psi = start.elapsed();

        let start = Instant::now();
        if let Ok(vmstat) = self.system_collector.collect_vmstat() {
            blocks.push(DataBlock::SystemVmstat(vmstat));
        }
        timing.vmstat = start.elapsed();

        if let Some(stat) = stat {
            blocks.push(DataBlock::SystemStat(stat));
        }

        let start = Instant::now();
        if let Ok(netsnmp) = self.system_collector.collect_netsnmp() {
            blocks.push(DataBlock::SystemNetSnmp(netsnmp));
        }
        timing.netsnmp = start.elapsed();

        let start = Instant::now();
        if let Some(ref cgroup_collector) = self.cgroup_collector {
            if let Some(cgroup_info) = cgroup_collector.collect() {
                blocks.push(DataBlock::Cgroup(cgroup_info));
            }
            let walk = cgroup_collector.collect_chain();
            if !walk.entries.is_empty() {
                blocks.push(DataBlock::CgroupChain(walk.entries));
                blocks.push(DataBlock::CgroupPidlist(walk.pidlist));
            }
        }
        timing.cgroup = start.elapsed();

        timing.total = total_start.elapsed();
        self.last_timing = Some(timing);

        Ok(Snapshot { timestamp, blocks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_collect_snapshot() {
        let fs = MockFs::typical_system();
        let mut collector = Collector::new(fs, "/proc");

        let snapshot = collector.collect_snapshot().unwrap();

        assert!(snapshot.blocks.len() >= 9);

        let has_processes = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::Processes(_)));
        assert!(has_processes);

        let has_meminfo = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemMem(_)));
        assert!(has_meminfo);

        let has_cpuinfo = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemCpu(_)));
        assert!(has_cpuinfo);

        let has_loadavg = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemLoad(_)));
        assert!(has_loadavg);

        let has_diskstats = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemDisk(_)));
        assert!(has_diskstats);

        let has_netdev = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemNet(_)));
        assert!(has_netdev);

        let has_psi = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemPsi(_)));
        assert!(has_psi);

        let has_vmstat = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemVmstat(_)));
        assert!(has_vmstat);

        let has_stat = snapshot
            .blocks
            .iter()
            .any(|b| matches!(b, DataBlock::SystemStat(_)));
        assert!(has_stat);
    }

    #[test]
    fn test_collect_snapshot_processes() {
        let fs = MockFs::typical_system();
        let mut collector = Collector::new(fs, "/proc");

        let snapshot = collector.collect_snapshot().unwrap();

        let processes = snapshot.blocks.iter().find_map(|b| {
            if let DataBlock::Processes(p) = b {
                Some(p)
            } else {
                None
            }
        });

        assert!(processes.is_some());
        assert_eq!(processes.unwrap().len(), 3); // typical_system has 3 processes
    }

    #[test]
    fn test_interner_persistence() {
        let fs = MockFs::typical_system();
        let mut collector = Collector::new(fs, "/proc");

        let snapshot1 = collector.collect_snapshot().unwrap();
        let snapshot2 = collector.collect_snapshot().unwrap();

        let get_first_process = |snapshot: &Snapshot| {
            snapshot.blocks.iter().find_map(|b| {
                if let DataBlock::Processes(p) = b {
                    p.iter().find(|proc| proc.pid == 1).cloned()
                } else {
                    None
                }
            })
        };

        let proc1 = get_first_process(&snapshot1).unwrap();
        let proc2 = get_first_process(&snapshot2).unwrap();

        assert_eq!(proc1.name_hash, proc2.name_hash);
    }
}
