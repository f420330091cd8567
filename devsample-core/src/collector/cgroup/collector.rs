//! Cgroup v2 collection: the single-cgroup flattened view and the full
//! recursive resource-hierarchy walk ("cgchainer") used for per-cgroup
//! deviation accounting.

use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::xxh3_64;

use crate::collector::cgroup::parser::{
    parse_cgroup_procs, parse_cpu_max, parse_cpu_stat, parse_cpu_weight, parse_io_stat,
    parse_max_or_value, parse_memory_current, parse_memory_events, parse_memory_max,
    parse_memory_stat, parse_pids_current, parse_pids_max, parse_pressure_some_total,
};
use crate::collector::traits::FileSystem;
use crate::storage::model::{
    CgroupChainConfig, CgroupChainEntry, CgroupChainMetadata, CgroupChainMetrics, CgroupInfo,
    CgroupMemoryInfo, CgroupPidsInfo,
};

/// Result of a full recursive walk of the cgroup v2 hierarchy: the flattened
/// chain entries plus a single pidlist buffer they slice into via
/// [`CgroupChainEntry::pidlist_range`].
#[derive(Debug, Clone, Default)]
pub struct CgroupChainWalk {
    pub entries: Vec<CgroupChainEntry>,
    pub pidlist: Vec<u32>,
}

/// Collects cgroup v2 metrics, either as a single flattened view of one
/// cgroup (this process's own, for the "running inside a container" case)
/// or as a full recursive walk of the whole hierarchy (for host-wide
/// per-cgroup deviation accounting).
pub struct CgroupCollector<F: FileSystem> {
    fs: F,
    root: String,
}

impl<F: FileSystem> CgroupCollector<F> {
    pub fn new(fs: F, root: impl Into<String>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    fn read(&self, dir: &Path, file: &str) -> Option<String> {
        self.fs.read_to_string(&dir.join(file)).ok()
    }

    /// Flattened view of a single cgroup directory (this collector's `root`).
    pub fn collect(&self) -> Option<CgroupInfo> {
        let dir = Path::new(&self.root);
        if !self.fs.exists(dir) {
            return None;
        }

        let mut info = CgroupInfo::default();

        if let Some(content) = self.read(dir, "cpu.stat") {
            let mut cpu = parse_cpu_stat(&content);
            if let Some(max) = self.read(dir, "cpu.max") {
                let (quota, period) = parse_cpu_max(&max);
                cpu.quota = quota;
                cpu.period = period;
            }
            info.cpu = Some(cpu);
        }

        if self.fs.exists(&dir.join("memory.current")) {
            let mut mem = CgroupMemoryInfo {
                max: self
                    .read(dir, "memory.max")
                    .map(|c| parse_memory_max(&c))
                    .unwrap_or(u64::MAX),
                current: self
                    .read(dir, "memory.current")
                    .map(|c| parse_memory_current(&c))
                    .unwrap_or(0),
                ..Default::default()
            };
            if let Some(stat) = self.read(dir, "memory.stat") {
                parse_memory_stat(&stat, &mut mem);
            }
            if let Some(events) = self.read(dir, "memory.events") {
                parse_memory_events(&events, &mut mem);
            }
            info.memory = Some(mem);
        }

        if self.fs.exists(&dir.join("pids.current")) {
            info.pids = Some(CgroupPidsInfo {
                current: self
                    .read(dir, "pids.current")
                    .map(|c| parse_pids_current(&c))
                    .unwrap_or(0),
                max: self
                    .read(dir, "pids.max")
                    .map(|c| parse_pids_max(&c))
                    .unwrap_or(u64::MAX),
            });
        }

        if let Some(io) = self.read(dir, "io.stat") {
            info.io = parse_io_stat(&io);
        }

        if info == CgroupInfo::default() {
            None
        } else {
            Some(info)
        }
    }

    /// Recursively walks the full cgroup v2 hierarchy rooted at `self.root`,
    /// producing one [`CgroupChainEntry`] per directory and a shared pidlist
    /// buffer.
    ///
    /// Matching across cycles is by `path_hash` (see [`crate::deviation::cgroup`]),
    /// never by `seq` — the tree is walked fresh every cycle and directory
    /// iteration order is not guaranteed stable.
    pub fn collect_chain(&self) -> CgroupChainWalk {
        let mut walk = CgroupChainWalk::default();
        let root = PathBuf::from(&self.root);
        if !self.fs.exists(&root) {
            return walk;
        }
        let mut next_seq = 0u32;
        self.walk_dir(&root, "", 0, 0, &mut next_seq, &mut walk);
        walk
    }

    fn walk_dir(
        &self,
        dir: &Path,
        rel_path: &str,
        depth: u16,
        parent_seq: u32,
        next_seq: &mut u32,
        out: &mut CgroupChainWalk,
    ) {
        let seq = *next_seq;
        *next_seq += 1;

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let metadata = CgroupChainMetadata {
            path_hash: xxh3_64(rel_path.as_bytes()),
            seq,
            parent_seq: if depth == 0 { seq } else { parent_seq },
            depth,
            name_hash: xxh3_64(name.as_bytes()),
        };

        let config = CgroupChainConfig {
            cpu_weight: self
                .read(dir, "cpu.weight")
                .map(|c| parse_cpu_weight(&c))
                .unwrap_or(crate::storage::model::CGROUP_CHAIN_UNDEFINED),
            cpu_max_quota: self
                .read(dir, "cpu.max")
                .map(|c| parse_cpu_max(&c).0)
                .unwrap_or(crate::storage::model::CGROUP_CHAIN_UNDEFINED),
            cpu_max_period: self
                .read(dir, "cpu.max")
                .map(|c| parse_cpu_max(&c).1)
                .unwrap_or(100_000),
            mem_max: self
                .read(dir, "memory.max")
                .map(|c| parse_max_or_value(&c))
                .unwrap_or(crate::storage::model::CGROUP_CHAIN_UNDEFINED),
            swap_max: self
                .read(dir, "memory.swap.max")
                .map(|c| parse_max_or_value(&c))
                .unwrap_or(crate::storage::model::CGROUP_CHAIN_UNDEFINED),
        };

        let mut metrics = CgroupChainMetrics::default();
        if let Some(cpu_stat) = self.read(dir, "cpu.stat") {
            let cpu = parse_cpu_stat(&cpu_stat);
            metrics.cpu_user_usec = cpu.user_usec;
            metrics.cpu_system_usec = cpu.system_usec;
        }
        if let Some(mem_stat) = self.read(dir, "memory.stat") {
            let mut mem = CgroupMemoryInfo::default();
            parse_memory_stat(&mem_stat, &mut mem);
            metrics.mem_anon = mem.anon;
            metrics.mem_file = mem.file;
            metrics.mem_kernel = mem.kernel;
        }
        if let Some(p) = self.read(dir, "cpu.pressure") {
            metrics.cpu_pressure_total = parse_pressure_some_total(&p);
        }
        if let Some(p) = self.read(dir, "memory.pressure") {
            metrics.mem_pressure_total = parse_pressure_some_total(&p);
        }
        if let Some(p) = self.read(dir, "io.pressure") {
            metrics.io_pressure_total = parse_pressure_some_total(&p);
        }

        let start = out.pidlist.len() as u32;
        if let Some(procs) = self.read(dir, "cgroup.procs") {
            out.pidlist.extend(parse_cgroup_procs(&procs));
        }
        let len = out.pidlist.len() as u32 - start;

        out.entries.push(CgroupChainEntry {
            metadata,
            config,
            metrics,
            pidlist_range: (start, len),
        });

        let Ok(children) = self.fs.read_dir(dir) else {
            return;
        };
        let mut subdirs: Vec<PathBuf> = children
            .into_iter()
            .filter(|p| self.fs.read_dir(p).is_ok())
            .collect();
        subdirs.sort();

        for child in subdirs {
            let child_name = child.file_name().map(|n| n.to_string_lossy().to_string());
            let Some(child_name) = child_name else {
                continue;
            };
            let child_rel = if rel_path.is_empty() {
                child_name
            } else {
                format!("{rel_path}/{child_name}")
            };
            self.walk_dir(&child, &child_rel, depth + 1, seq, next_seq, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    fn build_tree() -> MockFs {
        let mut fs = MockFs::new();
        fs.add_file("/sys/fs/cgroup/cpu.weight", "100\n");
        fs.add_file("/sys/fs/cgroup/cpu.max", "max 100000\n");
        fs.add_file("/sys/fs/cgroup/cpu.stat", "usage_usec 100\nuser_usec 60\nsystem_usec 40\n");
        fs.add_file("/sys/fs/cgroup/memory.max", "max\n");
        fs.add_file("/sys/fs/cgroup/memory.current", "1000\n");
        fs.add_file("/sys/fs/cgroup/memory.stat", "anon 500\nfile 200\nkernel 50\n");
        fs.add_file("/sys/fs/cgroup/cgroup.procs", "1\n2\n");

        fs.add_file("/sys/fs/cgroup/app.slice/cpu.weight", "200\n");
        fs.add_file("/sys/fs/cgroup/app.slice/cpu.max", "50000 100000\n");
        fs.add_file(
            "/sys/fs/cgroup/app.slice/cpu.stat",
            "usage_usec 10\nuser_usec 6\nsystem_usec 4\n",
        );
        fs.add_file("/sys/fs/cgroup/app.slice/memory.max", "2000000\n");
        fs.add_file("/sys/fs/cgroup/app.slice/memory.current", "500\n");
        fs.add_file("/sys/fs/cgroup/app.slice/memory.stat", "anon 100\nfile 50\nkernel 10\n");
        fs.add_file("/sys/fs/cgroup/app.slice/cgroup.procs", "42\n");
        fs
    }

    #[test]
    fn collect_chain_walks_full_tree() {
        let fs = build_tree();
        let collector = CgroupCollector::new(fs, "/sys/fs/cgroup");
        let walk = collector.collect_chain();

        assert_eq!(walk.entries.len(), 2);
        let root = &walk.entries[0];
        assert_eq!(root.metadata.depth, 0);
        assert_eq!(root.metadata.seq, root.metadata.parent_seq);

        let child = &walk.entries[1];
        assert_eq!(child.metadata.depth, 1);
        assert_eq!(child.metadata.parent_seq, root.metadata.seq);
        assert_eq!(child.config.cpu_max_quota, 50_000);
        assert_eq!(child.metrics.mem_anon, 100);

        let (start, len) = child.pidlist_range;
        assert_eq!(&walk.pidlist[start as usize..(start + len) as usize], &[42]);
    }

    #[test]
    fn path_hash_is_stable_across_walks() {
        let fs = build_tree();
        let collector = CgroupCollector::new(fs, "/sys/fs/cgroup");
        let a = collector.collect_chain();
        let b = collector.collect_chain();
        assert_eq!(a.entries[1].metadata.path_hash, b.entries[1].metadata.path_hash);
    }

    #[test]
    fn collect_flattened_view() {
        let fs = build_tree();
        let collector = CgroupCollector::new(fs, "/sys/fs/cgroup");
        let info = collector.collect().expect("cgroup info");
        assert_eq!(info.memory.unwrap().current, 1000);
        assert_eq!(info.cpu.unwrap().user_usec, 60);
    }
}
