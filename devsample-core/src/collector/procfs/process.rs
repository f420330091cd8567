//! Process collector for gathering per-process metrics from `/proc/[pid]/`.

use crate::collector::procfs::parser::{parse_proc_io, parse_proc_stat, parse_proc_status, parse_smaps_pss};
use crate::collector::traits::FileSystem;
use crate::storage::interner::StringInterner;
use crate::storage::model::{
    ProcessCpuInfo, ProcessDskInfo, ProcessGpuInfo, ProcessInfo, ProcessMemInfo, ProcessNetInfo,
};
use std::path::Path;

/// Clock ticks per second (USER_HZ). Standard value for Linux.
const CLK_TCK: u64 = 100;

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// Process disappeared during collection.
    ProcessGone(u32),
    /// I/O error reading process files.
    Io(std::io::Error),
    /// Parse error in process files.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Collects process information from `/proc/[pid]/` files.
pub struct ProcessCollector<F: FileSystem> {
    fs: F,
    interner: StringInterner,
    proc_path: String,
    page_size: u64,
    /// System boot time (seconds since epoch), used to calculate process start time.
    boot_time: u64,
    /// Whether to read `/proc/[pid]/smaps_rollup` for proportional set size.
    /// Off by default: a full smaps walk per process per cycle is
    /// measurably more expensive than the rest of the collection combined.
    collect_psize: bool,
    /// Whether to read `/proc/[pid]/wchan` for the kernel wait-channel name.
    /// Off by default, same cost tradeoff as `collect_psize`.
    collect_wchan: bool,
}

impl<F: FileSystem> ProcessCollector<F> {
    /// Creates a new process collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            interner: StringInterner::new(),
            proc_path: proc_path.into(),
            page_size: 4096, // Default page size, could be detected
            boot_time: 0,
            collect_psize: false,
            collect_wchan: false,
        }
    }

    /// Enables or disables the `/proc/[pid]/smaps_rollup` read (`--psize`).
    pub fn set_psize(&mut self, enabled: bool) {
        self.collect_psize = enabled;
    }

    /// Enables or disables the `/proc/[pid]/wchan` read (`--wchan`).
    pub fn set_wchan(&mut self, enabled: bool) {
        self.collect_wchan = enabled;
    }

    /// Sets the system boot time for calculating process start times.
    ///
    /// Must be called before `collect_process()` or `collect_all_processes()`
    /// to properly calculate `ProcessInfo.btime`.
    ///
    /// # Arguments
    /// * `boot_time` - System boot time in seconds since epoch (from `/proc/stat` btime)
    pub fn set_boot_time(&mut self, boot_time: u64) {
        self.boot_time = boot_time;
    }

    /// Calculates process start time in seconds since epoch.
    ///
    /// Formula: boot_time + (starttime_jiffies / CLK_TCK)
    ///
    /// Returns 0 if boot_time is not set.
    fn calculate_process_start_time(&self, starttime_jiffies: u64) -> u32 {
        if self.boot_time == 0 {
            return 0;
        }
        (self.boot_time + starttime_jiffies / CLK_TCK) as u32
    }

    /// Returns a reference to the string interner.
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Returns a mutable reference to the string interner.
    pub fn interner_mut(&mut self) -> &mut StringInterner {
        &mut self.interner
    }

    /// Clears the string interner, freeing memory.
    pub fn clear_interner(&mut self) {
        self.interner.clear();
    }

    /// Collects information about a single process.
    pub fn collect_process(&mut self, pid: u32) -> Result<ProcessInfo, CollectError> {
        let proc_dir = format!("{}/{}", self.proc_path, pid);

        // Read /proc/[pid]/stat
        let stat_path = format!("{}/stat", proc_dir);
        let stat_content = self
            .fs
            .read_to_string(Path::new(&stat_path))
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let stat =
            parse_proc_stat(&stat_content).map_err(|e| CollectError::Parse(e.message.clone()))?;

        // Read /proc/[pid]/status
        let status_path = format!("{}/status", proc_dir);
        let status_content = self
            .fs
            .read_to_string(Path::new(&status_path))
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let status = parse_proc_status(&status_content)
            .map_err(|e| CollectError::Parse(e.message.clone()))?;

        // Read /proc/[pid]/io (optional, may fail due to permissions)
        let io_path = format!("{}/io", proc_dir);
        let io = self
            .fs
            .read_to_string(Path::new(&io_path))
            .ok()
            .and_then(|content| parse_proc_io(&content).ok())
            .unwrap_or_default();

        // Read /proc/[pid]/cmdline
        let cmdline_path = format!("{}/cmdline", proc_dir);
        let cmdline = self
            .fs
            .read_to_string(Path::new(&cmdline_path))
            .unwrap_or_default()
            .replace('\0', " ")
            .trim()
            .to_string();

        // Read /proc/[pid]/comm
        let comm_path = format!("{}/comm", proc_dir);
        let comm = self
            .fs
            .read_to_string(Path::new(&comm_path))
            .unwrap_or_else(|_| stat.comm.clone())
            .trim()
            .to_string();

        // Intern strings for deduplication
        let name_hash = self.interner.intern(&comm);
        let cmdline_hash = if cmdline.is_empty() {
            name_hash
        } else {
            self.interner.intern(&cmdline)
        };

        // Convert vsize from bytes to KB
        let vmem = stat.vsize / 1024;
        // Convert rss from pages to KB
        let rmem = (stat.rss.max(0) as u64) * self.page_size / 1024;

        // Read /proc/[pid]/smaps_rollup (falls back to full smaps, summed)
        // for proportional set size, only when asked (--psize): either file
        // may also be unreadable (older kernel, no CONFIG_PROC_PAGE_MONITOR,
        // permissions), in which case this stays 0.
        let pmem = if self.collect_psize {
            let rollup_path = format!("{}/smaps_rollup", proc_dir);
            self.fs
                .read_to_string(Path::new(&rollup_path))
                .or_else(|_| self.fs.read_to_string(Path::new(&format!("{}/smaps", proc_dir))))
                .map(|content| parse_smaps_pss(&content).pss_kb)
                .unwrap_or(0)
        } else {
            0
        };

        // Read /proc/[pid]/wchan: the kernel function name the task is
        // blocked in, or "0"/empty while actually running. Only read when
        // asked (--wchan).
        let wchan_hash = if self.collect_wchan {
            let wchan_path = format!("{}/wchan", proc_dir);
            let wchan = self.fs.read_to_string(Path::new(&wchan_path)).unwrap_or_default();
            let wchan = wchan.trim();
            if wchan.is_empty() || wchan == "0" { 0 } else { self.interner.intern(wchan) }
        } else {
            0
        };

        Ok(ProcessInfo {
            pid: stat.pid,
            tgid: status.tgid,
            isproc: stat.pid == status.tgid,
            vpid: status.vpid,
            ppid: stat.ppid,
            uid: status.uid,
            euid: status.euid,
            gid: status.gid,
            egid: status.egid,
            tty: stat.tty_nr as u16,
            state: stat.state,
            num_threads: stat.num_threads as u32,
            exit_signal: stat.exit_signal,
            btime: self.calculate_process_start_time(stat.starttime),
            name_hash,
            cmdline_hash,
            mem: ProcessMemInfo {
                minflt: stat.minflt,
                majflt: stat.majflt,
                vexec: 0, // Would need to parse /proc/[pid]/maps
                vmem,
                rmem,
                pmem,
                vdata: status.vm_data,
                vstack: status.vm_stk,
                vlibs: status.vm_lib,
                vswap: status.vm_swap,
                vlock: status.vm_lck,
            },
            cpu: ProcessCpuInfo {
                utime: stat.utime,
                stime: stat.stime,
                nice: stat.nice,
                prio: stat.priority,
                rtprio: stat.rt_priority as i32,
                policy: stat.policy as i32,
                curcpu: stat.processor,
                wchan_hash,
                rundelay: 0, // Would need to read /proc/[pid]/schedstat
                blkdelay: stat.delayacct_blkio_ticks,
                nvcsw: status.voluntary_ctxt_switches,
                nivcsw: status.nonvoluntary_ctxt_switches,
            },
            dsk: ProcessDskInfo {
                rio: io.syscr,
                rsz: io.read_bytes,
                rchar: io.rchar,
                wio: io.syscw,
                wsz: io.write_bytes,
                cwsz: io.cancelled_write_bytes,
            },
            exit_code: 0,
            net: ProcessNetInfo::default(),
            gpu: ProcessGpuInfo::default(),
            wasinactive: false,
        })
    }

    /// Collects information about all processes.
    ///
    /// Processes that disappear during collection are silently skipped.
    pub fn collect_all_processes(&mut self) -> Result<Vec<ProcessInfo>, CollectError> {
        let proc_path = Path::new(&self.proc_path);
        let entries = self.fs.read_dir(proc_path)?;

        let mut processes = Vec::new();

        for entry in entries {
            // Check if entry is a PID directory (numeric name)
            if let Some(name) = entry.file_name().and_then(|n| n.to_str())
                && let Ok(pid) = name.parse::<u32>()
            {
                match self.collect_process(pid) {
                    Ok(info) => processes.push(info),
                    Err(CollectError::ProcessGone(_)) => {
                        // Process disappeared, skip it
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(pid, error = %e, "failed to collect process");
                    }
                }
            }
        }

        Ok(processes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_collect_single_process() {
        let fs = MockFs::typical_system();
        let mut collector = ProcessCollector::new(fs, "/proc");

        let info = collector.collect_process(1).unwrap();

        assert_eq!(info.pid, 1);
        assert_eq!(info.ppid, 0);
        assert_eq!(info.uid, 0);
        assert_eq!(info.gid, 0);
    }

    #[test]
    fn test_collect_process_reads_wchan_and_smaps_rollup_when_enabled() {
        let mut fs = MockFs::typical_system();
        fs.add_file("/proc/1/wchan", "do_epoll_wait");
        fs.add_file("/proc/1/smaps_rollup", "Rss:                8192 kB\nPss:                4096 kB\n");
        let mut collector = ProcessCollector::new(fs, "/proc");
        collector.set_psize(true);
        collector.set_wchan(true);

        let info = collector.collect_process(1).unwrap();

        assert_eq!(info.mem.pmem, 4096);
        assert_ne!(info.cpu.wchan_hash, 0);
        assert_eq!(collector.interner().resolve(info.cpu.wchan_hash), Some("do_epoll_wait"));
    }

    #[test]
    fn test_collect_process_skips_wchan_and_smaps_by_default() {
        let mut fs = MockFs::typical_system();
        fs.add_file("/proc/1/wchan", "do_epoll_wait");
        fs.add_file("/proc/1/smaps_rollup", "Pss:                4096 kB\n");
        let mut collector = ProcessCollector::new(fs, "/proc");

        let info = collector.collect_process(1).unwrap();

        assert_eq!(info.mem.pmem, 0);
        assert_eq!(info.cpu.wchan_hash, 0);
    }

    #[test]
    fn test_collect_process_wchan_zero_while_running() {
        let mut fs = MockFs::typical_system();
        fs.add_file("/proc/1/wchan", "0");
        let mut collector = ProcessCollector::new(fs, "/proc");
        collector.set_wchan(true);

        let info = collector.collect_process(1).unwrap();
        assert_eq!(info.cpu.wchan_hash, 0);
    }

    #[test]
    fn test_collect_process_with_special_name() {
        let fs = MockFs::with_special_names();
        let mut collector = ProcessCollector::new(fs, "/proc");

        // Process with spaces in name
        let info = collector.collect_process(5000).unwrap();
        assert_eq!(info.pid, 5000);

        // Verify name was interned
        let name = collector.interner().resolve(info.name_hash);
        assert_eq!(name, Some("Web Content"));
    }

    #[test]
    fn test_collect_all_processes() {
        let fs = MockFs::typical_system();
        let mut collector = ProcessCollector::new(fs, "/proc");

        let processes = collector.collect_all_processes().unwrap();

        // typical_system has 3 processes: 1, 1000, 1001
        assert_eq!(processes.len(), 3);

        // Verify PIDs
        let pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
        assert!(pids.contains(&1));
        assert!(pids.contains(&1000));
        assert!(pids.contains(&1001));
    }

    #[test]
    fn test_collect_process_gone() {
        let mut fs = MockFs::new();
        fs.add_dir("/proc/9999"); // Directory exists but no files

        let mut collector = ProcessCollector::new(fs, "/proc");
        let result = collector.collect_process(9999);

        assert!(matches!(result, Err(CollectError::ProcessGone(9999))));
    }

    #[test]
    fn test_collect_zombie_process() {
        let fs = MockFs::with_zombie_process();
        let mut collector = ProcessCollector::new(fs, "/proc");

        let info = collector.collect_process(4000).unwrap();
        assert_eq!(info.pid, 4000);
        // Zombie processes have minimal info
        assert_eq!(info.mem.vmem, 0);
    }

    #[test]
    fn test_process_btime_without_boot_time() {
        let fs = MockFs::typical_system();
        let mut collector = ProcessCollector::new(fs, "/proc");

        // Without setting boot_time, btime should be 0
        let info = collector.collect_process(1).unwrap();
        assert_eq!(info.btime, 0);
    }

    #[test]
    fn test_process_btime_with_boot_time() {
        let fs = MockFs::typical_system();
        let mut collector = ProcessCollector::new(fs, "/proc");

        // Set boot time (from /proc/stat btime in typical_system mock)
        collector.set_boot_time(1700000000);

        // PID 1 has starttime = 1 jiffy, so btime = 1700000000 + 1/100 = 1700000000
        let info1 = collector.collect_process(1).unwrap();
        assert_eq!(info1.btime, 1700000000);

        // PID 1000 has starttime = 100000 jiffies, so btime = 1700000000 + 100000/100 = 1700001000
        let info1000 = collector.collect_process(1000).unwrap();
        assert_eq!(info1000.btime, 1700001000);
    }
}
