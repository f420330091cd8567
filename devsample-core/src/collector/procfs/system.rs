//! Collector for system-wide (not per-process) `/proc` counter sources.

use std::collections::HashSet;
use std::path::Path;

use crate::collector::procfs::parser::{
    self, ParseError, parse_diskstats, parse_file_nr, parse_global_stat, parse_inode_state,
    parse_loadavg, parse_meminfo, parse_mountinfo_device_ids, parse_net_dev, parse_net_snmp,
    parse_netstat, parse_psi,
};
use crate::collector::traits::FileSystem;
use crate::storage::interner::StringInterner;
use crate::storage::model::{
    SystemCpuInfo, SystemDiskInfo, SystemFileInfo, SystemInterruptInfo, SystemLoadInfo,
    SystemMemInfo, SystemNetInfo, SystemNetSnmpInfo, SystemPsiInfo, SystemSoftirqInfo,
    SystemStatInfo, SystemVmstatInfo,
};

/// Collects system-wide metrics from `/proc`.
pub struct SystemCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> SystemCollector<F> {
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    fn read(&self, rel: &str) -> std::io::Result<String> {
        self.fs.read_to_string(Path::new(&format!(
            "{}/{}",
            self.proc_path.trim_end_matches('/'),
            rel
        )))
    }

    /// Global stat: per-CPU jiffies plus the non-CPU counters (ctxt, btime, ...).
    pub fn collect_stat(&self) -> Result<SystemStatInfo, ParseError> {
        let content = self
            .read("stat")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let stat = parse_global_stat(&content)?;
        Ok(SystemStatInfo {
            ctxt: stat.ctxt,
            processes: stat.processes,
            procs_running: stat.procs_running,
            procs_blocked: stat.procs_blocked,
            btime: stat.btime,
        })
    }

    /// Per-CPU (and aggregate) jiffy breakdown, also from `/proc/stat`.
    pub fn collect_cpuinfo(&self) -> Result<Vec<SystemCpuInfo>, ParseError> {
        let content = self
            .read("stat")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let stat = parse_global_stat(&content)?;
        Ok(stat
            .cpus
            .into_iter()
            .map(|c| SystemCpuInfo {
                cpu_id: c.cpu_id.map(|id| id as i16).unwrap_or(-1),
                user: c.user,
                nice: c.nice,
                system: c.system,
                idle: c.idle,
                iowait: c.iowait,
                irq: c.irq,
                softirq: c.softirq,
                steal: c.steal,
                guest: c.guest,
                guest_nice: c.guest_nice,
            })
            .collect())
    }

    pub fn collect_meminfo(&self) -> Result<SystemMemInfo, ParseError> {
        let content = self
            .read("meminfo")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let mem = parse_meminfo(&content)?;
        Ok(SystemMemInfo {
            total: mem.mem_total,
            free: mem.mem_free,
            available: mem.mem_available,
            buffers: mem.buffers,
            cached: mem.cached,
            slab: mem.slab,
            sreclaimable: mem.s_reclaimable,
            sunreclaim: mem.slab.saturating_sub(mem.s_reclaimable),
            swap_total: mem.swap_total,
            swap_free: mem.swap_free,
            dirty: mem.dirty,
            writeback: mem.writeback,
        })
    }

    pub fn collect_loadavg(&self) -> Result<SystemLoadInfo, ParseError> {
        let content = self
            .read("loadavg")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let load = parse_loadavg(&content)?;
        Ok(SystemLoadInfo {
            lavg1: load.load1 as f32,
            lavg5: load.load5 as f32,
            lavg15: load.load15 as f32,
            nr_running: load.running,
            nr_threads: load.total,
        })
    }

    /// Block device IDs currently mounted in this mount namespace, used to
    /// filter `/proc/diskstats` down to devices relevant inside a container.
    pub fn collect_mountinfo_device_ids(&self) -> Result<HashSet<(u32, u32)>, ParseError> {
        let content = self
            .read("self/mountinfo")
            .map_err(|e| ParseError::new(e.to_string()))?;
        Ok(parse_mountinfo_device_ids(&content))
    }

    pub fn collect_diskstats(
        &self,
        interner: &mut StringInterner,
    ) -> Result<Vec<SystemDiskInfo>, ParseError> {
        self.collect_diskstats_filtered(interner, None)
    }

    pub fn collect_diskstats_with_mountinfo_filter(
        &self,
        interner: &mut StringInterner,
        mount_devices: &HashSet<(u32, u32)>,
    ) -> Result<Vec<SystemDiskInfo>, ParseError> {
        self.collect_diskstats_filtered(interner, Some(mount_devices))
    }

    fn collect_diskstats_filtered(
        &self,
        interner: &mut StringInterner,
        filter: Option<&HashSet<(u32, u32)>>,
    ) -> Result<Vec<SystemDiskInfo>, ParseError> {
        let content = self
            .read("diskstats")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let disks = parse_diskstats(&content)?;
        Ok(disks
            .into_iter()
            .filter(|d| filter.is_none_or(|f| f.contains(&(d.major, d.minor))))
            .map(|d| SystemDiskInfo {
                device_hash: interner.intern(&d.device),
                device_name: d.device,
                major: d.major,
                minor: d.minor,
                rio: d.reads,
                r_merged: d.r_merged,
                rsz: d.read_sectors,
                read_time: d.read_time,
                wio: d.writes,
                w_merged: d.w_merged,
                wsz: d.write_sectors,
                write_time: d.write_time,
                io_in_progress: d.io_in_progress,
                io_ms: d.io_time,
                qusz: d.io_weighted_time,
            })
            .collect())
    }

    pub fn collect_net_dev(
        &self,
        interner: &mut StringInterner,
    ) -> Result<Vec<SystemNetInfo>, ParseError> {
        let content = self
            .read("net/dev")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let devs = parse_net_dev(&content)?;
        Ok(devs
            .into_iter()
            .map(|d| SystemNetInfo {
                name_hash: interner.intern(&d.interface),
                name: d.interface,
                rx_bytes: d.rx_bytes,
                rx_packets: d.rx_packets,
                rx_errs: d.rx_errs,
                rx_drop: d.rx_drop,
                tx_bytes: d.tx_bytes,
                tx_packets: d.tx_packets,
                tx_errs: d.tx_errs,
                tx_drop: d.tx_drop,
            })
            .collect())
    }

    /// Reads whichever of `/proc/pressure/{cpu,memory,io}` exist. Older
    /// kernels without PSI support simply have none of the three files.
    pub fn collect_psi(&self) -> Result<Vec<SystemPsiInfo>, ParseError> {
        let mut out = Vec::new();
        for (resource, name) in [(0u8, "cpu"), (1u8, "memory"), (2u8, "io")] {
            let Ok(content) = self.read(&format!("pressure/{name}")) else {
                continue;
            };
            let psi = parse_psi(&content)?;
            out.push(SystemPsiInfo {
                resource,
                some_avg10: psi.some_avg10,
                some_avg60: psi.some_avg60,
                some_avg300: psi.some_avg300,
                some_total: psi.some_total,
                full_avg10: psi.full_avg10,
                full_avg60: psi.full_avg60,
                full_avg300: psi.full_avg300,
                full_total: psi.full_total,
            });
        }
        Ok(out)
    }

    pub fn collect_vmstat(&self) -> Result<SystemVmstatInfo, ParseError> {
        let content = self
            .read("vmstat")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let v = parser::parse_vmstat(&content)?;
        Ok(SystemVmstatInfo {
            pgfault: v.pgfault,
            pgmajfault: v.pgmajfault,
            pgpgin: v.pgpgin,
            pgpgout: v.pgpgout,
            pswpin: v.pswpin,
            pswpout: v.pswpout,
            pgsteal_kswapd: v.pgsteal_kswapd,
            pgsteal_direct: v.pgsteal_direct,
            pgscan_kswapd: v.pgscan_kswapd,
            pgscan_direct: v.pgscan_direct,
            oom_kill: v.oom_kill,
        })
    }

    pub fn collect_netsnmp(&self) -> Result<SystemNetSnmpInfo, ParseError> {
        let snmp_content = self
            .read("net/snmp")
            .map_err(|e| ParseError::new(e.to_string()))?;
        let snmp = parse_net_snmp(&snmp_content)?;
        let netstat = self
            .read("net/netstat")
            .ok()
            .and_then(|c| parse_netstat(&c).ok())
            .unwrap_or_default();

        Ok(SystemNetSnmpInfo {
            tcp_active_opens: snmp.tcp_active_opens,
            tcp_passive_opens: snmp.tcp_passive_opens,
            tcp_attempt_fails: snmp.tcp_attempt_fails,
            tcp_estab_resets: snmp.tcp_estab_resets,
            tcp_curr_estab: snmp.tcp_curr_estab,
            tcp_in_segs: snmp.tcp_in_segs,
            tcp_out_segs: snmp.tcp_out_segs,
            tcp_retrans_segs: snmp.tcp_retrans_segs,
            tcp_in_errs: snmp.tcp_in_errs,
            tcp_out_rsts: snmp.tcp_out_rsts,
            udp_in_datagrams: snmp.udp_in_datagrams,
            udp_out_datagrams: snmp.udp_out_datagrams,
            udp_in_errors: snmp.udp_in_errors,
            udp_no_ports: snmp.udp_no_ports,
            listen_overflows: netstat.listen_overflows,
            listen_drops: netstat.listen_drops,
            tcp_timeouts: netstat.tcp_timeouts,
            tcp_fast_retrans: netstat.tcp_fast_retrans,
            tcp_slow_start_retrans: netstat.tcp_slow_start_retrans,
            tcp_ofo_queue: netstat.tcp_ofo_queue,
            tcp_syn_retrans: netstat.tcp_syn_retrans,
        })
    }

    pub fn collect_file(&self) -> Result<SystemFileInfo, ParseError> {
        let file_nr = self
            .read("sys/fs/file-nr")
            .map(|c| parse_file_nr(&c))
            .unwrap_or_default();
        let inode_state = self
            .read("sys/fs/inode-state")
            .map(|c| parse_inode_state(&c))
            .unwrap_or_default();
        Ok(SystemFileInfo {
            nr_file: file_nr.nr_file,
            nr_free_file: file_nr.nr_free_file,
            max_file: file_nr.max_file,
            nr_inode: inode_state.nr_inode,
            nr_free_inode: inode_state.nr_free_inode,
        })
    }

    pub fn collect_interrupts(
        &self,
        interner: &mut StringInterner,
    ) -> Result<Vec<SystemInterruptInfo>, ParseError> {
        let content = self
            .read("interrupts")
            .map_err(|e| ParseError::new(e.to_string()))?;
        Ok(parser::parse_interrupts(&content)
            .into_iter()
            .map(|row| SystemInterruptInfo {
                irq_hash: interner.intern(&row.name),
                count: row.count,
            })
            .collect())
    }

    pub fn collect_softirqs(
        &self,
        interner: &mut StringInterner,
    ) -> Result<Vec<SystemSoftirqInfo>, ParseError> {
        let content = self
            .read("softirqs")
            .map_err(|e| ParseError::new(e.to_string()))?;
        Ok(parser::parse_softirqs(&content)
            .into_iter()
            .map(|row| SystemSoftirqInfo {
                name_hash: interner.intern(&row.name),
                count: row.count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn collects_stat_and_cpuinfo() {
        let fs = MockFs::typical_system();
        let collector = SystemCollector::new(fs, "/proc");

        let stat = collector.collect_stat().unwrap();
        assert!(stat.btime > 0);

        let cpus = collector.collect_cpuinfo().unwrap();
        assert!(!cpus.is_empty());
        assert!(cpus.iter().any(|c| c.cpu_id == -1));
    }

    #[test]
    fn collects_meminfo() {
        let fs = MockFs::typical_system();
        let collector = SystemCollector::new(fs, "/proc");
        let mem = collector.collect_meminfo().unwrap();
        assert!(mem.total > 0);
    }

    #[test]
    fn collects_loadavg() {
        let fs = MockFs::typical_system();
        let collector = SystemCollector::new(fs, "/proc");
        let load = collector.collect_loadavg().unwrap();
        assert!(load.nr_threads >= load.nr_running);
    }

    #[test]
    fn missing_psi_files_return_empty() {
        let fs = MockFs::typical_system();
        let collector = SystemCollector::new(fs, "/proc");
        let psi = collector.collect_psi().unwrap();
        assert!(psi.is_empty());
    }

    #[test]
    fn missing_interrupts_file_is_an_error() {
        let fs = MockFs::typical_system();
        let collector = SystemCollector::new(fs, "/proc");
        let mut interner = StringInterner::new();
        assert!(collector.collect_interrupts(&mut interner).is_err());
    }
}
