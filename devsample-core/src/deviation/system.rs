//! System-scope deviation: per-CPU, per-interface, per-disk and other
//! system-wide counters, matched across cycles by their stable identity
//! (cpu_id / name_hash / device_hash / irq_hash) rather than by array
//! position, since interfaces and disks can come and go between cycles.

use std::collections::HashMap;

use tracing::info;

use crate::storage::model::{
    SystemCpuInfo, SystemDiskInfo, SystemInterruptInfo, SystemLoadInfo, SystemMemInfo,
    SystemNetInfo, SystemNetSnmpInfo, SystemPsiInfo, SystemSoftirqInfo, SystemStatInfo,
    SystemVmstatInfo,
};

use super::counter_deviation;

/// All system-scope deviations for one cycle. Load/mem/psi-averages/file
/// are gauges and simply carried from the current sample untouched by a
/// caller that already has them — this bundle only holds what's actually
/// deviated.
#[derive(Debug, Default, Clone)]
pub struct SystemDeviation {
    pub cpus: Vec<SystemCpuInfo>,
    pub net: Vec<SystemNetInfo>,
    pub disks: Vec<SystemDiskInfo>,
    pub interrupts: Vec<SystemInterruptInfo>,
    pub softirqs: Vec<SystemSoftirqInfo>,
    pub vmstat: SystemVmstatInfo,
    pub stat: SystemStatInfo,
    pub netsnmp: SystemNetSnmpInfo,
    /// Sum of every per-CPU user+nice+system+irq+softirq+steal deviation
    /// this cycle — the sanity ceiling the task deviation engine clamps
    /// individual task CPU deviations against.
    pub total_cpu_ticks: u64,
}

pub fn deviate_cpus(prev: &[SystemCpuInfo], curr: &[SystemCpuInfo]) -> (Vec<SystemCpuInfo>, u64) {
    let by_id: HashMap<i16, &SystemCpuInfo> = prev.iter().map(|c| (c.cpu_id, c)).collect();
    let mut total = 0u64;
    let out = curr
        .iter()
        .map(|c| {
            let Some(p) = by_id.get(&c.cpu_id) else {
                return c.clone();
            };
            let dev = SystemCpuInfo {
                cpu_id: c.cpu_id,
                user: counter_deviation(c.user, p.user),
                nice: counter_deviation(c.nice, p.nice),
                system: counter_deviation(c.system, p.system),
                idle: counter_deviation(c.idle, p.idle),
                iowait: counter_deviation(c.iowait, p.iowait),
                irq: counter_deviation(c.irq, p.irq),
                softirq: counter_deviation(c.softirq, p.softirq),
                steal: counter_deviation(c.steal, p.steal),
                guest: counter_deviation(c.guest, p.guest),
                guest_nice: counter_deviation(c.guest_nice, p.guest_nice),
            };
            total += dev.user + dev.nice + dev.system + dev.irq + dev.softirq + dev.steal;
            dev
        })
        .collect();
    (out, total)
}

/// Matches interfaces by `name_hash`. An interface present in `curr` with no
/// match in `prev` (renamed, or hot-plugged since last cycle) is reported
/// with its raw counters rather than dropped — there is no baseline to
/// subtract, so the "deviation" for its first appearance is its full value,
/// same convention as a newly observed task.
pub fn deviate_net(prev: &[SystemNetInfo], curr: &[SystemNetInfo]) -> Vec<SystemNetInfo> {
    let by_hash: HashMap<u64, &SystemNetInfo> = prev.iter().map(|n| (n.name_hash, n)).collect();
    curr.iter()
        .map(|c| match by_hash.get(&c.name_hash) {
            Some(p) => SystemNetInfo {
                name: c.name.clone(),
                name_hash: c.name_hash,
                rx_bytes: counter_deviation(c.rx_bytes, p.rx_bytes),
                rx_packets: counter_deviation(c.rx_packets, p.rx_packets),
                rx_errs: counter_deviation(c.rx_errs, p.rx_errs),
                rx_drop: counter_deviation(c.rx_drop, p.rx_drop),
                tx_bytes: counter_deviation(c.tx_bytes, p.tx_bytes),
                tx_packets: counter_deviation(c.tx_packets, p.tx_packets),
                tx_errs: counter_deviation(c.tx_errs, p.tx_errs),
                tx_drop: counter_deviation(c.tx_drop, p.tx_drop),
            },
            None => {
                info!(interface = %c.name, "deviation: interface has no prior baseline, reporting raw counters");
                c.clone()
            }
        })
        .collect()
}

pub fn deviate_disks(prev: &[SystemDiskInfo], curr: &[SystemDiskInfo]) -> Vec<SystemDiskInfo> {
    let by_hash: HashMap<u64, &SystemDiskInfo> = prev.iter().map(|d| (d.device_hash, d)).collect();
    curr.iter()
        .map(|c| match by_hash.get(&c.device_hash) {
            Some(p) => SystemDiskInfo {
                device_name: c.device_name.clone(),
                device_hash: c.device_hash,
                major: c.major,
                minor: c.minor,
                rio: counter_deviation(c.rio, p.rio),
                r_merged: counter_deviation(c.r_merged, p.r_merged),
                rsz: counter_deviation(c.rsz, p.rsz),
                read_time: counter_deviation(c.read_time, p.read_time),
                wio: counter_deviation(c.wio, p.wio),
                w_merged: counter_deviation(c.w_merged, p.w_merged),
                wsz: counter_deviation(c.wsz, p.wsz),
                write_time: counter_deviation(c.write_time, p.write_time),
                io_in_progress: c.io_in_progress,
                io_ms: counter_deviation(c.io_ms, p.io_ms),
                qusz: c.qusz,
            },
            None => c.clone(),
        })
        .collect()
}

pub fn deviate_interrupts(prev: &[SystemInterruptInfo], curr: &[SystemInterruptInfo]) -> Vec<SystemInterruptInfo> {
    let by_hash: HashMap<u64, u64> = prev.iter().map(|i| (i.irq_hash, i.count)).collect();
    curr.iter()
        .map(|c| SystemInterruptInfo {
            irq_hash: c.irq_hash,
            count: match by_hash.get(&c.irq_hash) {
                Some(p) => counter_deviation(c.count, *p),
                None => c.count,
            },
        })
        .collect()
}

pub fn deviate_softirqs(prev: &[SystemSoftirqInfo], curr: &[SystemSoftirqInfo]) -> Vec<SystemSoftirqInfo> {
    let by_hash: HashMap<u64, u64> = prev.iter().map(|s| (s.name_hash, s.count)).collect();
    curr.iter()
        .map(|c| SystemSoftirqInfo {
            name_hash: c.name_hash,
            count: match by_hash.get(&c.name_hash) {
                Some(p) => counter_deviation(c.count, *p),
                None => c.count,
            },
        })
        .collect()
}

pub fn deviate_vmstat(prev: &SystemVmstatInfo, curr: &SystemVmstatInfo) -> SystemVmstatInfo {
    SystemVmstatInfo {
        pgfault: counter_deviation(curr.pgfault, prev.pgfault),
        pgmajfault: counter_deviation(curr.pgmajfault, prev.pgmajfault),
        pgpgin: counter_deviation(curr.pgpgin, prev.pgpgin),
        pgpgout: counter_deviation(curr.pgpgout, prev.pgpgout),
        pswpin: counter_deviation(curr.pswpin, prev.pswpin),
        pswpout: counter_deviation(curr.pswpout, prev.pswpout),
        pgsteal_kswapd: counter_deviation(curr.pgsteal_kswapd, prev.pgsteal_kswapd),
        pgsteal_direct: counter_deviation(curr.pgsteal_direct, prev.pgsteal_direct),
        pgscan_kswapd: counter_deviation(curr.pgscan_kswapd, prev.pgscan_kswapd),
        pgscan_direct: counter_deviation(curr.pgscan_direct, prev.pgscan_direct),
        oom_kill: counter_deviation(curr.oom_kill, prev.oom_kill),
    }
}

pub fn deviate_stat(prev: &SystemStatInfo, curr: &SystemStatInfo) -> SystemStatInfo {
    SystemStatInfo {
        ctxt: counter_deviation(curr.ctxt, prev.ctxt),
        processes: counter_deviation(curr.processes, prev.processes),
        // gauges: copied from current as-is.
        procs_running: curr.procs_running,
        procs_blocked: curr.procs_blocked,
        btime: curr.btime,
    }
}

pub fn deviate_netsnmp(prev: &SystemNetSnmpInfo, curr: &SystemNetSnmpInfo) -> SystemNetSnmpInfo {
    SystemNetSnmpInfo {
        tcp_active_opens: counter_deviation(curr.tcp_active_opens, prev.tcp_active_opens),
        tcp_passive_opens: counter_deviation(curr.tcp_passive_opens, prev.tcp_passive_opens),
        tcp_attempt_fails: counter_deviation(curr.tcp_attempt_fails, prev.tcp_attempt_fails),
        tcp_estab_resets: counter_deviation(curr.tcp_estab_resets, prev.tcp_estab_resets),
        // Currently-established connections is an instantaneous gauge, not
        // cumulative — never deviated.
        tcp_curr_estab: curr.tcp_curr_estab,
        tcp_in_segs: counter_deviation(curr.tcp_in_segs, prev.tcp_in_segs),
        tcp_out_segs: counter_deviation(curr.tcp_out_segs, prev.tcp_out_segs),
        tcp_retrans_segs: counter_deviation(curr.tcp_retrans_segs, prev.tcp_retrans_segs),
        tcp_in_errs: counter_deviation(curr.tcp_in_errs, prev.tcp_in_errs),
        tcp_out_rsts: counter_deviation(curr.tcp_out_rsts, prev.tcp_out_rsts),
        udp_in_datagrams: counter_deviation(curr.udp_in_datagrams, prev.udp_in_datagrams),
        udp_out_datagrams: counter_deviation(curr.udp_out_datagrams, prev.udp_out_datagrams),
        udp_in_errors: counter_deviation(curr.udp_in_errors, prev.udp_in_errors),
        udp_no_ports: counter_deviation(curr.udp_no_ports, prev.udp_no_ports),
        listen_overflows: counter_deviation(curr.listen_overflows, prev.listen_overflows),
        listen_drops: counter_deviation(curr.listen_drops, prev.listen_drops),
        tcp_timeouts: counter_deviation(curr.tcp_timeouts, prev.tcp_timeouts),
        tcp_fast_retrans: counter_deviation(curr.tcp_fast_retrans, prev.tcp_fast_retrans),
        tcp_slow_start_retrans: counter_deviation(curr.tcp_slow_start_retrans, prev.tcp_slow_start_retrans),
        tcp_ofo_queue: curr.tcp_ofo_queue,
        tcp_syn_retrans: counter_deviation(curr.tcp_syn_retrans, prev.tcp_syn_retrans),
    }
}

/// Gauges that never go through the deviation rule, for completeness of the
/// "what's a gauge" documentation — load averages and memory usage are
/// copied from the current sample, never subtracted.
pub fn current_load(curr: &SystemLoadInfo) -> SystemLoadInfo {
    curr.clone()
}

pub fn current_mem(curr: &SystemMemInfo) -> SystemMemInfo {
    curr.clone()
}

pub fn current_psi(curr: &[SystemPsiInfo]) -> Vec<SystemPsiInfo> {
    curr.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_deviation_sums_into_total() {
        let prev = vec![SystemCpuInfo {
            cpu_id: 0,
            user: 100,
            nice: 0,
            system: 50,
            idle: 1000,
            iowait: 0,
            irq: 0,
            softirq: 0,
            steal: 0,
            guest: 0,
            guest_nice: 0,
        }];
        let curr = vec![SystemCpuInfo {
            cpu_id: 0,
            user: 120,
            nice: 0,
            system: 60,
            idle: 1010,
            iowait: 0,
            irq: 0,
            softirq: 0,
            steal: 0,
            guest: 0,
            guest_nice: 0,
        }];
        let (devs, total) = deviate_cpus(&prev, &curr);
        assert_eq!(devs[0].user, 20);
        assert_eq!(devs[0].system, 10);
        assert_eq!(total, 30);
    }

    #[test]
    fn net_interface_without_baseline_reports_raw() {
        let prev: Vec<SystemNetInfo> = vec![];
        let curr = vec![SystemNetInfo {
            name: "eth0".into(),
            name_hash: 1,
            rx_bytes: 500,
            rx_packets: 5,
            rx_errs: 0,
            rx_drop: 0,
            tx_bytes: 200,
            tx_packets: 2,
            tx_errs: 0,
            tx_drop: 0,
        }];
        let out = deviate_net(&prev, &curr);
        assert_eq!(out[0].rx_bytes, 500);
    }

    #[test]
    fn net_interface_wrap_s2() {
        let prev = vec![SystemNetInfo {
            name: "eth0".into(),
            name_hash: 1,
            rx_bytes: 4_294_967_200,
            rx_packets: 0,
            rx_errs: 0,
            rx_drop: 0,
            tx_bytes: 0,
            tx_packets: 0,
            tx_errs: 0,
            tx_drop: 0,
        }];
        let curr = vec![SystemNetInfo {
            rx_bytes: 300,
            ..prev[0].clone()
        }];
        let out = deviate_net(&prev, &curr);
        assert_eq!(out[0].rx_bytes, 396);
    }

    #[test]
    fn tcp_curr_estab_is_never_deviated() {
        let mut prev = SystemNetSnmpInfo::default();
        prev.tcp_curr_estab = 50;
        let mut curr = SystemNetSnmpInfo::default();
        curr.tcp_curr_estab = 12;
        let out = deviate_netsnmp(&prev, &curr);
        assert_eq!(out.tcp_curr_estab, 12);
    }
}
