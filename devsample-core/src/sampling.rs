//! The sampling loop: the top-level per-cycle orchestrator tying together
//! collection, deviation, accounting and the raw log into one run.
//!
//! Three trigger sources can start a cycle: the regular interval timer, a
//! manual-trigger signal (`SIGUSR1` — take a sample right now), and a
//! finish-after-next signal (`SIGUSR2` — run one more cycle, then stop
//! cleanly). A signal handler only ever sets a static, async-signal-safe
//! flag; all the real work happens back on the main thread once the loop
//! wakes up and checks it. `SIGINT`/`SIGTERM` request the same clean-stop
//! path as `SIGUSR2` but without waiting for one more cycle first.

use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use nix::sys::signal::{self, SigHandler, Signal};
use tracing::{info, warn};

use crate::accounting::{AccountingReader, MAX_RECORDS_PER_DRAIN};
use crate::collector::{Collector, FileSystem};
use crate::deviation::cgroup::deviate_cgroups;
use crate::deviation::system as sysdev;
use crate::deviation::task::deviate_tasks;
use crate::pdb::TaskDb;
use crate::rawlog::{RecordHeader, RawLogWriter, FLAG_BOOT, FLAG_LAST, FLAG_RAW_ACCT_ACTIVE, FLAG_RAW_CONTAINER_STAT};
use crate::sink::{Command, Cycle, Sink};
use crate::storage::model::{
    CgroupChainEntry, DataBlock, ProcessInfo, SystemCpuInfo, SystemDiskInfo, SystemInterruptInfo, SystemNetInfo,
    SystemNetSnmpInfo, SystemSoftirqInfo, SystemStatInfo, SystemVmstatInfo,
};

static MANUAL_TRIGGER: AtomicBool = AtomicBool::new(false);
static FINISH_AFTER_NEXT: AtomicBool = AtomicBool::new(false);
static CANCELLED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_usr1(_: i32) {
    MANUAL_TRIGGER.store(true, Ordering::SeqCst);
}

extern "C" fn handle_usr2(_: i32) {
    FINISH_AFTER_NEXT.store(true, Ordering::SeqCst);
}

extern "C" fn handle_term(_: i32) {
    CANCELLED.store(true, Ordering::SeqCst);
}

/// Installs the loop's signal handlers. Safe to call once per process.
pub fn install_signal_handlers() -> Result<(), nix::errno::Errno> {
    unsafe {
        signal::signal(Signal::SIGUSR1, SigHandler::Handler(handle_usr1))?;
        signal::signal(Signal::SIGUSR2, SigHandler::Handler(handle_usr2))?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_term))?;
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_term))?;
    }
    Ok(())
}

fn take_manual_trigger() -> bool {
    MANUAL_TRIGGER.swap(false, Ordering::SeqCst)
}

fn take_finish_after_next() -> bool {
    FINISH_AFTER_NEXT.load(Ordering::SeqCst)
}

fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

fn find_block<'a, T>(blocks: &'a [DataBlock], f: impl Fn(&'a DataBlock) -> Option<T>) -> Option<T> {
    blocks.iter().find_map(f)
}

fn processes(blocks: &[DataBlock]) -> Vec<ProcessInfo> {
    find_block(blocks, |b| match b {
        DataBlock::Processes(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn cpus(blocks: &[DataBlock]) -> Vec<SystemCpuInfo> {
    find_block(blocks, |b| match b {
        DataBlock::SystemCpu(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn net(blocks: &[DataBlock]) -> Vec<SystemNetInfo> {
    find_block(blocks, |b| match b {
        DataBlock::SystemNet(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn disks(blocks: &[DataBlock]) -> Vec<SystemDiskInfo> {
    find_block(blocks, |b| match b {
        DataBlock::SystemDisk(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn interrupts(blocks: &[DataBlock]) -> Vec<SystemInterruptInfo> {
    find_block(blocks, |b| match b {
        DataBlock::SystemInterrupts(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn softirqs(blocks: &[DataBlock]) -> Vec<SystemSoftirqInfo> {
    find_block(blocks, |b| match b {
        DataBlock::SystemSoftirqs(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn vmstat(blocks: &[DataBlock]) -> SystemVmstatInfo {
    find_block(blocks, |b| match b {
        DataBlock::SystemVmstat(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn stat(blocks: &[DataBlock]) -> SystemStatInfo {
    find_block(blocks, |b| match b {
        DataBlock::SystemStat(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn netsnmp(blocks: &[DataBlock]) -> SystemNetSnmpInfo {
    find_block(blocks, |b| match b {
        DataBlock::SystemNetSnmp(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn cgroup_chain(blocks: &[DataBlock]) -> Vec<CgroupChainEntry> {
    find_block(blocks, |b| match b {
        DataBlock::CgroupChain(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

fn cgroup_pidlist(blocks: &[DataBlock]) -> Vec<u32> {
    find_block(blocks, |b| match b {
        DataBlock::CgroupPidlist(v) => Some(v.clone()),
        _ => None,
    })
    .unwrap_or_default()
}

/// Drives one run of sampling: collect, deviate, log, hand to sink, repeat.
pub struct SamplingLoop<F: FileSystem + Clone> {
    collector: Collector<F>,
    writer: RawLogWriter,
    accounting: Option<AccountingReader<File>>,
    task_db: TaskDb,
    prev_blocks: Option<Vec<DataBlock>>,
    interval: Duration,
    cycle_count: u64,
    /// Stop cleanly the first cycle that runs after the local date rolls
    /// over, rather than running indefinitely across midnight (`--midnight`).
    stop_at_midnight: bool,
    run_date: Option<NaiveDate>,
}

impl<F: FileSystem + Clone> SamplingLoop<F> {
    pub fn new(collector: Collector<F>, writer: RawLogWriter, accounting: Option<AccountingReader<File>>, interval: Duration) -> Self {
        Self {
            collector,
            writer,
            accounting,
            task_db: TaskDb::new(),
            prev_blocks: None,
            interval,
            cycle_count: 0,
            stop_at_midnight: false,
            run_date: None,
        }
    }

    /// Enables the local-midnight stop guard: the loop exits cleanly the
    /// first time a cycle would run on a different local date than the run
    /// started on.
    pub fn with_midnight_stop(mut self, enabled: bool) -> Self {
        self.stop_at_midnight = enabled;
        self
    }

    /// Runs cycles until the sink requests `Quit`, a finish-after-next
    /// signal is honored, or the process is asked to stop. Blocks the
    /// calling thread for the whole run (this is the daemon's main loop).
    pub fn run(&mut self, sink: &mut dyn Sink) {
        if self.stop_at_midnight {
            self.run_date = Some(Local::now().date_naive());
        }
        loop {
            let cycle_start = Instant::now();

            if self.stop_at_midnight
                && let Some(started) = self.run_date
                && Local::now().date_naive() != started
            {
                info!("sampling: local midnight crossed, stopping");
                break;
            }

            if let Err(e) = self.run_cycle(sink) {
                warn!(error = %e, "sampling: cycle failed");
                if sink.on_error(&e) == Command::Quit {
                    break;
                }
            }

            if is_cancelled() {
                info!("sampling: cancellation requested, stopping");
                break;
            }
            if take_finish_after_next() {
                info!("sampling: finish-after-next honored, stopping after this cycle");
                break;
            }

            let elapsed = cycle_start.elapsed();
            let remaining = self.interval.saturating_sub(elapsed);
            std::thread::sleep(remaining.min(Duration::from_millis(200)));
            while !is_cancelled() && !take_finish_after_next() && !take_manual_trigger() {
                if cycle_start.elapsed() >= self.interval {
                    break;
                }
                std::thread::sleep(Duration::from_millis(200));
            }
        }
        sink.on_end();
    }

    fn run_cycle(&mut self, sink: &mut dyn Sink) -> Result<(), String> {
        let snapshot = self.collector.collect_snapshot().map_err(|e| e.to_string())?;
        let curr_blocks = snapshot.blocks;
        let epoch = snapshot.timestamp;

        let is_boot = self.prev_blocks.is_none();
        let empty: Vec<DataBlock> = Vec::new();
        let prev_blocks = self.prev_blocks.as_ref().unwrap_or(&empty);

        let (cpu_devs, total_cpu_ticks) = sysdev::deviate_cpus(&cpus(prev_blocks), &cpus(&curr_blocks));
        let net_devs = sysdev::deviate_net(&net(prev_blocks), &net(&curr_blocks));
        let disk_devs = sysdev::deviate_disks(&disks(prev_blocks), &disks(&curr_blocks));
        let irq_devs = sysdev::deviate_interrupts(&interrupts(prev_blocks), &interrupts(&curr_blocks));
        let softirq_devs = sysdev::deviate_softirqs(&softirqs(prev_blocks), &softirqs(&curr_blocks));
        let vmstat_dev = sysdev::deviate_vmstat(&vmstat(prev_blocks), &vmstat(&curr_blocks));
        let stat_dev = sysdev::deviate_stat(&stat(prev_blocks), &stat(&curr_blocks));
        let netsnmp_dev = sysdev::deviate_netsnmp(&netsnmp(prev_blocks), &netsnmp(&curr_blocks));

        let exits = match self.accounting.as_mut() {
            Some(reader) => match reader.drain(self.collector.interner_mut(), MAX_RECORDS_PER_DRAIN) {
                Ok(drained) => drained,
                Err(e) => {
                    warn!(error = %e, "accounting: drain failed this cycle, treating as unavailable");
                    self.accounting = None;
                    Default::default()
                }
            },
            None => Default::default(),
        };

        let current_procs = processes(&curr_blocks);
        let task_bundle = deviate_tasks(&mut self.task_db, &current_procs, &exits.records, total_cpu_ticks);

        let curr_cgroups = cgroup_chain(&curr_blocks);
        let cgroup_dev = deviate_cgroups(&cgroup_chain(prev_blocks), &curr_cgroups);
        let pidlist = cgroup_pidlist(&curr_blocks);

        let system_deviation = crate::deviation::SystemDeviation {
            cpus: cpu_devs.clone(),
            net: net_devs.clone(),
            disks: disk_devs.clone(),
            interrupts: irq_devs.clone(),
            softirqs: softirq_devs.clone(),
            vmstat: vmstat_dev.clone(),
            stat: stat_dev.clone(),
            netsnmp: netsnmp_dev.clone(),
            total_cpu_ticks,
        };

        let system_blocks = vec![
            DataBlock::SystemCpu(cpu_devs),
            DataBlock::SystemNet(net_devs),
            DataBlock::SystemDisk(disk_devs),
            DataBlock::SystemInterrupts(irq_devs),
            DataBlock::SystemSoftirqs(softirq_devs),
            DataBlock::SystemVmstat(vmstat_dev),
            DataBlock::SystemStat(stat_dev),
            DataBlock::SystemNetSnmp(netsnmp_dev),
        ];

        let system_bytes = bincode::serialize(&system_blocks).map_err(|e| e.to_string())?;
        let tasks_bytes = bincode::serialize(&task_bundle.all).map_err(|e| e.to_string())?;
        let cgroup_bytes = bincode::serialize(&cgroup_dev.entries).map_err(|e| e.to_string())?;
        let pidlist_bytes = bincode::serialize(&pidlist).map_err(|e| e.to_string())?;

        let mut flags = 0u16;
        if is_boot {
            flags |= FLAG_BOOT;
        }
        if self.accounting.is_some() {
            flags |= FLAG_RAW_ACCT_ACTIVE;
        }
        if !curr_cgroups.is_empty() {
            flags |= FLAG_RAW_CONTAINER_STAT;
        }
        if is_cancelled() {
            flags |= FLAG_LAST;
        }

        let rec = RecordHeader {
            epoch,
            interval: self.interval.as_secs() as u32,
            flags,
            nproc: current_procs.len() as u32,
            ntask: task_bundle.present_idx.len() as u32,
            nrun: task_bundle.totrun,
            nslpi: task_bundle.totslpi,
            nslpu: task_bundle.totslpu,
            nzombie: task_bundle.totzombie,
            nexit: (task_bundle.all.len() - task_bundle.present_idx.len()) as u32,
            nnew: task_bundle
                .all
                .iter()
                .filter(|p| p.exit_code & crate::deviation::task::NEW_TASK_FLAG != 0)
                .count() as u32,
            ncgroups: cgroup_dev.entries.len() as u32,
            ncgpids: pidlist.len() as u32,
            noverflow: exits.noverflow,
            ..Default::default()
        };

        self.writer
            .write_cycle(rec, &system_bytes, &tasks_bytes, &cgroup_bytes, &pidlist_bytes)
            .map_err(|e| e.to_string())?;

        let cycle = Cycle {
            header: &rec,
            system: &system_deviation,
            tasks: &task_bundle,
            cgroups: &cgroup_dev,
        };
        let command = sink.on_sample(&cycle);
        match command {
            Command::Reset => {
                self.task_db.clear();
                self.prev_blocks = None;
            }
            Command::Quit => {
                CANCELLED.store(true, Ordering::SeqCst);
            }
            _ => {}
        }

        self.prev_blocks = Some(curr_blocks);
        self.cycle_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_flags_round_trip() {
        MANUAL_TRIGGER.store(true, Ordering::SeqCst);
        assert!(take_manual_trigger());
        assert!(!take_manual_trigger());
    }
}
