//! Task-scope deviation: turns a raw process list plus accounting exit
//! records into a bundle of per-task counter deviations against the task
//! database's baselines.
//!
//! Every task produced by the collector is a process-level entry (the
//! collector enumerates `/proc/[pid]` only, not `/proc/[pid]/task/[tid]`),
//! so `isproc` is always true here and the "promote a process whose only
//! active child is a thread" rule has nothing to do at this granularity —
//! recorded as a scope decision in the design ledger rather than implemented
//! as dead code.

use crate::accounting::ExitRecord;
use crate::pdb::{TaskDb, TaskKey};
use crate::storage::model::ProcessInfo;

use super::counter_deviation;

/// Set on `ProcessInfo::exit_code` for a task observed for the first time
/// this cycle (no prior baseline to subtract against, so its full counters
/// are reported as the deviation). See seed scenario S1.
pub const NEW_TASK_FLAG: i32 = 1 << 16;

/// The deviation bundle for one cycle: every task's deviated counters plus
/// the indices and running totals the sampling loop and sinks need without
/// re-scanning `all`.
#[derive(Debug, Default, Clone)]
pub struct TaskDeviationBundle {
    /// Deviated records for every task touched this cycle: present tasks
    /// (running, sleeping, new), plus any task resolved against an
    /// accounting exit record (`state == 'E'`).
    pub all: Vec<ProcessInfo>,
    /// Indices into `all` of tasks still present (not exited) this cycle.
    /// Every collected entry is a process (the collector never enumerates
    /// `/proc/[pid]/task/[tid]`), so this doubles as the "all processes"
    /// index alongside `all` doubling as "all tasks" — see the module docs.
    pub present_idx: Vec<usize>,
    /// Indices into `all` of tasks that are present *and* non-idle this
    /// cycle: `!wasinactive`, i.e. at least one counter genuinely moved
    /// against the task's baseline (a byte-for-byte match means the task
    /// never ran, bar a few non-deviated gauges).
    pub active_idx: Vec<usize>,
    pub totrun: u32,
    pub totslpi: u32,
    pub totslpu: u32,
    pub totzombie: u32,
}

/// Runs one cycle of task deviation: matches `current` against `db`'s
/// baselines, resolves `exits` against whatever's left unmatched, and
/// replaces `db`'s baselines with `current` for next cycle.
///
/// `system_cpu_deviation` is this cycle's system-wide CPU tick deviation
/// (sum across all CPUs); any single task whose own CPU deviation exceeds
/// it is clamped to 1 tick rather than dropped, per the sanity-clamp design
/// decision — a single task cannot legitimately have burned more CPU this
/// cycle than the whole system did.
pub fn deviate_tasks(
    db: &mut TaskDb,
    current: &[ProcessInfo],
    exits: &[ExitRecord],
    system_cpu_deviation: u64,
) -> TaskDeviationBundle {
    let mut bundle = TaskDeviationBundle::default();

    db.begin_cycle();

    for curr in current {
        let key = TaskKey::of(curr);
        let prev_baseline = db.get(key).map(|prev| prev.baseline.clone());
        let mut deviated = curr.clone();

        match &prev_baseline {
            Some(baseline) => {
                apply_task_deviation(&mut deviated, curr, baseline, system_cpu_deviation);
                deviated.wasinactive = curr == baseline;
            }
            None => {
                // First sighting: no baseline, so the whole counter value
                // is reported as this cycle's deviation. A task seen for
                // the first time is never idle.
                deviated.exit_code = curr.exit_code | NEW_TASK_FLAG;
                deviated.wasinactive = false;
            }
        }

        let idx = bundle.all.len();
        match deviated.state {
            'R' => bundle.totrun += 1,
            'D' => bundle.totslpu += 1,
            'Z' => bundle.totzombie += 1,
            _ => bundle.totslpi += 1,
        }
        bundle.present_idx.push(idx);
        if !deviated.wasinactive {
            bundle.active_idx.push(idx);
        }
        bundle.all.push(deviated);

        db.insert(curr.clone());
    }

    db.end_cycle();

    for exit in exits {
        if let Some(prev) = db.resolve_exit(exit.pid, exit.name_hash, exit.start_time) {
            let baseline = &prev.baseline;
            // Only state, exit code, CPU time, faults and I/O bytes are
            // derivable from an accounting exit record; every other counter
            // has no current sample to deviate against and stays zero
            // rather than leaking the task's last absolute baseline reading.
            let mut record = ProcessInfo {
                pid: baseline.pid,
                tgid: baseline.tgid,
                isproc: baseline.isproc,
                vpid: baseline.vpid,
                ppid: baseline.ppid,
                uid: baseline.uid,
                euid: baseline.euid,
                gid: baseline.gid,
                egid: baseline.egid,
                tty: baseline.tty,
                btime: baseline.btime,
                name_hash: baseline.name_hash,
                cmdline_hash: baseline.cmdline_hash,
                state: 'E',
                exit_code: exit.exit_code,
                ..Default::default()
            };
            record.cpu.utime = clamp_to_system(counter_deviation(exit.utime_ticks, baseline.cpu.utime), system_cpu_deviation);
            record.cpu.stime = counter_deviation(exit.stime_ticks, baseline.cpu.stime);
            record.mem.minflt = counter_deviation(exit.minflt, baseline.mem.minflt);
            record.mem.majflt = counter_deviation(exit.majflt, baseline.mem.majflt);
            record.dsk.rchar = counter_deviation(exit.io_kb, baseline.dsk.rchar);
            bundle.all.push(record);
        }
    }

    bundle
}

fn apply_task_deviation(deviated: &mut ProcessInfo, curr: &ProcessInfo, prev: &ProcessInfo, system_cpu_deviation: u64) {
    let utime_dev = counter_deviation(curr.cpu.utime, prev.cpu.utime);
    let stime_dev = counter_deviation(curr.cpu.stime, prev.cpu.stime);

    if utime_dev + stime_dev > system_cpu_deviation {
        deviated.cpu.utime = 1;
        deviated.cpu.stime = 0;
    } else {
        deviated.cpu.utime = utime_dev;
        deviated.cpu.stime = stime_dev;
    }

    deviated.cpu.nvcsw = counter_deviation(curr.cpu.nvcsw, prev.cpu.nvcsw);
    deviated.cpu.nivcsw = counter_deviation(curr.cpu.nivcsw, prev.cpu.nivcsw);
    deviated.cpu.rundelay = counter_deviation(curr.cpu.rundelay, prev.cpu.rundelay);
    deviated.cpu.blkdelay = counter_deviation(curr.cpu.blkdelay, prev.cpu.blkdelay);
    // nice/prio/rtprio/policy/curcpu/wchan_hash are gauges: already copied
    // as-is via `curr.clone()` in the caller.

    deviated.mem.minflt = counter_deviation(curr.mem.minflt, prev.mem.minflt);
    deviated.mem.majflt = counter_deviation(curr.mem.majflt, prev.mem.majflt);

    deviated.dsk.rio = counter_deviation(curr.dsk.rio, prev.dsk.rio);
    deviated.dsk.rsz = counter_deviation(curr.dsk.rsz, prev.dsk.rsz);
    deviated.dsk.rchar = counter_deviation(curr.dsk.rchar, prev.dsk.rchar);
    deviated.dsk.wio = counter_deviation(curr.dsk.wio, prev.dsk.wio);
    deviated.dsk.wchar = counter_deviation(curr.dsk.wchar, prev.dsk.wchar);
    deviated.dsk.wsz = counter_deviation(curr.dsk.wsz, prev.dsk.wsz);
    deviated.dsk.cwsz = counter_deviation(curr.dsk.cwsz, prev.dsk.cwsz);

    // net/gpu fields are always zero at this scope (no daemon assumed); left
    // as whatever `curr.clone()` already carried (zero).
}

fn clamp_to_system(task_dev: u64, system_dev: u64) -> u64 {
    if task_dev > system_dev { 1 } else { task_dev }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(pid: u32, btime: u32, state: char, utime: u64, stime: u64) -> ProcessInfo {
        ProcessInfo {
            pid,
            tgid: pid,
            isproc: true,
            btime,
            state,
            cpu: crate::storage::model::ProcessCpuInfo {
                utime,
                stime,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn byte_identical_task_is_marked_inactive_and_excluded_from_active_idx() {
        let mut db = TaskDb::new();
        let cycle1 = vec![proc(10, 1, 'S', 50, 5)];
        deviate_tasks(&mut db, &cycle1, &[], 1000);

        // Second cycle: identical raw sample, nothing moved.
        let cycle2 = vec![proc(10, 1, 'S', 50, 5)];
        let bundle = deviate_tasks(&mut db, &cycle2, &[], 1000);

        assert!(bundle.all[0].wasinactive);
        assert_eq!(bundle.present_idx, vec![0], "still present this cycle");
        assert!(bundle.active_idx.is_empty(), "unchanged task must not count as active");
    }

    #[test]
    fn task_with_moved_counters_is_active() {
        let mut db = TaskDb::new();
        let cycle1 = vec![proc(10, 1, 'S', 50, 5)];
        deviate_tasks(&mut db, &cycle1, &[], 1000);

        let cycle2 = vec![proc(10, 1, 'S', 55, 5)];
        let bundle = deviate_tasks(&mut db, &cycle2, &[], 1000);

        assert!(!bundle.all[0].wasinactive);
        assert_eq!(bundle.active_idx, vec![0]);
    }

    #[test]
    fn first_sighting_is_flagged_new() {
        let mut db = TaskDb::new();
        let current = vec![proc(10, 1, 'R', 50, 5)];
        let bundle = deviate_tasks(&mut db, &current, &[], 1000);

        assert_eq!(bundle.all.len(), 1);
        assert_eq!(bundle.all[0].exit_code & NEW_TASK_FLAG, NEW_TASK_FLAG);
        assert_eq!(bundle.totrun, 1);
    }

    #[test]
    fn second_cycle_deviates_against_baseline() {
        let mut db = TaskDb::new();
        let cycle1 = vec![proc(10, 1, 'R', 50, 5)];
        deviate_tasks(&mut db, &cycle1, &[], 1000);

        let cycle2 = vec![proc(10, 1, 'R', 70, 9)];
        let bundle = deviate_tasks(&mut db, &cycle2, &[], 1000);

        assert_eq!(bundle.all[0].cpu.utime, 20);
        assert_eq!(bundle.all[0].cpu.stime, 4);
        assert_eq!(bundle.all[0].exit_code & NEW_TASK_FLAG, 0);
    }

    #[test]
    fn task_cpu_deviation_clamped_to_one_tick_not_dropped() {
        let mut db = TaskDb::new();
        let cycle1 = vec![proc(10, 1, 'R', 0, 0)];
        deviate_tasks(&mut db, &cycle1, &[], 1000);

        // Implausible: task alone burned 5000 ticks but system only moved 10.
        let cycle2 = vec![proc(10, 1, 'R', 5000, 0)];
        let bundle = deviate_tasks(&mut db, &cycle2, &[], 10);

        assert_eq!(bundle.all.len(), 1, "record must be clamped, never dropped");
        assert_eq!(bundle.all[0].cpu.utime, 1);
        assert_eq!(bundle.all[0].cpu.stime, 0);
    }

    #[test]
    fn exit_record_does_not_leak_baseline_gauges() {
        let mut db = TaskDb::new();
        let mut cycle1 = proc(7, 500, 'R', 100, 0);
        cycle1.mem.vmem = 170_000;
        cycle1.mem.rmem = 40_000;
        cycle1.dsk.wsz = 9_000;
        deviate_tasks(&mut db, std::slice::from_ref(&cycle1), &[], 1000);

        let exit = ExitRecord {
            pid: Some(7),
            ppid: 1,
            uid: 0,
            gid: 0,
            start_time: 500,
            name_hash: 0,
            exit_code: 0,
            utime_ticks: 100,
            stime_ticks: 0,
            minflt: 0,
            majflt: 0,
            io_kb: 0,
        };
        let bundle = deviate_tasks(&mut db, &[], std::slice::from_ref(&exit), 1000);

        assert_eq!(bundle.all.len(), 1);
        assert_eq!(bundle.all[0].mem.vmem, 0, "must not leak the baseline's absolute vsize");
        assert_eq!(bundle.all[0].mem.rmem, 0);
        assert_eq!(bundle.all[0].dsk.wsz, 0);
        assert_eq!(bundle.all[0].pid, 7, "identity fields still carry forward");
    }

    #[test]
    fn exit_record_resolves_against_disappeared_task_s3() {
        let mut db = TaskDb::new();
        let cycle1 = vec![proc(7, 500, 'R', 100, 0)];
        deviate_tasks(&mut db, &cycle1, &[], 1000);

        let exit = ExitRecord {
            pid: Some(7),
            ppid: 1,
            uid: 0,
            gid: 0,
            start_time: 500,
            name_hash: 0,
            exit_code: 9 + 256,
            utime_ticks: 150,
            stime_ticks: 0,
            minflt: 0,
            majflt: 0,
            io_kb: 0,
        };
        let bundle = deviate_tasks(&mut db, &[], std::slice::from_ref(&exit), 1000);

        assert_eq!(bundle.all.len(), 1);
        assert_eq!(bundle.all[0].state, 'E');
        assert_eq!(bundle.all[0].exit_code, 9 + 256);
        assert_eq!(bundle.all[0].cpu.utime, 50);
    }
}
