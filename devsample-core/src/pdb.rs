//! The task database (PDB): identity-stable per-task baselines across cycles.
//!
//! Every present task is keyed by `(pid, isproc, start_time)` — the start
//! time disambiguates PID reuse, since a freshly `fork`+`exec`'d task can be
//! handed the same pid a dead one used moments ago. The database is a hash
//! table by pid (O(1) lookup), plus a per-cycle "residue" list of entries not
//! yet matched this cycle. What's left in the residue after task enumeration
//! is the set of tasks that disappeared between samples, available for
//! [`TaskDb::resolve_exit`] to attribute accounting exit records against.
//!
//! Entries that disappear without ever being claimed by an exit record (no
//! accounting, or the accounting record simply hasn't arrived yet) are kept a
//! while longer in a bounded `orphans` archive, so a pid-reuse case (spec
//! scenario S4) can still be resolved against its pre-reuse identity by a
//! later cycle's exit record.

use std::collections::HashMap;

use tracing::warn;

use crate::storage::model::ProcessInfo;

/// How many orphaned (disappeared-without-exit) entries to keep around for
/// later best-fit exit matching. Bounded so a system that never enables
/// process accounting doesn't leak memory for every task that ever exited.
const MAX_ORPHANS: usize = 4096;

/// Identity key for a task: pid + isproc + start_time. Two tasks are the
/// "same" task, for baseline purposes, iff all three match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub pid: u32,
    pub isproc: bool,
    pub start_time: u32,
}

impl TaskKey {
    pub fn of(info: &ProcessInfo) -> Self {
        Self {
            pid: info.pid,
            isproc: info.isproc,
            start_time: info.btime,
        }
    }
}

/// One persistent PDB entry: the task's last-seen counters, used as the
/// baseline for the next cycle's deviation subtraction.
#[derive(Debug, Clone)]
pub struct PInfo {
    pub baseline: ProcessInfo,
}

impl PInfo {
    fn key(&self) -> TaskKey {
        TaskKey::of(&self.baseline)
    }
}

/// The task database. See module docs for the identity/residue/orphan model.
#[derive(Debug, Default)]
pub struct TaskDb {
    live: HashMap<u32, PInfo>,
    /// Entries not yet matched this cycle; drained by `get` as present tasks
    /// are matched, emptied into `orphans` by `end_cycle`.
    residue: HashMap<u32, PInfo>,
    /// Disappeared-without-exit entries kept for later best-fit resolution,
    /// oldest-first so eviction at `MAX_ORPHANS` drops the stalest first.
    orphans: Vec<PInfo>,
}

impl TaskDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks currently tracked as live (baseline available for
    /// next cycle's subtraction).
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Wipes all state: live baselines, in-flight residue and orphans. Used
    /// when the sampling loop's Sink requests a reset (re-baseline at the
    /// next cycle as if starting fresh).
    pub fn clear(&mut self) {
        self.live.clear();
        self.residue.clear();
        self.orphans.clear();
    }

    /// Moves every current live entry onto the residue list. Must be called
    /// once at the start of every cycle, before any `get`/`insert` call for
    /// that cycle's present tasks.
    pub fn begin_cycle(&mut self) {
        debug_assert!(
            self.residue.is_empty(),
            "end_cycle must run before the next begin_cycle"
        );
        self.residue = std::mem::take(&mut self.live);
    }

    /// Looks up a task by full identity. On match, the entry is removed from
    /// the residue list and promoted back into the live set (with the stale
    /// baseline — callers update it via `insert` once the deviation against
    /// it has been computed).
    pub fn get(&mut self, key: TaskKey) -> Option<PInfo> {
        let entry = self.residue.remove(&key.pid)?;
        if entry.key() == key {
            self.live.insert(key.pid, entry.clone());
            Some(entry)
        } else {
            // Same pid, different identity: leave it in residue for now —
            // it may be claimed later this cycle by an exit record, or it
            // becomes an orphan at end_cycle for pid-reuse resolution.
            self.residue.insert(key.pid, entry);
            None
        }
    }

    /// Records `tstat` as the new baseline for a task, whether it's brand
    /// new or replacing the matched-but-stale entry `get` returned.
    ///
    /// A collision — `live` already holding a *different* identity under
    /// this pid — is not expected in the normal begin_cycle/get/insert
    /// flow (get() already reconciled residue for this pid), but if it
    /// happens the existing entry is archived as an orphan rather than
    /// silently overwritten, per the PDB contract.
    pub fn insert(&mut self, tstat: ProcessInfo) {
        let key = TaskKey::of(&tstat);
        if let Some(old) = self.live.get(&key.pid)
            && old.key() != key
        {
            warn!(pid = key.pid, "pdb: pid reused within live set, archiving prior entry");
            let old = self.live.remove(&key.pid).expect("just checked");
            self.archive_orphan(old);
        }
        self.live.insert(key.pid, PInfo { baseline: tstat });
    }

    /// Resolves an accounting exit record against the residue/orphan sets.
    ///
    /// If `pid` is known, an exact match by pid is attempted first (in the
    /// residue list, then in the orphan archive). Otherwise — older kernels
    /// can emit accounting records without a usable pid — a best-fit search
    /// over the residue list by `(name_hash, start_time)` is used, falling
    /// back to the orphan archive. A matched entry is consumed (removed).
    pub fn resolve_exit(&mut self, pid: Option<u32>, name_hash: u64, start_time: u32) -> Option<PInfo> {
        if let Some(pid) = pid {
            if let Some(entry) = self.residue.remove(&pid) {
                return Some(entry);
            }
            if let Some(idx) = self.orphans.iter().position(|o| o.baseline.pid == pid) {
                return Some(self.orphans.remove(idx));
            }
        }

        // Best-fit: prefer an exact (name, start_time) match in the residue
        // list, then the same in the orphan archive.
        if let Some(pid) = self
            .residue
            .values()
            .find(|e| e.baseline.name_hash == name_hash && e.baseline.btime == start_time)
            .map(|e| e.baseline.pid)
        {
            return self.residue.remove(&pid);
        }
        if let Some(idx) = self
            .orphans
            .iter()
            .position(|o| o.baseline.name_hash == name_hash && o.baseline.btime == start_time)
        {
            return Some(self.orphans.remove(idx));
        }

        None
    }

    /// Discards whatever remains in the residue list at the end of a cycle,
    /// archiving each entry as an orphan (available for a future cycle's
    /// `resolve_exit` best-fit match) rather than dropping it outright.
    pub fn end_cycle(&mut self) {
        for (_, entry) in self.residue.drain() {
            self.archive_orphan(entry);
        }
    }

    fn archive_orphan(&mut self, entry: PInfo) {
        self.orphans.push(entry);
        if self.orphans.len() > MAX_ORPHANS {
            let overflow = self.orphans.len() - MAX_ORPHANS;
            self.orphans.drain(0..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(pid: u32, btime: u32, name_hash: u64) -> ProcessInfo {
        ProcessInfo {
            pid,
            tgid: pid,
            isproc: true,
            btime,
            name_hash,
            ..Default::default()
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut db = TaskDb::new();
        db.begin_cycle();
        assert!(db.get(TaskKey::of(&task(42, 100, 1))).is_none());
        db.insert(task(42, 100, 1));
        db.end_cycle();

        db.begin_cycle();
        let got = db.get(TaskKey {
            pid: 42,
            isproc: true,
            start_time: 100,
        });
        assert!(got.is_some());
        assert_eq!(got.unwrap().baseline.pid, 42);
    }

    #[test]
    fn pid_reuse_does_not_match_old_identity() {
        let mut db = TaskDb::new();
        db.begin_cycle();
        db.insert(task(11, 1000, 1)); // cmd "a"
        db.end_cycle();

        // Cycle B: same pid, different start_time (reused, cmd "b")
        db.begin_cycle();
        let key_b = TaskKey {
            pid: 11,
            isproc: true,
            start_time: 2000,
        };
        assert!(db.get(key_b).is_none(), "must not match stale identity");
        db.insert(task(11, 2000, 2));
        db.end_cycle();

        // The old (pid=11, start_time=1000) entry is archived for later
        // exit resolution.
        let resolved = db.resolve_exit(Some(11).filter(|_| false), 1, 1000);
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().baseline.btime, 1000);
    }

    #[test]
    fn resolve_exit_by_known_pid() {
        let mut db = TaskDb::new();
        db.begin_cycle();
        db.insert(task(7, 500, 9));
        db.end_cycle();

        db.begin_cycle(); // task disappeared: never matched via get()
        let resolved = db.resolve_exit(Some(7), 9, 500);
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().baseline.pid, 7);
        db.end_cycle();

        assert!(db.residue.is_empty());
    }

    #[test]
    fn clear_wipes_all_state() {
        let mut db = TaskDb::new();
        db.begin_cycle();
        db.insert(task(1, 1, 1));
        db.end_cycle();
        assert_eq!(db.len(), 1);
        db.clear();
        assert_eq!(db.len(), 0);
    }
}
