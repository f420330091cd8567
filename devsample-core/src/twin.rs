//! Twin-mode: runs the sampling writer and an interactive follow-along
//! reader as two processes sharing one append-only raw log file, so a live
//! view never blocks (or is blocked by) the writer taking its next sample.
//!
//! The writer is the child of a `fork()`; the parent becomes the reader and
//! waits for the writer to append a cycle via filesystem change
//! notification (the `notify` crate) instead of polling the file size in a
//! busy loop.

use std::os::fd::AsRawFd;
use std::path::Path;
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::Duration;

use nix::unistd::{ForkResult, Pid, fork};
use notify::{EventKind, RecursiveMode, Watcher};
use tracing::info;

use crate::rawlog::{HEADER_LEN, RawLogReader};

#[derive(Debug)]
pub enum TwinError {
    Fork(nix::errno::Errno),
    Watch(notify::Error),
    /// A structural precondition for twin mode wasn't met — these are
    /// usage errors, not runtime failures.
    Prerequisite(String),
}

impl std::fmt::Display for TwinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TwinError::Fork(e) => write!(f, "fork failed: {e}"),
            TwinError::Watch(e) => write!(f, "file watch failed: {e}"),
            TwinError::Prerequisite(m) => write!(f, "twin mode prerequisite not met: {m}"),
        }
    }
}

impl std::error::Error for TwinError {}

/// Which half of the twin this process became after `spawn`.
pub enum TwinRole {
    /// This process is the child: run the sampling loop and write the log.
    Writer,
    /// This process is the parent: follow the log the child is writing.
    /// Carries the writer's pid so the reader can terminate it on exit.
    Reader(Pid, RawLogReader),
}

const MAX_LOG_PATH_LEN: usize = 4096;

/// Checks the preconditions twin mode requires before attempting to fork:
/// it cannot be combined with replaying an already-finished log, and the
/// parent's live view only makes sense with an interactive terminal to draw
/// it on.
pub fn check_prerequisites(log_path: &Path, reading_existing_log: bool) -> Result<(), TwinError> {
    if reading_existing_log {
        return Err(TwinError::Prerequisite(
            "twin mode cannot be combined with reading from an existing log".into(),
        ));
    }
    if log_path.as_os_str().len() > MAX_LOG_PATH_LEN {
        return Err(TwinError::Prerequisite("raw log path exceeds the maximum length".into()));
    }
    if !stdout_is_terminal() {
        return Err(TwinError::Prerequisite(
            "twin mode requires an interactive terminal on stdout".into(),
        ));
    }
    Ok(())
}

fn stdout_is_terminal() -> bool {
    nix::unistd::isatty(std::io::stdout().as_raw_fd()).unwrap_or(false)
}

/// Forks into writer (child) and reader (parent) halves. The caller is
/// responsible for having already validated [`check_prerequisites`] and for
/// arranging that the child creates `log_path` as a fresh raw log.
///
/// # Safety
/// Forking a multi-threaded process is unsound in general (only
/// async-signal-safe operations are guaranteed to work in the child before
/// an `exec`); this must be called before any other thread is spawned.
pub unsafe fn spawn(log_path: &Path) -> Result<TwinRole, TwinError> {
    match unsafe { fork() }.map_err(TwinError::Fork)? {
        ForkResult::Child => Ok(TwinRole::Writer),
        ForkResult::Parent { child } => {
            info!(pid = child.as_raw(), "twin: writer forked, waiting for raw log header");
            wait_for_header(log_path)?;
            let reader = RawLogReader::open(log_path)
                .map_err(|e| TwinError::Prerequisite(format!("opening twin log: {e}")))?;
            Ok(TwinRole::Reader(child, reader))
        }
    }
}

fn wait_for_header(path: &Path) -> Result<(), TwinError> {
    for _ in 0..200 {
        if let Ok(meta) = std::fs::metadata(path)
            && meta.len() as usize >= HEADER_LEN
        {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    Err(TwinError::Prerequisite(
        "writer did not create the raw log header in time".into(),
    ))
}

/// Blocks the reader half until the writer appends to the log (or
/// `timeout` elapses), returning whether a write was actually observed.
/// Used instead of a fixed-interval poll so the reader only wakes when
/// there's genuinely new data.
pub fn wait_for_append(log_path: &Path, timeout: Duration) -> Result<bool, TwinError> {
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event.kind);
        }
    })
    .map_err(TwinError::Watch)?;
    watcher.watch(log_path, RecursiveMode::NonRecursive).map_err(TwinError::Watch)?;

    match rx.recv_timeout(timeout) {
        Ok(EventKind::Modify(_)) => Ok(true),
        Ok(_) => Ok(false),
        Err(RecvTimeoutError::Timeout) => Ok(false),
        Err(RecvTimeoutError::Disconnected) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_twin_mode_with_existing_log() {
        let err = check_prerequisites(Path::new("/tmp/x.raw"), true).unwrap_err();
        assert!(matches!(err, TwinError::Prerequisite(_)));
    }

    #[test]
    fn rejects_overlong_path() {
        let long = "a".repeat(MAX_LOG_PATH_LEN + 1);
        let err = check_prerequisites(Path::new(&long), false).unwrap_err();
        assert!(matches!(err, TwinError::Prerequisite(_)));
    }
}
