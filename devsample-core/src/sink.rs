//! The sink interface: the polymorphic consumer of finished cycles, driving
//! the sampling loop's forward/backward/branch/quit behavior.
//!
//! A sink never touches the raw log or the deviation engine directly — it's
//! handed a fully decoded cycle and returns a [`Command`] telling the loop
//! what to do next. This is the seam a live terminal UI, a headless replay
//! dump, or (in tests) a simple collector all sit behind.

use crate::deviation::{CgroupDeviation, SystemDeviation, TaskDeviationBundle};
use crate::rawlog::RecordHeader;

/// One fully assembled cycle, ready for a sink to consume.
pub struct Cycle<'a> {
    pub header: &'a RecordHeader,
    pub system: &'a SystemDeviation,
    pub tasks: &'a TaskDeviationBundle,
    pub cgroups: &'a CgroupDeviation,
}

/// What the sampling loop should do after a sink has seen a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    Continue,
    /// Discard accumulated baselines and start fresh at the next cycle.
    Reset,
    Quit,
    /// Only meaningful in replay: move to the next recorded cycle without
    /// re-running the deviation engine.
    StepForward,
    /// Only meaningful in replay: move to the previously recorded cycle.
    StepBackward,
    /// Only meaningful in replay: jump directly to the recorded cycle whose
    /// epoch is closest to (but not after) the given timestamp.
    BranchToEpoch(i64),
}

/// Implemented by whatever consumes finished cycles: a live printer, a
/// headless dump tool, a terminal UI. See module docs.
pub trait Sink {
    /// Called once per completed cycle.
    fn on_sample(&mut self, cycle: &Cycle<'_>) -> Command;

    /// Called when a cycle could not be produced (a subsystem failed in a
    /// way that aborts the whole cycle, not just degrades one field).
    fn on_error(&mut self, message: &str) -> Command;

    /// Called once, when the sampling loop is about to stop (cancellation,
    /// end of a replayed log, or a `Command::Quit` it already issued).
    fn on_end(&mut self);

    /// Short usage/help text this sink wants printed on request (`-h`, or
    /// an interactive '?' keypress in a TUI-style sink).
    fn usage_help(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSink {
        samples: u32,
        quit_after: u32,
    }

    impl Sink for CountingSink {
        fn on_sample(&mut self, _cycle: &Cycle<'_>) -> Command {
            self.samples += 1;
            if self.samples >= self.quit_after {
                Command::Quit
            } else {
                Command::Continue
            }
        }

        fn on_error(&mut self, _message: &str) -> Command {
            Command::Continue
        }

        fn on_end(&mut self) {}

        fn usage_help(&self) -> &str {
            "counting sink: no options"
        }
    }

    #[test]
    fn sink_issues_quit_after_threshold() {
        let header = RecordHeader::default();
        let system = SystemDeviation::default();
        let tasks = TaskDeviationBundle::default();
        let cgroups = CgroupDeviation::default();
        let cycle = Cycle {
            header: &header,
            system: &system,
            tasks: &tasks,
            cgroups: &cgroups,
        };

        let mut sink = CountingSink { samples: 0, quit_after: 2 };
        assert_eq!(sink.on_sample(&cycle), Command::Continue);
        assert_eq!(sink.on_sample(&cycle), Command::Quit);
    }
}
