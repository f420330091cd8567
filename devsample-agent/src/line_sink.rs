//! A minimal line-oriented summarizer `Sink`. Not a renderer — the CLI's
//! job is to prove the core is drivable end to end; pixel-level display is
//! someone else's problem.

use devsample_core::sink::{Command, Cycle, Sink};
use tracing::info;

pub struct LineSink {
    pub quit_after: Option<u64>,
    pub include_inactive: bool,
    seen: u64,
}

impl LineSink {
    pub fn new(quit_after: Option<u64>, include_inactive: bool) -> Self {
        Self { quit_after, include_inactive, seen: 0 }
    }
}

impl Sink for LineSink {
    fn on_sample(&mut self, cycle: &Cycle<'_>) -> Command {
        self.seen += 1;
        let h = cycle.header;
        let shown = if self.include_inactive {
            cycle.tasks.all.len()
        } else {
            cycle.tasks.active_idx.len()
        };
        info!(
            epoch = h.epoch,
            nproc = h.nproc,
            ntask = h.ntask,
            shown,
            nrun = h.nrun,
            nexit = h.nexit,
            nnew = h.nnew,
            ncgroups = h.ncgroups,
            noverflow = h.noverflow,
            "cycle"
        );
        match self.quit_after {
            Some(n) if self.seen >= n => Command::Quit,
            _ => Command::Continue,
        }
    }

    fn on_error(&mut self, message: &str) -> Command {
        tracing::warn!(message, "cycle error");
        Command::Continue
    }

    fn on_end(&mut self) {
        info!(samples = self.seen, "sampling stopped");
    }

    fn usage_help(&self) -> &str {
        "line sink: prints one summary line per cycle via tracing; no options"
    }
}
