//! devsample-dump - replays a raw log, printing one summary per cycle.
//!
//! A headless counterpart to devsample-agent: no rendering, just enough
//! structure to inspect or pipe a recorded run. `--begin`/`--end` bound the
//! replay window by epoch; `--blocks` additionally breaks down each
//! cycle's decoded segment sizes.

use std::io::{self, Read};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{Level, error, warn};
use tracing_subscriber::EnvFilter;

use devsample_core::error::ExitCode;
use devsample_core::rawlog::{DecodedCycle, RawLogReader};
use devsample_core::storage::model::{CgroupChainEntry, DataBlock, ProcessInfo};
use devsample_core::util::parse_time;

/// Replays a recorded raw log file.
#[derive(Parser)]
#[command(name = "devsample-dump", about = "Inspect and replay a raw sampling log", version)]
struct Cli {
    /// Path to the raw log, or "-" to read it from stdin.
    path: PathBuf,

    /// Only show cycles at or after this time (epoch seconds, "HH:MM", or
    /// "YYYY-MM-DD HH:MM[:SS]").
    #[arg(long)]
    begin: Option<String>,

    /// Only show cycles at or before this time, same formats as --begin.
    #[arg(long)]
    end: Option<String>,

    /// Also print each segment's decompressed size.
    #[arg(long)]
    blocks: bool,

    /// Emit each cycle as one JSON object per line instead of text.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("devsample_dump={level}").parse().unwrap())
        .add_directive(format!("devsample_core={level}").parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn fmt_ts(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[derive(Serialize)]
struct JsonCycle {
    epoch: i64,
    nproc: u32,
    ntask: u32,
    nrun: u32,
    nslpi: u32,
    nslpu: u32,
    nzombie: u32,
    nexit: u32,
    nnew: u32,
    ncgroups: u32,
    ncgpids: u32,
    noverflow: u32,
}

fn print_cycle(decoded: &DecodedCycle, cli: &Cli) {
    let h = &decoded.header;

    if cli.json {
        let j = JsonCycle {
            epoch: h.epoch,
            nproc: h.nproc,
            ntask: h.ntask,
            nrun: h.nrun,
            nslpi: h.nslpi,
            nslpu: h.nslpu,
            nzombie: h.nzombie,
            nexit: h.nexit,
            nnew: h.nnew,
            ncgroups: h.ncgroups,
            ncgpids: h.ncgpids,
            noverflow: h.noverflow,
        };
        if let Ok(line) = serde_json::to_string(&j) {
            println!("{line}");
        }
        return;
    }

    println!(
        "{}  proc={:<5} task={:<5} run={:<4} slpi={:<5} slpu={:<4} zombie={:<3} exit={:<4} new={:<4} cgroups={:<4}",
        fmt_ts(h.epoch),
        h.nproc,
        h.ntask,
        h.nrun,
        h.nslpi,
        h.nslpu,
        h.nzombie,
        h.nexit,
        h.nnew,
        h.ncgroups,
    );

    if cli.blocks {
        let system: Vec<DataBlock> = bincode::deserialize(&decoded.system).unwrap_or_default();
        let tasks: Vec<ProcessInfo> = bincode::deserialize(&decoded.tasks).unwrap_or_default();
        let cgroups: Vec<CgroupChainEntry> = bincode::deserialize(&decoded.cgroup_cstat).unwrap_or_default();
        let pidlist: Vec<u32> = bincode::deserialize(&decoded.cgroup_pidlist).unwrap_or_default();
        println!(
            "    system: {} blocks ({} B), tasks: {} ({} B), cgroups: {} ({} B), pidlist: {} ({} B)",
            system.len(),
            decoded.system.len(),
            tasks.len(),
            decoded.tasks.len(),
            cgroups.len(),
            decoded.cgroup_cstat.len(),
            pidlist.len(),
            decoded.cgroup_pidlist.len(),
        );
    }
}

fn run(cli: &Cli) -> Result<(), ExitCode> {
    let begin = cli.begin.as_deref().map(parse_time).transpose().map_err(|e| {
        error!(error = %e, "invalid --begin");
        ExitCode::Usage
    })?;
    let end = cli.end.as_deref().map(parse_time).transpose().map_err(|e| {
        error!(error = %e, "invalid --end");
        ExitCode::Usage
    })?;

    let mut reader = if cli.path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).map_err(|e| {
            error!(error = %e, "failed reading stdin");
            ExitCode::RawLogRead
        })?;
        let tmp = std::env::temp_dir().join(format!("devsample-dump-stdin-{}.raw", std::process::id()));
        std::fs::write(&tmp, &buf).map_err(|e| {
            error!(error = %e, "failed buffering stdin to a temp file");
            ExitCode::RawLogRead
        })?;
        let reader = RawLogReader::open(&tmp).map_err(|e| {
            error!(error = %e, "failed to open raw log");
            devsample_core::error::CoreError::from(e).exit_code()
        })?;
        let _ = std::fs::remove_file(&tmp);
        reader
    } else {
        RawLogReader::open(&cli.path).map_err(|e| {
            error!(error = %e, path = %cli.path.display(), "failed to open raw log");
            devsample_core::error::CoreError::from(e).exit_code()
        })?
    };

    let mut shown = 0u64;
    loop {
        match reader.read_next() {
            Ok(Some(decoded)) => {
                let epoch = decoded.header.epoch;
                if let Some(b) = begin
                    && epoch < b
                {
                    continue;
                }
                if let Some(e) = end
                    && epoch > e
                {
                    break;
                }
                print_cycle(&decoded, cli);
                shown += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "cycle read failed, stopping replay");
                return Err(devsample_core::error::CoreError::from(e).exit_code());
            }
        }
    }

    if shown == 0 {
        warn!("no cycles matched the requested window");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(code) = run(&cli) {
        std::process::exit(code.code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_as_utc_timestamp() {
        assert_eq!(fmt_ts(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn path_is_the_only_required_argument() {
        let cli = Cli::try_parse_from(["devsample-dump", "run.raw"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("run.raw"));
        assert!(cli.begin.is_none());
        assert!(!cli.blocks);
        assert!(!cli.json);
    }

    #[test]
    fn stdin_path_is_accepted() {
        let cli = Cli::try_parse_from(["devsample-dump", "-"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("-"));
    }
}
