//! devsample-agent - samples system/process activity and writes it to a raw log.
//!
//! Collects from `/proc` (and cgroup v2, when enabled) on an interval, runs
//! the deviation engine, drains process accounting if available, and
//! appends one compressed, self-describing record per cycle to a raw log
//! file. Rendering is out of scope here; the bundled sink is a minimal
//! line-oriented summarizer proving the core runs end to end.

mod line_sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use devsample_core::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use devsample_core::collector::MockFs;
use devsample_core::accounting::AccountingReader;
use devsample_core::collector::Collector;
use devsample_core::rawlog::{FLAG_RAW_ACCT_ACTIVE, FLAG_RAW_CONTAINER_STAT, FLAG_RAW_IOSTAT, FileHeader, HEADER_LEN, RawLogWriter};
use devsample_core::sampling::{SamplingLoop, install_signal_handlers};
use devsample_core::storage::model::{CgroupChainEntry, ProcessInfo, SystemStatInfo};
use devsample_core::twin::{self, TwinRole};

use line_sink::LineSink;

/// Samples system/process activity and writes it to a raw log.
#[derive(Parser)]
#[command(name = "devsample-agent", about = "Sampling and deviation engine daemon", version)]
struct Args {
    /// Raw log path to write cycles to. Mutually exclusive with `--twin`.
    #[arg(long, required_unless_present = "twin", conflicts_with = "twin")]
    write: Option<PathBuf>,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Path to the /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Path to the process-accounting directory (e.g. pacct records).
    /// Pass --no-acct to disable entirely.
    #[arg(long, default_value = "/var/log/account")]
    acct_dir: String,

    /// Disable process-accounting drain even if the directory is present.
    #[arg(long)]
    no_acct: bool,

    /// Path to cgroup filesystem. Implies cgroup collection regardless of
    /// container detection.
    #[arg(long, value_name = "PATH")]
    cgroup_path: Option<String>,

    /// Force cgroup collection even when not running inside a container.
    #[arg(long)]
    force_cgroup: bool,

    /// Stop after this many cycles.
    #[arg(long)]
    samples: Option<u64>,

    /// Include inactive (sleeping/idle) tasks in the summarized output, not
    /// just the ones that ran this cycle.
    #[arg(long)]
    all: bool,

    /// Run in twin mode: fork a writer/reader pair sharing a log file under
    /// this directory, so a live follow-along view never blocks sampling.
    #[arg(long, value_name = "DIR")]
    twin: Option<PathBuf>,

    /// Stop cleanly the first cycle that runs past local midnight, instead
    /// of sampling across the day boundary indefinitely.
    #[arg(long)]
    midnight: bool,

    /// Read /proc/[pid]/smaps_rollup for each task's proportional set size.
    /// Costs a full smaps walk per process per cycle; off by default.
    #[arg(long)]
    psize: bool,

    /// Read /proc/[pid]/wchan for each task's kernel wait-channel name.
    /// Off by default, same cost tradeoff as --psize.
    #[arg(long)]
    wchan: bool,

    /// Increase logging verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode: errors only.
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("devsample_agent={level}").parse().unwrap())
        .add_directive(format!("devsample_core={level}").parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn hostname() -> String {
    nix::unistd::gethostname()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn page_size() -> u32 {
    nix::unistd::sysconf(nix::unistd::SysconfVar::PAGE_SIZE)
        .ok()
        .flatten()
        .unwrap_or(4096) as u32
}

fn tick_rate() -> u16 {
    nix::unistd::sysconf(nix::unistd::SysconfVar::CLK_TCK)
        .ok()
        .flatten()
        .unwrap_or(100) as u16
}

fn open_accounting(acct_dir: &str, disabled: bool) -> Option<AccountingReader<std::fs::File>> {
    if disabled {
        info!("accounting: disabled by flag");
        return None;
    }
    match AccountingReader::open(Path::new(acct_dir)) {
        Ok(reader) => {
            info!(acct_dir, "accounting: active");
            Some(reader)
        }
        Err(e) => {
            warn!(error = %e, "accounting: unavailable, proceeding with zero exits");
            None
        }
    }
}

fn build_collector(
    proc_path: &str,
    cgroup_path: Option<&str>,
    force_cgroup: bool,
    psize: bool,
    wchan: bool,
) -> Collector<impl devsample_core::collector::FileSystem + Clone> {
    #[cfg(target_os = "linux")]
    let fs = RealFs::new();
    #[cfg(not(target_os = "linux"))]
    let fs = MockFs::new();

    let mut collector = Collector::new(fs, proc_path).with_psize(psize).with_wchan(wchan);
    if let Some(path) = cgroup_path {
        collector = collector.with_cgroup(path);
    } else if force_cgroup {
        collector = collector.force_cgroup(None);
    }
    collector
}

fn open_writer(path: &Path, header: &FileHeader) -> Result<RawLogWriter, devsample_core::rawlog::RawLogError> {
    if path.exists() && std::fs::metadata(path).map(|m| m.len() >= HEADER_LEN as u64).unwrap_or(false) {
        RawLogWriter::append(path, header)
    } else {
        RawLogWriter::create(path, header)
    }
}

/// Runs the plain (non-twin) sampling loop, writing to `log_path`.
fn run_writer(args: &Args, log_path: &Path) -> Result<(), i32> {
    let accounting = open_accounting(&args.acct_dir, args.no_acct);
    let mut collector = build_collector(&args.proc_path, args.cgroup_path.as_deref(), args.force_cgroup, args.psize, args.wchan);

    let mut support_flags = FLAG_RAW_IOSTAT as i32;
    if accounting.is_some() {
        support_flags |= FLAG_RAW_ACCT_ACTIVE as i32;
    }
    if collector.cgroup_enabled() {
        support_flags |= FLAG_RAW_CONTAINER_STAT as i32;
    }

    let header = FileHeader::new(
        tick_rate(),
        std::mem::size_of::<SystemStatInfo>() as u32,
        std::mem::size_of::<ProcessInfo>() as u32,
        std::mem::size_of::<CgroupChainEntry>() as u32,
        page_size(),
        support_flags,
        &hostname(),
    );

    let writer = match open_writer(log_path, &header) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, path = %log_path.display(), "raw log open failed");
            return Err(devsample_core::error::CoreError::from(e).exit_code().code());
        }
    };

    if let Err(e) = install_signal_handlers() {
        warn!(error = %e, "failed to install signal handlers");
    }

    let mut sink = LineSink::new(args.samples, args.all);
    let mut sampling =
        SamplingLoop::new(collector, writer, accounting, Duration::from_secs(args.interval)).with_midnight_stop(args.midnight);

    info!(
        interval = args.interval,
        path = %log_path.display(),
        "devsample-agent starting"
    );
    sampling.run(&mut sink);
    Ok(())
}

/// Runs twin mode: forks into a writer (this process, child) and a reader
/// (the original process, parent) sharing one log file. The parent follows
/// the log as the child appends to it and cleans up on exit.
fn run_twin(args: &Args, dir: &Path) -> Result<(), i32> {
    if let Err(e) = twin::check_prerequisites(dir, false) {
        error!(error = %e, "twin mode prerequisites not met");
        return Err(devsample_core::error::ExitCode::Usage.code());
    }

    let log_path = dir.join(format!("devsample-twin-{}.raw", std::process::id()));

    // SAFETY: called before any other thread exists in this process.
    match unsafe { twin::spawn(&log_path) } {
        Ok(TwinRole::Writer) => run_writer(args, &log_path),
        Ok(TwinRole::Reader(child_pid, mut reader)) => {
            let cancelled = Arc::new(AtomicBool::new(false));
            let c = cancelled.clone();
            let _ = ctrlc::set_handler(move || c.store(true, Ordering::SeqCst));

            info!(path = %log_path.display(), "twin: reader following writer");
            while !cancelled.load(Ordering::SeqCst) {
                match reader.read_next() {
                    Ok(Some(cycle)) => {
                        info!(
                            epoch = cycle.header.epoch,
                            nproc = cycle.header.nproc,
                            ntask = cycle.header.ntask,
                            "twin: cycle"
                        );
                    }
                    Ok(None) => {
                        let _ = twin::wait_for_append(&log_path, Duration::from_secs(args.interval + 5));
                    }
                    Err(e) => {
                        error!(error = %e, "twin: reader failed");
                        break;
                    }
                }
            }

            info!(pid = child_pid.as_raw(), "twin: shutting down, cleaning up writer and log file");
            let _ = nix::sys::signal::kill(child_pid, nix::sys::signal::Signal::SIGTERM);
            let _ = nix::sys::wait::waitpid(child_pid, None);
            let _ = std::fs::remove_file(&log_path);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "twin mode fork failed");
            Err(devsample_core::error::ExitCode::Fatal.code())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let result = match (&args.twin, &args.write) {
        (Some(_), Some(_)) => {
            error!("--write and --twin are mutually exclusive");
            Err(devsample_core::error::ExitCode::Usage.code())
        }
        (Some(dir), None) => run_twin(&args, dir),
        (None, Some(path)) => run_writer(&args, path),
        (None, None) => unreachable!("clap requires one of --write/--twin"),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_twin_are_mutually_exclusive() {
        let err = Args::try_parse_from(["devsample-agent", "--write", "a.raw", "--twin", "/tmp"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn one_of_write_or_twin_is_required() {
        let err = Args::try_parse_from(["devsample-agent"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn defaults_apply_with_just_write() {
        let args = Args::try_parse_from(["devsample-agent", "--write", "out.raw"]).unwrap();
        assert_eq!(args.interval, 10);
        assert_eq!(args.proc_path, "/proc");
        assert!(!args.no_acct);
        assert!(!args.force_cgroup);
        assert!(!args.midnight);
        assert!(!args.psize);
        assert!(!args.wchan);
    }

    #[test]
    fn midnight_psize_wchan_flags_parse() {
        let args = Args::try_parse_from(["devsample-agent", "--write", "out.raw", "--midnight", "--psize", "--wchan"]).unwrap();
        assert!(args.midnight);
        assert!(args.psize);
        assert!(args.wchan);
    }
}
