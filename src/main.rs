//! xcperf: record an xctrace capture and extract per-process FPS, CPU and
//! memory time series from it.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use xcperf::pipeline::{parse_and_save, WorkDirs};
use xcperf::xctrace::{session_id, XctraceRecorder};

#[derive(Parser)]
#[command(name = "xcperf")]
#[command(about = "Extract per-process FPS, CPU and memory series from xctrace captures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a capture, then parse it and save the metric series
    Record {
        /// Instruments template to record with
        #[arg(long, default_value = "./fps-cpu-mem.tracetemplate")]
        template: PathBuf,

        /// Device UDID to record on
        #[arg(long)]
        device: String,

        /// Process to extract metrics for
        #[arg(long, default_value = "Steam")]
        process: String,

        /// Record time limit, <time[ms|s|m|h]>; without one, record until Ctrl-C
        #[arg(long)]
        time_limit: Option<String>,

        /// Working directory for captures, exports and saved series
        #[arg(long, default_value = "./temp")]
        work_dir: PathBuf,
    },
    /// Parse an existing .trace capture and save the metric series
    Parse {
        /// Path to the .trace capture
        trace: PathBuf,

        /// Process to extract metrics for
        #[arg(long, default_value = "Steam")]
        process: String,

        /// Working directory for exports and saved series
        #[arg(long, default_value = "./temp")]
        work_dir: PathBuf,
    },
}

fn run_record(
    template: PathBuf,
    device: String,
    process: String,
    time_limit: Option<String>,
    work_dir: PathBuf,
) -> Result<()> {
    let dirs = WorkDirs::create(&work_dir)?;
    let session = session_id();
    let trace = dirs.root.join(format!("{session}.trace"));

    let recorder = XctraceRecorder {
        template,
        device,
        output: trace.clone(),
        time_limit,
        log_path: dirs.root.join(format!("{session}_record.log")),
    };
    recorder.record()?;

    finish(&trace, &process, &session, &dirs)
}

fn run_parse(trace: PathBuf, process: String, work_dir: PathBuf) -> Result<()> {
    let dirs = WorkDirs::create(&work_dir)?;
    let session = session_id();
    finish(&trace, &process, &session, &dirs)
}

fn finish(
    trace: &std::path::Path,
    process: &str,
    session: &str,
    dirs: &WorkDirs,
) -> Result<()> {
    let paths = parse_and_save(trace, process, session, dirs)?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            template,
            device,
            process,
            time_limit,
            work_dir,
        } => run_record(template, device, process, time_limit, work_dir),
        Commands::Parse {
            trace,
            process,
            work_dir,
        } => run_parse(trace, process, work_dir),
    }
}
