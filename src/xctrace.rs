//! Drivers for the external `xcrun xctrace` record and export commands.
//!
//! Recording runs as a child process whose lifecycle we own: Ctrl-C is
//! forwarded to it as SIGINT so Instruments can finalize the capture instead
//! of leaving a truncated .trace behind. Exporting is a plain run-to-
//! completion invocation per table.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::channel;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use rand::Rng;

const SESSION_SUFFIX_CHARS: &[u8] = b"1234567890qwertyuiopasdfghjklzxcvbnm";
const SESSION_SUFFIX_LEN: usize = 4;

/// Generate a session id of the form `<unix-seconds>_<random suffix>`, used
/// to name the capture and everything derived from it.
pub fn session_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut rng = rand::rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| SESSION_SUFFIX_CHARS[rng.random_range(0..SESSION_SUFFIX_CHARS.len())] as char)
        .collect();
    format!("{now}_{suffix}")
}

/// Runs `xcrun xctrace record` for one template/device pair.
#[derive(Debug, Clone)]
pub struct XctraceRecorder {
    /// Instruments template to record with.
    pub template: PathBuf,
    /// Device UDID to record on.
    pub device: String,
    /// Path of the .trace capture to produce.
    pub output: PathBuf,
    /// Optional `--time-limit` value, e.g. "30s" or "5m". Without one the
    /// recording runs until interrupted.
    pub time_limit: Option<String>,
    /// File capturing xctrace's own stdout/stderr.
    pub log_path: PathBuf,
}

impl XctraceRecorder {
    /// Record a capture, blocking until xctrace exits.
    ///
    /// A Ctrl-C while recording is forwarded to the child as SIGINT; xctrace
    /// then stops the recording and finalizes the capture, which is treated
    /// as success regardless of its exit status.
    pub fn record(&self) -> Result<()> {
        let log = File::create(&self.log_path)
            .with_context(|| format!("failed to create {}", self.log_path.display()))?;

        let mut cmd = Command::new("xcrun");
        cmd.args(["xctrace", "record", "--append-run", "--all-process"])
            .arg("--template")
            .arg(&self.template)
            .arg("--device")
            .arg(&self.device)
            .arg("--output")
            .arg(&self.output);
        if let Some(limit) = &self.time_limit {
            cmd.arg("--time-limit").arg(limit);
        }
        cmd.stdout(Stdio::from(log.try_clone()?)).stderr(Stdio::from(log));

        log::info!("recording to {} ({:?})", self.output.display(), cmd);
        let mut child = cmd
            .spawn()
            .context("failed to spawn xcrun xctrace record")?;
        let child_pid = Pid::from_raw(child.id() as i32);

        let (interrupt_tx, interrupt_rx) = channel();
        ctrlc::set_handler(move || {
            let _ = interrupt_tx.send(());
        })
        .context("failed to install Ctrl-C handler")?;

        let mut interrupted = false;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if interrupt_rx.try_recv().is_ok() {
                log::info!("interrupt received, asking xctrace to stop the recording");
                let _ = signal::kill(child_pid, Signal::SIGINT);
                interrupted = true;
            }
            std::thread::sleep(Duration::from_millis(100));
        };

        if !status.success() && !interrupted {
            bail!(
                "xctrace record exited with {status}, see {}",
                self.log_path.display()
            );
        }
        log::info!("recording finished ({status})");
        Ok(())
    }
}

/// Runs `xcrun xctrace export` against one capture.
#[derive(Debug, Clone)]
pub struct XctraceExporter {
    /// Path of the .trace capture to export from.
    pub trace: PathBuf,
    /// Directory the exported XML documents are written to.
    pub scratch_dir: PathBuf,
    /// Session id used to name the exported files.
    pub session: String,
}

impl XctraceExporter {
    fn run_export(&self, output: &Path, extra_args: &[&str]) -> Result<()> {
        let mut cmd = Command::new("xcrun");
        cmd.args(["xctrace", "export", "--input"])
            .arg(&self.trace)
            .arg("--output")
            .arg(output)
            .args(extra_args);

        log::info!("exporting {} ({:?})", output.display(), cmd);
        let status = cmd
            .status()
            .context("failed to spawn xcrun xctrace export")?;
        if !status.success() {
            bail!(
                "xctrace export of {} exited with {status}",
                output.display()
            );
        }
        Ok(())
    }

    /// Export the capture's table of contents, useful for diagnosing which
    /// tables a template actually produced.
    pub fn export_toc(&self) -> Result<PathBuf> {
        let output = self.scratch_dir.join(format!("{}_root.xml", self.session));
        self.run_export(&output, &["--toc"])?;
        Ok(output)
    }

    /// Export one table of run 1 by schema name, returning the XML path.
    pub fn export_table(&self, schema_name: &str) -> Result<PathBuf> {
        let output = self
            .scratch_dir
            .join(format!("{}_{}.xml", self.session, schema_name));
        let xpath =
            format!("/trace-toc/run[@number=\"1\"]/data/table[@schema=\"{schema_name}\"]");
        self.run_export(&output, &["--xpath", &xpath])?;
        Ok(output)
    }
}
