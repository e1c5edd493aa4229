//! Child-process line source
//!
//! Runs a monitor program (e.g. `idf.py monitor`, `pio device monitor`) and
//! reads its stdout as device log lines.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

use ncmon_core::prelude::*;

use crate::line::{decode_line, ChannelSource, LineRead, LineSource};

/// A child process whose stdout is a line source.
///
/// The `Child` handle lives in a dedicated `wait_for_exit` task. The source
/// keeps a kill channel and an atomic exit flag.
pub struct ProcessSource {
    lines: ChannelSource,
    /// Consumed on first use (close or drop).
    kill_tx: Option<oneshot::Sender<()>>,
    exited: Arc<AtomicBool>,
}

impl ProcessSource {
    /// Resolve `program` on `PATH` and spawn it with `args`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let resolved =
            which::which(program).map_err(|_| Error::source_not_found(program))?;

        let label = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };

        info!("Spawning line source: {}", label);

        let mut child = Command::new(&resolved)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::source_open(&label, e.to_string()))?;

        info!("Line source process started with PID: {:?}", child.id());

        let (tx, lines) = ChannelSource::channel(label);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(Self::stdout_reader(stdout, tx));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(Self::stderr_reader(stderr));
        }

        let exited = Arc::new(AtomicBool::new(false));
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(Self::wait_for_exit(child, kill_rx, Arc::clone(&exited)));

        Ok(Self {
            lines,
            kill_tx: Some(kill_tx),
            exited,
        })
    }

    /// Background task: owns `child` and waits for it to exit or be killed.
    async fn wait_for_exit(
        mut child: Child,
        kill_rx: oneshot::Receiver<()>,
        exited: Arc<AtomicBool>,
    ) {
        tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(status) => info!("Line source process exited with status: {:?}", status),
                    Err(e) => error!("Error waiting for line source process: {}", e),
                }
            }
            _ = kill_rx => {
                debug!("Kill requested, stopping line source process");
                if let Err(e) = child.kill().await {
                    error!("Failed to kill line source process: {}", e);
                }
                if let Err(e) = child.wait().await {
                    error!("Error waiting after kill: {}", e);
                }
            }
        }

        exited.store(true, Ordering::Release);
    }

    /// Forward cleaned stdout lines. Undecodable lines are skipped rather
    /// than ending the stream.
    async fn stdout_reader<R>(stdout: R, tx: mpsc::Sender<String>)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let Some(line) = decode_line(&buf) else {
                        continue;
                    };
                    trace!("stdout: {}", line);
                    if tx.send(line).await.is_err() {
                        debug!("stdout channel closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!("Reading line source stdout failed: {}", e);
                    break;
                }
            }
        }

        // Dropping `tx` here is what reports the source as closed
        debug!("stdout reader finished");
    }

    /// Monitor programs print their own status on stderr; keep it in the log.
    async fn stderr_reader<R>(stderr: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            debug!("stderr: {}", line);
        }
        debug!("stderr reader finished");
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            // The wait task may already be gone
            let _ = tx.send(());
        }
    }
}

impl LineSource for ProcessSource {
    fn label(&self) -> &str {
        self.lines.label()
    }

    fn read_line(&mut self) -> LineRead {
        self.lines.read_line()
    }

    fn close(&mut self) {
        if !self.has_exited() {
            info!("Stopping line source process {}", self.lines.label());
            self.kill();
        }
        self.lines.close();
    }
}

impl Drop for ProcessSource {
    fn drop(&mut self) {
        if !self.has_exited() {
            self.kill();
        }
        // kill_on_drop(true) covers the case where the wait task never ran
    }
}
