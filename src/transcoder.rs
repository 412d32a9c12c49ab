/*!
 * Execution of the external media tool.
 *
 * The tool runs as a child process with both output streams read
 * concurrently, line by line, while the wait races a timeout and a
 * cancellation handle. Losing either race kills the child.
 */

use async_trait::async_trait;
use log::{debug, trace, warn};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Notify;

use crate::command_builder::{ToolLocator, TrimCommand};
use crate::errors::TrimError;

/// Everything the tool printed, with its exit status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when killed by a signal
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Seam between the orchestrator and the media tool
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Executable that will be invoked; fails when none is installed
    fn program(&self) -> Result<PathBuf, TrimError>;

    /// Run the command to completion
    async fn run(&self, command: &TrimCommand) -> Result<ToolOutput, TrimError>;

    /// Whether a cancellation is already pending, checked before anything is deleted
    fn cancel_requested(&self) -> bool {
        false
    }
}

/// Receives every output line as soon as the tool prints it
pub type LineObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Shared cancellation flag for a running tool
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; a run started later is cancelled immediately
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        self.notify.notified().await;
    }
}

/// Runs the media tool as a real child process
pub struct ProcessRunner {
    candidates: Vec<String>,
    locator: ToolLocator,
    timeout: Option<Duration>,
    cancel: CancelHandle,
    observer: Option<LineObserver>,
    // @field: Listen for Ctrl-C while the tool runs, and only then
    interrupt_on_ctrl_c: bool,
}

impl ProcessRunner {
    pub fn new(candidates: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            candidates,
            locator: ToolLocator::from_env(),
            timeout,
            cancel: CancelHandle::new(),
            observer: None,
            interrupt_on_ctrl_c: false,
        }
    }

    pub fn with_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_line_observer(mut self, observer: LineObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Stop the tool on Ctrl-C. The listener is installed when a run starts,
    /// so an interrupt before that keeps its default effect.
    pub fn with_ctrl_c(mut self, enabled: bool) -> Self {
        self.interrupt_on_ctrl_c = enabled;
        self
    }

    async fn wait_for_interrupt(enabled: bool) {
        if enabled && tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping the media tool");
            return;
        }
        std::future::pending::<()>().await
    }

    async fn wait_for_timeout(timeout: Option<Duration>) {
        match timeout {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn program(&self) -> Result<PathBuf, TrimError> {
        self.locator.resolve_first(&self.candidates)
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn run(&self, command: &TrimCommand) -> Result<ToolOutput, TrimError> {
        debug!("Running: {}", command);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TrimError::Spawn { program: command.program.clone(), source })?;

        let stdout_task = child.stdout.take()
            .map(|stream| tokio::spawn(collect_lines(stream, "stdout", self.observer.clone())));
        let stderr_task = child.stderr.take()
            .map(|stream| tokio::spawn(collect_lines(stream, "stderr", self.observer.clone())));

        let status = tokio::select! {
            status = child.wait() => {
                status.map_err(|source| TrimError::Spawn { program: command.program.clone(), source })?
            },
            _ = Self::wait_for_timeout(self.timeout) => {
                let _ = child.kill().await;
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                return Err(TrimError::Timeout(secs));
            },
            _ = self.cancel.cancelled() => {
                let _ = child.kill().await;
                return Err(TrimError::Cancelled);
            },
            _ = Self::wait_for_interrupt(self.interrupt_on_ctrl_c) => {
                let _ = child.kill().await;
                return Err(TrimError::Cancelled);
            }
        };

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        debug!("{} exited with {}", command.program.display(), status);
        Ok(ToolOutput {
            status_code: status.code(),
            stdout,
            stderr,
        })
    }
}

// Reads until EOF, keeping the text verbatim apart from lossy UTF-8 decoding
async fn collect_lines<R>(stream: R, label: &'static str, observer: Option<LineObserver>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut collected = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                collected.push_str(&line);
                let line = line.trim_end();
                trace!("[{}] {}", label, line);
                if let Some(observer) = &observer {
                    observer(line);
                }
            }
            Err(e) => {
                debug!("Stopped reading {}: {}", label, e);
                break;
            }
        }
    }

    collected
}
