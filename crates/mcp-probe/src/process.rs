//! Server child process: spawn with piped stdio, forward stderr, terminate.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, ChildStderr, Command};
use tokio::task::JoinHandle;

use crate::config::ServerCommand;
use crate::types::{ProbeError, ProbeResult};

/// How long `terminate` waits for the process to exit after killing it.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Owns the server child process. The child is killed if this is dropped.
pub struct ServerProcess {
    child: Child,
    command: String,
    stderr_task: Option<JoinHandle<()>>,
}

impl ServerProcess {
    /// Launch the server and hand back its stdout (buffered) and stdin.
    pub fn spawn(
        command: &ServerCommand,
    ) -> ProbeResult<(Self, BufReader<ChildStdout>, ChildStdin)> {
        tracing::info!("Starting MCP server: {command}");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ProbeError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ProbeError::MissingPipe("stdout"))?;
        let stderr_task = child.stderr.take().map(forward_stderr);

        if let Some(pid) = child.id() {
            tracing::debug!(pid, "Server process started");
        }

        let process = Self {
            child,
            command: command.to_string(),
            stderr_task,
        };
        Ok((process, BufReader::new(stdout), stdin))
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Exit status if the process has already exited.
    pub fn try_status(&mut self) -> ProbeResult<Option<ExitStatus>> {
        self.child.try_wait().map_err(ProbeError::Io)
    }

    /// Kill the server and wait up to `grace` for it to exit.
    ///
    /// Failures are logged, never returned.
    pub async fn terminate(&mut self, grace: Duration) -> Option<ExitStatus> {
        tracing::info!("Stopping server: {}", self.command);

        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::debug!("Server already exited: {status}");
            self.join_stderr().await;
            return Some(status);
        }

        if let Err(e) = self.child.start_kill() {
            tracing::warn!("Failed to signal server: {e}");
        }

        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("Server exited: {status}");
                Some(status)
            }
            Ok(Err(e)) => {
                tracing::warn!("Error waiting for server: {e}");
                None
            }
            Err(_) => {
                tracing::warn!("Server did not exit within {}ms", grace.as_millis());
                None
            }
        };

        self.join_stderr().await;
        status
    }

    async fn join_stderr(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            // The pipe closes with the process, so this finishes promptly.
            if tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .is_err()
            {
                tracing::debug!("Stderr forwarder still running after shutdown");
            }
        }
    }
}

/// Drain the server's stderr into the log so the pipe never fills up.
fn forward_stderr(stderr: ChildStderr) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tracing::debug!(target: "mcp_probe::server", "{line}"),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Server stderr closed: {e}");
                    break;
                }
            }
        }
    })
}
