//! Server process lifecycle.
//!
//! Spawns the `--pipe` server with piped stdin/stdout and hands out a
//! [`ProtocolClient`] bound to those pipes. The process is a scoped resource:
//! [`ServerProcess::shutdown`] closes the request stream and waits for a clean
//! exit, and dropping a `ServerProcess` without shutting it down closes the
//! stream, kills the child if it is still running, and reaps it.

use std::ffi::OsStr;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::protocol::{ProtocolClient, Record};
use crate::{AppError, Result};

/// Protocol client bound to a child process's stdio.
pub type PipeClient = ProtocolClient<BufReader<ChildStdout>, ChildStdin>;

/// Settings for launching the server process.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Server executable.
    pub server_cmd: PathBuf,
    /// Arguments passed after the executable.
    pub server_args: Vec<String>,
    /// Directory the child starts in; inherited when `None`.
    pub working_dir: Option<PathBuf>,
    /// Maximum response line length for the bound client.
    pub max_line_bytes: usize,
    /// When set, the child environment is cleared and only these variables
    /// are passed through. `None` inherits the full environment.
    pub env_allowlist: Option<Vec<String>>,
}

/// A running `--pipe` server and the client talking to it.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    client: PipeClient,
    reaped: bool,
}

impl ServerProcess {
    /// Launch the server and bind a client to its stdin/stdout.
    ///
    /// The child's stderr is inherited so server diagnostics reach the
    /// terminal unchanged.
    ///
    /// # Errors
    ///
    /// - `AppError::Spawn("failed to spawn …")` — OS spawn failure.
    /// - `AppError::Spawn("failed to capture …")` — a pipe was not created.
    pub fn spawn(config: &SpawnConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.server_cmd);
        cmd.args(&config.server_args);

        if let Some(allowlist) = &config.env_allowlist {
            cmd.env_clear();
            for key in allowlist {
                if let Some(val) = std::env::var_os(key) {
                    cmd.env(key, val);
                }
            }
        }

        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|err| {
            AppError::Spawn(format!(
                "failed to spawn {}: {err}",
                config.server_cmd.display()
            ))
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            abort(&mut child);
            return Err(AppError::Spawn("failed to capture server stdio".into()));
        };

        info!(
            pid = child.id(),
            server_cmd = %config.server_cmd.display(),
            args = ?config.server_args,
            "server started"
        );

        let client = ProtocolClient::new(BufReader::new(stdout), stdin)
            .with_max_line_bytes(config.max_line_bytes);

        Ok(Self {
            child,
            client,
            reaped: false,
        })
    }

    /// OS process id of the server.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// The client bound to this server's pipes.
    pub fn client(&mut self) -> &mut PipeClient {
        &mut self.client
    }

    /// Convenience wrapper for `self.client().query(filename)`.
    ///
    /// # Errors
    ///
    /// See [`ProtocolClient::query`].
    pub fn query(&mut self, filename: impl AsRef<OsStr>) -> Result<Record> {
        self.client.query(filename)
    }

    /// Close the request stream, wait for the server to exit, and check its status.
    ///
    /// # Errors
    ///
    /// - `AppError::Io` if waiting on the child fails.
    /// - `AppError::ServerFailed` if the server exited with a non-zero status
    ///   or was killed by a signal.
    pub fn shutdown(mut self) -> Result<ExitStatus> {
        if let Err(err) = self.client.close() {
            // The server may already be gone; the exit status is what matters.
            debug!(error = %err, "closing request stream failed");
        }

        let status = self
            .child
            .wait()
            .map_err(|err| AppError::Io(format!("failed to wait for server: {err}")))?;
        self.reaped = true;

        if status.success() {
            info!(pid = self.child.id(), "server exited cleanly");
            Ok(status)
        } else {
            debug!(pid = self.child.id(), %status, "server exited unsuccessfully");
            Err(AppError::ServerFailed(format!("server {status}")))
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }

        if let Err(err) = self.client.close() {
            debug!(error = %err, "closing request stream failed");
        }

        match self.child.try_wait() {
            Ok(Some(status)) => debug!(pid = self.child.id(), %status, "server already exited"),
            Ok(None) | Err(_) => {
                warn!(pid = self.child.id(), "server still running at drop, killing");
                abort(&mut self.child);
            }
        }
    }
}

/// Kill and reap `child`, ignoring errors from an already-exited process.
fn abort(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!(error = %err, "kill failed");
    }
    if let Err(err) = child.wait() {
        debug!(error = %err, "wait failed");
    }
}
