//! Managed service processes.
//!
//! Each dev server runs as an external child process with piped output.
//! The wrapper tracks a monotonic lifecycle so readiness is recorded at
//! most once and the termination signal is issued at most once, even when
//! shutdown races a spawn or the process has already exited on its own.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::DevServerError;

/// Readiness marker printed by `php artisan serve`.
pub const LARAVEL_READY_MARKER: &str = "started";
/// Readiness marker printed by `ng serve`.
pub const ANGULAR_READY_MARKER: &str = "compiled successfully";

const PUMP_BUF_SIZE: usize = 4096;
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Which side of the stack a process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Backend,
    Frontend,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }

    /// Framework name shown next to the role in operator output.
    pub fn framework(&self) -> &'static str {
        match self {
            Self::Backend => "Laravel",
            Self::Frontend => "Angular",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to launch and recognize one dev server.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub role: ServiceRole,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Output substring that marks the service as ready.
    pub ready_marker: String,
    /// Address shown in the ready report.
    pub endpoint: String,
    /// stderr lines containing any of these are not surfaced as errors.
    pub noise_patterns: Vec<String>,
}

impl ServiceSpec {
    /// `php artisan serve` in the backend directory.
    pub fn laravel(cwd: impl Into<PathBuf>) -> Self {
        Self {
            role: ServiceRole::Backend,
            command: "php".to_string(),
            args: vec!["artisan".to_string(), "serve".to_string()],
            cwd: cwd.into(),
            ready_marker: LARAVEL_READY_MARKER.to_string(),
            endpoint: "http://localhost:8000".to_string(),
            noise_patterns: Vec::new(),
        }
    }

    /// `ng serve --open` in the frontend directory.
    pub fn angular(cwd: impl Into<PathBuf>) -> Self {
        Self {
            role: ServiceRole::Frontend,
            command: "ng".to_string(),
            args: vec!["serve".to_string(), "--open".to_string()],
            cwd: cwd.into(),
            ready_marker: ANGULAR_READY_MARKER.to_string(),
            endpoint: "http://localhost:4200".to_string(),
            noise_patterns: vec!["Warning".to_string(), "Debugger".to_string()],
        }
    }

    pub fn with_ready_marker(mut self, marker: impl Into<String>) -> Self {
        self.ready_marker = marker.into();
        self
    }
}

/// Lifecycle of a managed process. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessState {
    Starting,
    Running,
    ReadyDetected,
    Terminated,
}

/// Which pipe a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One chunk of raw output from a service process, segmented however the
/// OS returned it.
#[derive(Debug)]
pub struct OutputChunk {
    pub role: ServiceRole,
    pub stream: OutputStream,
    pub text: String,
}

/// An externally spawned, long-running service process.
#[derive(Debug)]
pub struct ManagedProcess {
    spec: ServiceSpec,
    child: Child,
    state: ProcessState,
    ready: bool,
}

impl ManagedProcess {
    /// Spawn the service with piped output. Both pipes are pumped into
    /// `chunks` by background tasks, one per pipe. A spawn failure leaves
    /// no process behind and surfaces as [`DevServerError::Spawn`].
    pub fn spawn(
        spec: ServiceSpec,
        chunks: mpsc::Sender<OutputChunk>,
    ) -> Result<Self, DevServerError> {
        debug!(role = %spec.role, command = %spec.command, "spawn requested");

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| DevServerError::Spawn {
            role: spec.role,
            command: spec.command.clone(),
            source,
        })?;

        if let Some(stdout) = child.stdout.take() {
            pump(spec.role, OutputStream::Stdout, stdout, chunks.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            pump(spec.role, OutputStream::Stderr, stderr, chunks);
        }

        debug!(role = %spec.role, pid = ?child.id(), "process running");
        Ok(Self {
            spec,
            child,
            state: ProcessState::Running,
            ready: false,
        })
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    pub fn role(&self) -> ServiceRole {
        self.spec.role
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Record the readiness signal. Sticky: stays `true` for the rest of
    /// the session regardless of later state transitions.
    pub fn mark_ready(&mut self) {
        self.ready = true;
        self.advance(ProcessState::ReadyDetected);
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Send the termination signal. Idempotent: repeated calls return
    /// `false` without touching the OS again, and a process that already
    /// exited on its own is a no-op rather than an error.
    pub async fn terminate(&mut self) -> bool {
        if self.state == ProcessState::Terminated {
            return false;
        }

        // Terminated means "signal issued", not "OS process reaped".
        if let Err(err) = self.child.start_kill() {
            // An already-exited child reports an error here; that is the
            // no-op case.
            debug!(role = %self.spec.role, %err, "kill skipped");
        }
        self.advance(ProcessState::Terminated);

        // Reap so the child does not linger as a zombie while the rest of
        // the session shuts down.
        match tokio::time::timeout(REAP_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => debug!(role = %self.spec.role, %status, "process exited"),
            Ok(Err(err)) => warn!(role = %self.spec.role, %err, "wait failed"),
            Err(_) => warn!(role = %self.spec.role, "process did not exit after kill"),
        }
        true
    }

    fn advance(&mut self, next: ProcessState) {
        if next > self.state {
            debug!(role = %self.spec.role, from = ?self.state, to = ?next, "state transition");
            self.state = next;
        }
    }
}

/// Read one pipe to EOF in fixed-size chunks, forwarding each into the
/// session's channel. Chunk boundaries are whatever the OS returns; the
/// readiness detector is responsible for reassembly.
fn pump<R>(role: ServiceRole, stream: OutputStream, mut reader: R, chunks: mpsc::Sender<OutputChunk>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; PUMP_BUF_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let chunk = OutputChunk { role, stream, text };
                    if chunks.send(chunk).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(%role, ?stream, "output pipe closed");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_spec(script: &str) -> ServiceSpec {
        ServiceSpec {
            role: ServiceRole::Backend,
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: std::env::temp_dir(),
            ready_marker: "ready".to_string(),
            endpoint: "http://localhost:8000".to_string(),
            noise_patterns: Vec::new(),
        }
    }

    #[tokio::test]
    async fn spawn_pumps_output_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        let process = ManagedProcess::spawn(shell_spec("echo hello"), tx).unwrap();
        assert_eq!(process.state(), ProcessState::Running);

        let chunk = rx.recv().await.expect("expected one chunk");
        assert_eq!(chunk.role, ServiceRole::Backend);
        assert!(chunk.text.contains("hello"));
    }

    #[tokio::test]
    async fn spawn_failure_is_an_error_not_a_panic() {
        let (tx, _rx) = mpsc::channel(8);
        let mut spec = shell_spec("true");
        spec.command = "stackgen-no-such-binary".to_string();

        let err = ManagedProcess::spawn(spec, tx).expect_err("spawn should fail");
        assert!(matches!(
            err,
            DevServerError::Spawn {
                role: ServiceRole::Backend,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn terminate_is_issued_at_most_once() {
        let (tx, _rx) = mpsc::channel(8);
        let mut process = ManagedProcess::spawn(shell_spec("exec sleep 30"), tx).unwrap();

        assert!(process.terminate().await);
        assert_eq!(process.state(), ProcessState::Terminated);
        assert!(!process.terminate().await);
        assert_eq!(process.state(), ProcessState::Terminated);
    }

    #[tokio::test]
    async fn terminate_after_natural_exit_does_not_error() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut process = ManagedProcess::spawn(shell_spec("echo done"), tx).unwrap();

        // Wait for EOF so the process has certainly exited.
        while rx.recv().await.is_some() {}

        assert!(process.terminate().await);
        assert_eq!(process.state(), ProcessState::Terminated);
    }

    #[tokio::test]
    async fn readiness_is_sticky_across_termination() {
        let (tx, _rx) = mpsc::channel(8);
        let mut process = ManagedProcess::spawn(shell_spec("exec sleep 30"), tx).unwrap();

        process.mark_ready();
        assert_eq!(process.state(), ProcessState::ReadyDetected);
        process.terminate().await;
        assert!(process.is_ready());
        assert_eq!(process.state(), ProcessState::Terminated);
    }
}
