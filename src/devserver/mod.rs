//! Development-server orchestration.
//!
//! [`DevSession`] owns the two dev-server processes for a generated
//! project. Startup is strictly ordered: the backend is spawned first and
//! the frontend only once the backend's readiness marker has appeared: a
//! barrier with a bounded timeout, not a fixed sleep. When both services
//! are ready a single consolidated report is printed, and the session then
//! blocks, relaying diagnostics, until the operator interrupts it.
//! Shutdown terminates every tracked process exactly once, no matter how
//! many times it is requested.

mod interrupt;
mod process;
mod readiness;

pub use interrupt::{Interrupt, InterruptTrigger};
pub use process::{
    ManagedProcess, OutputChunk, OutputStream, ProcessState, ServiceRole, ServiceSpec,
    ANGULAR_READY_MARKER, LARAVEL_READY_MARKER,
};
pub use readiness::{NoiseFilter, ReadinessDetector};

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::ui;

/// Capacity of the session's chunk channel. Small on purpose: if the event
/// loop ever stalls, backpressure reaches the pump tasks instead of output
/// buffering without bound.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// Default wait for each service's readiness marker.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Error)]
pub enum DevServerError {
    #[error("failed to start the {role} dev server (`{command}`): {source}")]
    Spawn {
        role: ServiceRole,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("the {role} dev server did not become ready within {}s", .timeout.as_secs())]
    ReadyTimeout { role: ServiceRole, timeout: Duration },
}

/// Configuration for one dev-server session.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    pub backend: ServiceSpec,
    pub frontend: ServiceSpec,
    /// Display name of the project database, shown in the ready report.
    pub database_label: String,
    /// How long to wait for each service's readiness marker.
    pub ready_timeout: Duration,
}

/// How a startup attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Both services became ready and the consolidated report was emitted.
    Online,
    /// The operator interrupted before both services were ready.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Armed,
    ShuttingDown,
    Done,
}

enum Event {
    Interrupted,
    DeadlineLapsed,
    Chunk(OutputChunk),
}

struct TrackedService {
    process: ManagedProcess,
    detector: ReadinessDetector,
    noise: NoiseFilter,
}

/// One run of the dev servers, from first spawn to final teardown.
pub struct DevSession {
    config: DevServerConfig,
    /// Insertion order is the required startup order.
    services: Vec<TrackedService>,
    chunk_tx: mpsc::Sender<OutputChunk>,
    chunk_rx: mpsc::Receiver<OutputChunk>,
    interrupt: Interrupt,
    shutdown: ShutdownState,
    report_emitted: bool,
}

/// Run a full session wired to the process-wide Ctrl-C handler.
pub async fn run(config: DevServerConfig) -> Result<(), DevServerError> {
    DevSession::new(config).run().await
}

impl DevSession {
    pub fn new(config: DevServerConfig) -> Self {
        Self::with_interrupt(config, Interrupt::ctrl_c())
    }

    /// Session with a caller-supplied interrupt; tests pair this with
    /// [`Interrupt::manual`].
    pub fn with_interrupt(config: DevServerConfig, interrupt: Interrupt) -> Self {
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        Self {
            config,
            services: Vec::new(),
            chunk_tx,
            chunk_rx,
            interrupt,
            shutdown: ShutdownState::Armed,
            report_emitted: false,
        }
    }

    /// Run the whole session: ordered startup, ready report, hold until
    /// interrupt, teardown. Only returns once every tracked process has
    /// had its termination issued.
    pub async fn run(mut self) -> Result<(), DevServerError> {
        let result = self.start().await;
        if matches!(result, Ok(Startup::Online)) {
            self.hold().await;
        }
        self.shutdown().await;
        result.map(|_| ())
    }

    /// Drive the startup protocol: backend, readiness barrier, frontend,
    /// both-ready report. On failure the caller still owns every process
    /// started so far and must run [`DevSession::shutdown`].
    pub async fn start(&mut self) -> Result<Startup, DevServerError> {
        let backend = self.config.backend.clone();
        let frontend = self.config.frontend.clone();

        self.launch(backend)?;
        if let Waited::Interrupted = self.await_ready(ServiceRole::Backend).await? {
            return Ok(Startup::Interrupted);
        }

        self.launch(frontend)?;
        if let Waited::Interrupted = self.await_ready(ServiceRole::Frontend).await? {
            return Ok(Startup::Interrupted);
        }

        Ok(Startup::Online)
    }

    /// Relay diagnostics until the operator interrupts the session.
    pub async fn hold(&mut self) {
        info!("session online, waiting for interrupt");
        loop {
            match self.next_event(None).await {
                Event::Interrupted => return,
                Event::DeadlineLapsed => {}
                Event::Chunk(chunk) => self.handle_chunk(chunk),
            }
        }
    }

    /// Terminate every tracked process. Idempotent: a second request while
    /// teardown is in progress, or after it finished, does nothing.
    pub async fn shutdown(&mut self) {
        if self.shutdown != ShutdownState::Armed {
            debug!("shutdown already requested, ignoring");
            return;
        }
        self.shutdown = ShutdownState::ShuttingDown;

        if !self.services.is_empty() {
            ui::warn("Stopping development servers...");
        }
        for service in &mut self.services {
            if service.process.terminate().await {
                info!(role = %service.process.role(), "terminate signal sent");
            }
        }
        self.shutdown = ShutdownState::Done;

        if !self.services.is_empty() {
            ui::success("Servers stopped");
        }
    }

    pub fn report_emitted(&self) -> bool {
        self.report_emitted
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown == ShutdownState::Done
    }

    pub fn state_of(&self, role: ServiceRole) -> Option<ProcessState> {
        self.service(role).map(|s| s.process.state())
    }

    pub fn is_ready(&self, role: ServiceRole) -> bool {
        self.service(role)
            .map(|s| s.process.is_ready())
            .unwrap_or(false)
    }

    fn service(&self, role: ServiceRole) -> Option<&TrackedService> {
        self.services.iter().find(|s| s.process.role() == role)
    }

    fn launch(&mut self, spec: ServiceSpec) -> Result<(), DevServerError> {
        ui::step(&format!(
            "Starting {} ({}) dev server on {}",
            spec.role,
            spec.role.framework(),
            spec.endpoint
        ));

        let detector = ReadinessDetector::new(spec.ready_marker.clone());
        let noise = NoiseFilter::new(spec.noise_patterns.clone());
        let process = ManagedProcess::spawn(spec, self.chunk_tx.clone())?;
        info!(role = %process.role(), "service process started");

        self.services.push(TrackedService {
            process,
            detector,
            noise,
        });
        Ok(())
    }

    /// Drain output until `role` reports ready, the deadline lapses, or
    /// the operator interrupts.
    async fn await_ready(&mut self, role: ServiceRole) -> Result<Waited, DevServerError> {
        let deadline = Instant::now() + self.config.ready_timeout;
        loop {
            if self.is_ready(role) {
                return Ok(Waited::Ready);
            }
            match self.next_event(Some(deadline)).await {
                Event::Interrupted => return Ok(Waited::Interrupted),
                Event::DeadlineLapsed => {
                    return Err(DevServerError::ReadyTimeout {
                        role,
                        timeout: self.config.ready_timeout,
                    });
                }
                Event::Chunk(chunk) => self.handle_chunk(chunk),
            }
        }
    }

    async fn next_event(&mut self, deadline: Option<Instant>) -> Event {
        match deadline {
            Some(deadline) => tokio::select! {
                _ = self.interrupt.triggered() => Event::Interrupted,
                _ = tokio::time::sleep_until(deadline) => Event::DeadlineLapsed,
                chunk = self.chunk_rx.recv() => {
                    // The session keeps its own sender, so the channel
                    // cannot close.
                    Event::Chunk(chunk.expect("session holds a chunk sender"))
                }
            },
            None => tokio::select! {
                _ = self.interrupt.triggered() => Event::Interrupted,
                chunk = self.chunk_rx.recv() => {
                    Event::Chunk(chunk.expect("session holds a chunk sender"))
                }
            },
        }
    }

    fn handle_chunk(&mut self, chunk: OutputChunk) {
        let Some(idx) = self
            .services
            .iter()
            .position(|s| s.process.role() == chunk.role)
        else {
            return;
        };

        // Surface non-noise stderr lines as diagnostics.
        if chunk.stream == OutputStream::Stderr {
            for line in chunk.text.lines() {
                if !line.trim().is_empty() && !self.services[idx].noise.is_noise(line) {
                    ui::service_diagnostic(chunk.role, line);
                }
            }
        }

        // Noise filtering applies to reporting only; every chunk is
        // scanned for the marker.
        if self.services[idx].detector.observe(&chunk.text) {
            let service = &mut self.services[idx];
            service.process.mark_ready();
            info!(role = %chunk.role, marker = service.detector.marker(), "readiness marker detected");
            ui::service_ready(chunk.role, &service.process.spec().endpoint);
            self.maybe_emit_report();
        }
    }

    /// Emit the consolidated report the first time every service is ready.
    fn maybe_emit_report(&mut self) {
        if self.report_emitted {
            return;
        }
        // The session tracks exactly the backend and the frontend.
        if self.services.len() < 2 || !self.services.iter().all(|s| s.process.is_ready()) {
            return;
        }
        self.report_emitted = true;

        let entries: Vec<(String, String)> = self
            .services
            .iter()
            .map(|s| {
                let spec = s.process.spec();
                (
                    format!("{} ({})", spec.role, spec.role.framework()),
                    spec.endpoint.clone(),
                )
            })
            .collect();
        ui::ready_report(&entries, &self.config.database_label);
    }
}

enum Waited {
    Ready,
    Interrupted,
}
