//! Interrupt wiring for the dev-server session.
//!
//! The session owns exactly one interrupt registration. [`Interrupt::ctrl_c`]
//! installs the process-wide Ctrl-C handler once and forwards the first
//! signal into a watch channel; once installed, the handler stays installed
//! for the life of the process, so any further Ctrl-C is absorbed instead of
//! falling back to the OS default disposition mid-shutdown.
//! [`Interrupt::manual`] provides the same surface without touching process
//! signal state, for tests and embedding.

use tokio::sync::watch;
use tracing::debug;

/// Receiving side of the session's single interrupt registration.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Install the process-wide Ctrl-C handler and forward the first signal.
    pub fn ctrl_c() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt signal received");
                let _ = tx.send(true);
            }
        });
        Self { rx }
    }

    /// An interrupt that fires when the paired trigger is pulled.
    pub fn manual() -> (InterruptTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger { tx }, Self { rx })
    }

    /// Wait until the interrupt has fired. Returns immediately if it
    /// already has; later signals do not make it fire twice.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // The handler task is gone without ever firing; nothing can
                // arrive anymore, so park instead of reporting a phantom
                // interrupt.
                std::future::pending::<()>().await;
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Fires the paired [`Interrupt`]. Safe to pull any number of times; only
/// the first pull is observable.
#[derive(Debug, Clone)]
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

impl InterruptTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_trigger_fires_once_and_stays_fired() {
        let (trigger, mut interrupt) = Interrupt::manual();
        assert!(!interrupt.is_triggered());

        trigger.trigger();
        trigger.trigger();

        interrupt.triggered().await;
        assert!(interrupt.is_triggered());
        // A second wait must return immediately rather than hang.
        interrupt.triggered().await;
    }
}
