//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] stops the accept loop and tells open connections to
//! finish their current request. A [`ConnectionTracker`] lets the server
//! wait for those connections, up to the shutdown timeout.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// A cloneable, trigger-once shutdown flag.
///
/// ```rust
/// use lite_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let clone = shutdown.clone();
/// shutdown.trigger();
/// assert!(clone.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers shutdown. Later calls do nothing.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // no receivers is fine
            let _ = self.sender.send(());
        }
    }

    /// Whether shutdown was triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Completes once shutdown is triggered, immediately if it already was.
    pub async fn recv(&self) {
        // subscribed before the check so a trigger in between is not missed
        let mut receiver = self.sender.subscribe();
        if self.is_shutdown() {
            return;
        }
        let _ = receiver.recv().await;
    }

    /// A signal triggered by SIGTERM or Ctrl+C.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    _ = ctrl_c() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for SIGTERM, using Ctrl+C only");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(err) => {
            tracing::warn!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Completes when no connection is open.
    pub async fn wait_idle(&self) {
        loop {
            // registered before the check so a drop in between is not missed
            let notified = self.notify.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held for the lifetime of a connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_is_idempotent_and_shared() {
        let signal = ShutdownSignal::default();
        let clone = signal.clone();
        assert!(!clone.is_shutdown());
        signal.trigger();
        signal.trigger();
        assert!(clone.is_shutdown());
    }

    #[tokio::test]
    async fn recv_completes_when_triggered() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");

        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("an already triggered signal completes at once");
    }

    #[tokio::test]
    async fn tracker_waits_for_the_last_token() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(10), tracker.wait_idle())
            .await
            .expect("idle tracker completes at once");

        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);
        drop(first);
        assert_eq!(tracker.active_connections(), 1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(second);
        });
        tokio::time::timeout(Duration::from_secs(1), tracker.wait_idle())
            .await
            .expect("wait should complete");
        assert_eq!(tracker.active_connections(), 0);
    }
}
