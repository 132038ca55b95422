//! Refresh gating for the build view.
//!
//! Once a build is on screen, the view must not jump to a newer build on its
//! own: the gate holds the newer id and surfaces a dismissible notification
//! until the user accepts. Modeled as an explicit two-state machine
//! (Settled/Pending) so the transitions are testable without any stream
//! plumbing; [`GateDriver`] adapts it to channel-based wiring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use slipway_core::BuildId;

/// The notification shown while a newer build waits for acceptance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastNotice {
    /// When the notice was first raised. Not reset when the held id is
    /// replaced, so a visible countdown never restarts.
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    held: BuildId,
    notice: ToastNotice,
}

/// Two-state gate between the upstream build-id sequence and the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastGate {
    gating_enabled: bool,
    settled: Option<BuildId>,
    pending: Option<Pending>,
}

impl ToastGate {
    pub fn new(gating_enabled: bool) -> Self {
        Self {
            gating_enabled,
            settled: None,
            pending: None,
        }
    }

    /// Offer a new id from upstream. Returns the id to show when it passes
    /// through; `None` while the gate holds it.
    pub fn offer(&mut self, id: BuildId, now: DateTime<Utc>) -> Option<BuildId> {
        // The first id ever observed is never gated.
        if self.settled.is_none() && self.pending.is_none() {
            self.settled = Some(id);
            return Some(id);
        }

        if self.settled == Some(id) && self.pending.is_none() {
            // Redundant refresh of the build already on screen.
            return None;
        }

        if let Some(pending) = self.pending.as_mut() {
            // Collapse to latest; keep the original notice timestamp.
            pending.held = id;
            return None;
        }

        if !self.gating_enabled {
            self.settled = Some(id);
            return Some(id);
        }

        self.pending = Some(Pending {
            held: id,
            notice: ToastNotice { raised_at: now },
        });
        None
    }

    /// User accepted the notification: emit the held id and settle on it.
    pub fn accept(&mut self) -> Option<BuildId> {
        let pending = self.pending.take()?;
        self.settled = Some(pending.held);
        Some(pending.held)
    }

    /// User dismissed the notification: drop the held id and stay on the
    /// confirmed build. A later newer id raises a fresh notice.
    pub fn dismiss(&mut self) {
        self.pending = None;
    }

    /// The notice currently shown, if any.
    pub fn notice(&self) -> Option<&ToastNotice> {
        self.pending.as_ref().map(|pending| &pending.notice)
    }

    /// The confirmed build the view is showing.
    pub fn current(&self) -> Option<BuildId> {
        self.settled
    }

    /// True while a newer id waits for acceptance.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Owns the driver task for one view subscription; aborts it on drop.
#[derive(Debug)]
pub struct GateDriverHandle {
    task: JoinHandle<()>,
}

impl Drop for GateDriverHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Channel adapter around [`ToastGate`].
///
/// Consumes the upstream id sequence and user accept signals, publishes the
/// confirmed build id and the toast state over watch channels. The task ends
/// when the upstream closes, releasing everything it holds.
pub struct GateDriver;

impl GateDriver {
    pub fn spawn(
        mut gate: ToastGate,
        mut upstream: mpsc::Receiver<BuildId>,
        mut accepts: mpsc::Receiver<()>,
    ) -> (
        GateDriverHandle,
        watch::Receiver<Option<BuildId>>,
        watch::Receiver<Option<ToastNotice>>,
    ) {
        let (current_tx, current_rx) = watch::channel(None);
        let (notice_tx, notice_rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut accepts_open = true;
            loop {
                tokio::select! {
                    maybe_id = upstream.recv() => {
                        let Some(id) = maybe_id else { break };
                        if let Some(emit) = gate.offer(id, Utc::now()) {
                            let _ = current_tx.send(Some(emit));
                        }
                        let _ = notice_tx.send(gate.notice().cloned());
                    }
                    maybe_accept = accepts.recv(), if accepts_open => {
                        match maybe_accept {
                            Some(()) => {
                                if let Some(emit) = gate.accept() {
                                    let _ = current_tx.send(Some(emit));
                                }
                                let _ = notice_tx.send(None);
                            }
                            None => accepts_open = false,
                        }
                    }
                }
            }
        });

        (GateDriverHandle { task }, current_rx, notice_rx)
    }
}
