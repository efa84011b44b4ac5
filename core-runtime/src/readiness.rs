//! # Startup Readiness Tracking
//!
//! Counts outstanding asynchronous startup work so hosts can wait for the
//! core to become fully ready.
//!
//! ## Overview
//!
//! A [`StartupGate`] hands out [`ReadinessTicket`]s, one per unit of pending
//! work (typically one per asset decode). Each ticket is completed exactly
//! once, either explicitly via [`ReadinessTicket::complete`] or implicitly
//! when dropped. [`StartupGate::wait_ready`] resolves once every issued
//! ticket has completed.
//!
//! Waiting is optional. Playback requests made before the gate opens are
//! handled by the deferred-trigger machinery; the gate only exists for hosts
//! that want a "sounds loaded" signal, e.g. to sequence a startup chime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
struct GateInner {
    pending: watch::Sender<usize>,
}

/// Tracks how many units of startup work are still outstanding.
///
/// Cloning the gate is cheap; clones observe the same counter.
#[derive(Debug, Clone)]
pub struct StartupGate {
    inner: Arc<GateInner>,
}

impl StartupGate {
    /// Creates a gate with no outstanding work.
    pub fn new() -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            inner: Arc::new(GateInner { pending }),
        }
    }

    /// Registers one unit of pending work and returns its ticket.
    pub fn ticket(&self) -> ReadinessTicket {
        self.inner.pending.send_modify(|n| *n += 1);
        ReadinessTicket {
            inner: Arc::clone(&self.inner),
            fired: AtomicBool::new(false),
        }
    }

    /// Number of tickets not yet completed.
    pub fn pending(&self) -> usize {
        *self.inner.pending.borrow()
    }

    /// Resolves once every issued ticket has completed.
    ///
    /// Returns immediately when nothing is pending. Tickets issued after
    /// this call resolves are not waited on.
    pub async fn wait_ready(&self) {
        let mut rx = self.inner.pending.subscribe();
        loop {
            if *rx.borrow_and_update() == 0 {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for StartupGate {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of pending startup work.
///
/// Completes at most once; dropping an incomplete ticket completes it.
#[derive(Debug)]
pub struct ReadinessTicket {
    inner: Arc<GateInner>,
    fired: AtomicBool,
}

impl ReadinessTicket {
    /// Marks this unit of work as done. Idempotent.
    pub fn complete(&self) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            self.inner.pending.send_modify(|n| *n = n.saturating_sub(1));
        }
    }

    /// Whether this ticket has already completed.
    pub fn is_complete(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl Drop for ReadinessTicket {
    fn drop(&mut self) {
        self.complete();
    }
}
