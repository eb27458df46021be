//! Fast-send distribution — throttled tile pushes to viewers.
//!
//! DESIGN
//! ======
//! Surfaces flagged fast-send are pushed proactively instead of waiting for
//! viewers to request them. A periodic worker drains the pending set in FIFO
//! order, at most `send_batch` ids per tick, so a large placement cannot
//! flood the transport. Enqueueing is membership-checked: an id already
//! pending is not queued twice, and each enqueue yields at most one send.
//!
//! TRADE-OFFS
//! ==========
//! There is no backpressure signal from the transport. Slow sends simply let
//! the pending set grow, bounded only by `queue_limit`; ids past the limit
//! are dropped with a warning rather than stalling placement.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::host::SurfaceId;
use crate::state::AppState;

// =============================================================================
// SEND QUEUE
// =============================================================================

/// FIFO pending set with idempotent insert.
#[derive(Clone)]
pub struct SendQueue {
    inner: Arc<Mutex<SendQueueInner>>,
    limit: usize,
}

struct SendQueueInner {
    order: VecDeque<SurfaceId>,
    members: HashSet<SurfaceId>,
}

impl SendQueue {
    #[must_use]
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SendQueueInner {
                order: VecDeque::new(),
                members: HashSet::new(),
            })),
            limit,
        }
    }

    /// Queue a surface for the next batch. Returns false when the id is
    /// already pending or the queue is full.
    pub fn enqueue(&self, id: SurfaceId) -> bool {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.members.contains(&id) {
            return false;
        }
        if inner.order.len() >= self.limit {
            warn!(surface = id, limit = self.limit, "fast-send queue full; dropping surface");
            return false;
        }
        inner.members.insert(id);
        inner.order.push_back(id);
        true
    }

    /// Remove and return up to `max` ids, oldest first.
    pub fn drain(&self, max: usize) -> Vec<SurfaceId> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut batch = Vec::with_capacity(max.min(inner.order.len()));
        while batch.len() < max {
            let Some(id) = inner.order.pop_front() else {
                break;
            };
            inner.members.remove(&id);
            batch.push(id);
        }
        batch
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .order
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// Spawn the periodic fast-send worker. Returns a handle for shutdown.
pub fn spawn_fastsend_task(state: AppState) -> JoinHandle<()> {
    info!(
        period = ?state.config.send_period,
        batch = state.config.send_batch,
        "fast-send worker configured"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.send_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; consume it so the
        // first batch goes out one full period after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            send_pending_batch(&state);
        }
    })
}

/// Dispatch one batch: drain up to `send_batch` ids and push each to viewers.
/// An empty pending set makes the tick a no-op.
fn send_pending_batch(state: &AppState) {
    let batch = state.send_queue.drain(state.config.send_batch);
    if batch.is_empty() {
        return;
    }
    for id in &batch {
        state.host.push_to_viewers(*id);
    }
    debug!(count = batch.len(), remaining = state.send_queue.len(), "fast-send batch dispatched");
}

#[cfg(test)]
pub(crate) fn send_pending_batch_for_tests(state: &AppState) {
    send_pending_batch(state);
}

#[cfg(test)]
#[path = "fastsend_test.rs"]
mod tests;
