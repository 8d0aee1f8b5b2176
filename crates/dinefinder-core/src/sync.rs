//! Deferred sync triggering.
//!
//! Mutations never talk to the server directly; they arm a [`SyncScheduler`]
//! and return. When the armed event later fires - here, when a worker drains
//! the channel - the matching synchronize routine on the service replays the
//! dirty records. Arming is fire-and-forget: repeated arms before the event
//! fires may coalesce into a single run.

use std::collections::BTreeSet;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::service::DirectoryService;

/// The two deferrable sync events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncEvent {
    Restaurants,
    Reviews,
}

impl SyncEvent {
    /// Stable event name, used in registrations and logs.
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::Restaurants => "syncRemoteRestaurant",
            SyncEvent::Reviews => "syncRemoteReview",
        }
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deferred task scheduler capability: arming schedules one future run of
/// the matching synchronize routine. Fulfilled by timers, message queues,
/// or platform background-task APIs; the service only ever calls `arm`.
pub trait SyncScheduler: Send + Sync {
    fn arm(&self, event: SyncEvent);
}

/// Scheduler that drops every arm. For read-only wiring and tests.
pub struct NoopScheduler;

impl SyncScheduler for NoopScheduler {
    fn arm(&self, _event: SyncEvent) {}
}

/// Capacity of the pending-event queue. Only two event kinds exist; a full
/// queue means matching runs are already pending and the arm can coalesce.
const CHANNEL_CAPACITY: usize = 8;

/// Queue-backed scheduler: arms enqueue events for a drain loop to run.
pub struct ChannelScheduler {
    tx: mpsc::Sender<SyncEvent>,
}

impl ChannelScheduler {
    /// Returns the scheduler and the receiver to drain events from.
    pub fn new() -> (Self, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }
}

impl SyncScheduler for ChannelScheduler {
    fn arm(&self, event: SyncEvent) {
        match self.tx.try_send(event) {
            Ok(()) => debug!(event = %event, "Sync armed"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(event = %event, "Sync already pending, arm coalesced")
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(event = %event, "No sync worker listening, arm dropped")
            }
        }
    }
}

/// Fire every currently queued event once, coalescing duplicates.
///
/// Sync failures are logged and swallowed: the affected records keep their
/// dirty flag and are retried when the event is next armed.
pub async fn drain_pending(service: &DirectoryService, rx: &mut mpsc::Receiver<SyncEvent>) {
    let mut pending = BTreeSet::new();
    while let Ok(event) = rx.try_recv() {
        pending.insert(event);
    }

    for event in pending {
        let result = match event {
            SyncEvent::Restaurants => service.synchronize_restaurants().await,
            SyncEvent::Reviews => service.synchronize_reviews().await,
        };
        match result {
            Ok(synced) => debug!(event = %event, synced, "Sync complete"),
            Err(e) => error!(event = %event, error = %e, "Sync failed, records left pending"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
