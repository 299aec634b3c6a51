//! Background delivery of queued side effects
//!
//! The worker owns the receiving end of the bounded side-effect queue and
//! delivers each effect to the notification sink or event publisher. It stops
//! once every [`EffectDispatcher`] clone has been dropped and the queue is
//! drained.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::dispatch::{deliver, EffectDispatcher, SideEffect};
use crate::core::traits::{EventPublisher, NotificationSink};

/// Spawn the side-effect worker on the current tokio runtime
///
/// # Arguments
///
/// * `sink` - Receiver of notifications
/// * `publisher` - Receiver of ledger events
/// * `capacity` - Queue bound; effects beyond it are dropped with a warning
///
/// # Returns
///
/// A queued dispatcher for the engines, and the worker handle. The handle
/// resolves to the number of effects processed once the queue closes.
///
/// # Panics
///
/// Panics if called outside a tokio runtime, or if `capacity` is zero.
pub fn spawn_effect_worker(
    sink: Arc<dyn NotificationSink>,
    publisher: Arc<dyn EventPublisher>,
    capacity: usize,
) -> (EffectDispatcher, JoinHandle<usize>) {
    let (sender, mut receiver) = mpsc::channel::<SideEffect>(capacity);

    let handle = tokio::spawn(async move {
        let mut processed = 0;
        while let Some(effect) = receiver.recv().await {
            deliver(effect, sink.as_ref(), publisher.as_ref());
            processed += 1;
        }
        debug!(processed, "side effect worker stopped");
        processed
    });

    (EffectDispatcher::Queued(sender), handle)
}
