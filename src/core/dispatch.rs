//! Post-commit side effects
//!
//! Notifications and events are emitted only after the store has committed the
//! mutation they describe. Delivery is best-effort: a failing sink, a failing
//! publisher or a full queue is logged and never changes the operation result.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::traits::{EventPublisher, NotificationSink};
use crate::types::{AccountId, NotificationKind, Priority};

/// A side effect produced by a committed ledger operation
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Notify {
        account: AccountId,
        message: String,
        kind: NotificationKind,
        priority: Priority,
    },
    Publish {
        topic: String,
        message: String,
    },
}

impl SideEffect {
    fn label(&self) -> &'static str {
        match self {
            SideEffect::Notify { .. } => "notification",
            SideEffect::Publish { .. } => "event",
        }
    }
}

/// Deliver one side effect, logging any failure
pub fn deliver(effect: SideEffect, sink: &dyn NotificationSink, publisher: &dyn EventPublisher) {
    let result = match &effect {
        SideEffect::Notify {
            account,
            message,
            kind,
            priority,
        } => sink.notify(*account, message, *kind, *priority),
        SideEffect::Publish { topic, message } => publisher.publish(topic, message),
    };

    if let Err(e) = result {
        warn!(effect = effect.label(), error = %e, "side effect delivery failed");
    }
}

/// Where engines send their post-commit side effects
#[derive(Clone)]
pub enum EffectDispatcher {
    /// Deliver on the calling thread right after the commit
    Inline {
        sink: Arc<dyn NotificationSink>,
        publisher: Arc<dyn EventPublisher>,
    },

    /// Hand off to a bounded queue drained by a background worker
    Queued(mpsc::Sender<SideEffect>),
}

impl EffectDispatcher {
    pub fn inline(sink: Arc<dyn NotificationSink>, publisher: Arc<dyn EventPublisher>) -> Self {
        EffectDispatcher::Inline { sink, publisher }
    }

    /// Emit `effect` without ever blocking or failing
    pub fn dispatch(&self, effect: SideEffect) {
        match self {
            EffectDispatcher::Inline { sink, publisher } => {
                deliver(effect, sink.as_ref(), publisher.as_ref())
            }
            EffectDispatcher::Queued(sender) => match sender.try_send(effect) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(effect)) => {
                    warn!(effect = effect.label(), "side effect dropped: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(effect)) => {
                    debug!(effect = effect.label(), "side effect queue closed");
                }
            },
        }
    }

    /// Convenience for a batch of effects in order
    pub fn dispatch_all(&self, effects: impl IntoIterator<Item = SideEffect>) {
        for effect in effects {
            self.dispatch(effect);
        }
    }
}

impl std::fmt::Debug for EffectDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectDispatcher::Inline { .. } => f.write_str("EffectDispatcher::Inline"),
            EffectDispatcher::Queued(sender) => f
                .debug_struct("EffectDispatcher::Queued")
                .field("capacity", &sender.capacity())
                .finish(),
        }
    }
}
