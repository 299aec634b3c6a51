//! Event publisher implementations

use std::sync::{Mutex, PoisonError};
use tracing::info;

use crate::core::traits::EventPublisher;
use crate::types::DeliveryError;

/// Log target events are written under
pub const EVENT_LOG_TARGET: &str = "transaction-logger";

/// Publishes each event as a structured log line
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, topic: &str, message: &str) -> Result<(), DeliveryError> {
        info!(target: EVENT_LOG_TARGET, topic, message, "ledger event");
        Ok(())
    }
}

/// Records published `(topic, message)` pairs in memory
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    messages: Mutex<Vec<(String, String)>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages published on `topic`
    pub fn messages_on(&self, topic: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl EventPublisher for InMemoryEventLog {
    fn publish(&self, topic: &str, message: &str) -> Result<(), DeliveryError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), message.to_string()));
        Ok(())
    }
}
