//! Ledger configuration
//!
//! Runtime knobs shared by the ledger and loan engines. The CLI fills them from
//! flags or `LEDGER_*` environment variables.

use tracing::warn;

use crate::types::Money;

/// Balance below which a withdrawal or transfer raises a HIGH-priority alert
pub const DEFAULT_LOW_BALANCE_THRESHOLD: Money = Money::from_cents(10_000);

/// Topic ledger events are published on
pub const DEFAULT_EVENT_TOPIC: &str = "transaction-events";

/// Bound on queued side effects before new ones are dropped
pub const DEFAULT_EFFECT_QUEUE_CAPACITY: usize = 1024;

/// Configuration for the ledger and loan engines
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// Post-operation balance strictly below this triggers a low-balance notification
    pub low_balance_threshold: Money,

    /// Topic passed to the event publisher
    pub event_topic: String,

    /// Capacity of the queued side-effect channel
    pub effect_queue_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            low_balance_threshold: DEFAULT_LOW_BALANCE_THRESHOLD,
            event_topic: DEFAULT_EVENT_TOPIC.to_string(),
            effect_queue_capacity: DEFAULT_EFFECT_QUEUE_CAPACITY,
        }
    }
}

impl LedgerConfig {
    /// Create a LedgerConfig, replacing invalid values with defaults
    ///
    /// A negative threshold, a blank topic or a zero capacity is logged and
    /// replaced by its default.
    pub fn new(low_balance_threshold: Money, event_topic: &str, effect_queue_capacity: usize) -> Self {
        let default = Self::default();

        let low_balance_threshold = if low_balance_threshold.is_negative() {
            warn!(
                "Invalid low_balance_threshold ({}), using default ({})",
                low_balance_threshold, default.low_balance_threshold
            );
            default.low_balance_threshold
        } else {
            low_balance_threshold
        };

        let event_topic = if event_topic.trim().is_empty() {
            warn!("Empty event_topic, using default ({})", default.event_topic);
            default.event_topic
        } else {
            event_topic.trim().to_string()
        };

        let effect_queue_capacity = if effect_queue_capacity == 0 {
            warn!(
                "Invalid effect_queue_capacity ({}), using default ({})",
                effect_queue_capacity, default.effect_queue_capacity
            );
            default.effect_queue_capacity
        } else {
            effect_queue_capacity
        };

        Self {
            low_balance_threshold,
            event_topic,
            effect_queue_capacity,
        }
    }
}
