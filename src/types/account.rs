//! Account-related types
//!
//! An [`Account`] is a value snapshot read from the ledger store. The engine never
//! keeps one across calls; every operation re-reads the account under its lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::money::Money;

/// Opaque account identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        AccountId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        AccountId(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Customer account state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    /// Unique login name, immutable after creation
    pub username: String,

    /// Credential hash computed outside the ledger; `None` for accounts opened
    /// without a credential (CLI replays)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Current balance
    ///
    /// Never negative as a result of a ledger operation.
    pub balance: Money,

    pub created_at: DateTime<Utc>,

    /// Optimistic concurrency version, bumped by the store on every save
    pub version: u64,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(username: &str, password_hash: Option<String>, created_at: DateTime<Utc>) -> Self {
        Account {
            id: AccountId::new(),
            username: username.to_string(),
            password_hash,
            balance: Money::ZERO,
            created_at,
            version: 0,
        }
    }
}
