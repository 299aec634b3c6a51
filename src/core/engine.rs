//! Account ledger engine
//!
//! This module provides the [`LedgerEngine`] that performs every balance
//! mutation: deposits, withdrawals and transfers between two accounts.
//!
//! The engine enforces business rules such as:
//! - Amounts must be strictly positive with at most two decimal places
//! - A debit never takes a balance below zero
//! - A transfer commits both sides or neither
//!
//! # Concurrency
//!
//! Each mutation holds its account lock (both locks, smaller id first, for a
//! transfer) from the balance read through the commit. Notifications and events
//! are dispatched after the lock is released, so a slow sink never extends the
//! critical section.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::LedgerConfig;
use crate::core::clock::Clock;
use crate::core::dispatch::{EffectDispatcher, SideEffect};
use crate::core::locks::LockTable;
use crate::core::traits::{LedgerStore, WriteBatch};
use crate::types::{
    Account, AccountId, LedgerError, LedgerEvent, LedgerOperation, Money, NotificationKind,
    OperationType, Priority, StoreError, Transaction, TransactionFilter, TransactionKind,
};

/// Outcome of a deposit or withdrawal
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReceipt {
    /// Account as committed
    pub account: Account,
    pub transaction: Transaction,
}

/// Outcome of a transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub sender: Account,
    pub recipient: Account,

    /// TRANSFER_OUT record on the sender
    pub outgoing: Transaction,

    /// TRANSFER_IN record on the recipient
    pub incoming: Transaction,
}

/// Stored balance next to the balance derived from the transaction log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub account: AccountId,
    pub recorded: Money,
    pub derived: Money,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.recorded == self.derived
    }
}

/// Account ledger engine
///
/// Shares its store, clock and side-effect dispatcher with the loan engine. An
/// engine is `Send + Sync`; wrap it in an `Arc` to use it from many threads.
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    effects: EffectDispatcher,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    locks: LockTable<AccountId>,
}

impl LedgerEngine {
    /// Create a new LedgerEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence for accounts and transactions
    /// * `effects` - Destination for post-commit notifications and events
    /// * `clock` - Source of transaction timestamps
    /// * `config` - Low-balance threshold and event topic
    pub fn new(
        store: Arc<dyn LedgerStore>,
        effects: EffectDispatcher,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        LedgerEngine {
            store,
            effects,
            clock,
            config,
            locks: LockTable::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Register a new account with a zero balance
    ///
    /// # Arguments
    ///
    /// * `username` - Login name; surrounding whitespace is trimmed
    /// * `password_hash` - Credential hash computed by the caller, if any
    ///
    /// # Errors
    ///
    /// - `InvalidUsername` if the name is empty or contains whitespace or commas
    /// - `UsernameTaken` if the name is already registered
    pub fn open_account(
        &self,
        username: &str,
        password_hash: Option<String>,
    ) -> Result<Account, LedgerError> {
        let username = username.trim();
        if username.is_empty() || username.contains(|c: char| c.is_whitespace() || c == ',') {
            return Err(LedgerError::InvalidUsername {
                username: username.to_string(),
            });
        }

        let account = Account::new(username, password_hash, self.clock.now());
        match self.store.create_account(account) {
            Ok(account) => {
                info!(account = %account.id, username, "account opened");
                Ok(account)
            }
            Err(StoreError::DuplicateKey { .. }) => Err(LedgerError::UsernameTaken {
                username: username.to_string(),
            }),
            Err(e) => Err(self.storage_failure("open_account", e)),
        }
    }

    /// Resolve a username to its account id
    pub fn account_id(&self, username: &str) -> Result<AccountId, LedgerError> {
        self.find_by_username(username)?
            .map(|account| account.id)
            .ok_or_else(|| LedgerError::account_not_found(username))
    }

    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.load(id)
    }

    /// All accounts, ordered by username
    pub fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store
            .list_accounts()
            .map_err(|e| self.storage_failure("list_accounts", e))
    }

    /// Credit `amount` to an account
    ///
    /// # Returns
    ///
    /// The committed account and its new DEPOSIT transaction
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `AccountNotFound` if the account does not exist
    /// - `ArithmeticOverflow` if the balance would overflow
    /// - `StorageFailure` if the commit fails; nothing was written
    pub fn deposit(&self, id: AccountId, amount: Money) -> Result<LedgerReceipt, LedgerError> {
        require_positive(amount)?;

        let receipt = self.locks.with_lock(id, || -> Result<LedgerReceipt, LedgerError> {
            let mut account = self.load(id)?;
            account.balance = account
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("deposit"))?;

            let transaction = Transaction::new(id, amount, TransactionKind::Deposit, self.clock.now());
            let account = self.commit_one(
                "deposit",
                WriteBatch::new()
                    .save_account(account)
                    .save_transaction(transaction.clone()),
            )?;
            Ok(LedgerReceipt {
                account,
                transaction,
            })
        })?;

        info!(
            account = %id,
            amount = %amount,
            balance = %receipt.account.balance,
            "deposit committed"
        );
        self.effects.dispatch_all(self.publish(&LedgerEvent::Deposit {
            account: id,
            username: receipt.account.username.clone(),
            transaction: receipt.transaction.id,
            amount,
            balance: receipt.account.balance,
            at: receipt.transaction.timestamp,
        }));
        Ok(receipt)
    }

    /// Debit `amount` from an account
    ///
    /// A resulting balance below the low-balance threshold raises one
    /// HIGH-priority notification after the commit.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `AccountNotFound` if the account does not exist
    /// - `InsufficientFunds` if the balance is smaller than `amount`
    /// - `StorageFailure` if the commit fails; nothing was written
    pub fn withdraw(&self, id: AccountId, amount: Money) -> Result<LedgerReceipt, LedgerError> {
        require_positive(amount)?;

        let receipt = self.locks.with_lock(id, || -> Result<LedgerReceipt, LedgerError> {
            let mut account = self.load(id)?;
            if account.balance < amount {
                warn!(account = %id, balance = %account.balance, amount = %amount, "withdrawal rejected: insufficient funds");
                return Err(LedgerError::insufficient_funds(
                    &account.username,
                    account.balance.amount(),
                    amount.amount(),
                ));
            }
            account.balance = account
                .balance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("withdrawal"))?;

            let transaction =
                Transaction::new(id, amount, TransactionKind::Withdrawal, self.clock.now());
            let account = self.commit_one(
                "withdrawal",
                WriteBatch::new()
                    .save_account(account)
                    .save_transaction(transaction.clone()),
            )?;
            Ok(LedgerReceipt {
                account,
                transaction,
            })
        })?;

        info!(
            account = %id,
            amount = %amount,
            balance = %receipt.account.balance,
            "withdrawal committed"
        );
        let mut effects = self.publish(&LedgerEvent::Withdrawal {
            account: id,
            username: receipt.account.username.clone(),
            transaction: receipt.transaction.id,
            amount,
            balance: receipt.account.balance,
            at: receipt.transaction.timestamp,
        });
        effects.extend(self.low_balance_alert(&receipt.account, ". Please consider topping up."));
        self.effects.dispatch_all(effects);
        Ok(receipt)
    }

    /// Move `amount` from one user to another
    ///
    /// Both balances and both transaction records are committed as one unit.
    /// On success both parties get a MEDIUM-priority notification, and the
    /// sender a HIGH-priority one if left below the low-balance threshold.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `AccountNotFound` if the sender does not exist
    /// - `RecipientNotFound` if the recipient does not exist
    /// - `SameAccount` if both names resolve to one account
    /// - `InsufficientFunds` if the sender's balance is smaller than `amount`
    /// - `StorageFailure` if the commit fails; neither side was written
    pub fn transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: Money,
    ) -> Result<TransferReceipt, LedgerError> {
        require_positive(amount)?;

        let sender_id = self.account_id(sender)?;
        let recipient_id = self
            .find_by_username(recipient)?
            .map(|account| account.id)
            .ok_or_else(|| {
                warn!(sender, recipient, "transfer rejected: recipient not found");
                LedgerError::recipient_not_found(recipient)
            })?;
        if sender_id == recipient_id {
            return Err(LedgerError::SameAccount {
                username: sender.to_string(),
            });
        }

        let receipt = self.locks.with_pair(sender_id, recipient_id, || -> Result<TransferReceipt, LedgerError> {
            let mut from = self.load(sender_id)?;
            let mut to = self.load(recipient_id)?;
            if from.balance < amount {
                warn!(sender, recipient, balance = %from.balance, amount = %amount, "transfer rejected: insufficient funds");
                return Err(LedgerError::insufficient_funds(
                    &from.username,
                    from.balance.amount(),
                    amount.amount(),
                ));
            }
            from.balance = from
                .balance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("transfer"))?;
            to.balance = to
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("transfer"))?;

            let now = self.clock.now();
            let outgoing = Transaction::new(
                sender_id,
                amount,
                TransactionKind::TransferOut {
                    to: to.username.clone(),
                },
                now,
            );
            let incoming = Transaction::new(
                recipient_id,
                amount,
                TransactionKind::TransferIn {
                    from: from.username.clone(),
                },
                now,
            );

            let batch = WriteBatch::new()
                .save_account(from)
                .save_account(to)
                .save_transaction(outgoing.clone())
                .save_transaction(incoming.clone());
            let mut saved = self.commit("transfer", batch)?.into_iter();
            let (Some(sender), Some(recipient)) = (saved.next(), saved.next()) else {
                return Err(incomplete_commit());
            };
            Ok(TransferReceipt {
                sender,
                recipient,
                outgoing,
                incoming,
            })
        })?;

        info!(
            sender,
            recipient,
            amount = %amount,
            sender_balance = %receipt.sender.balance,
            "transfer committed"
        );
        let mut effects = self.publish(&LedgerEvent::Transfer {
            sender: receipt.sender.username.clone(),
            recipient: receipt.recipient.username.clone(),
            amount,
            at: receipt.outgoing.timestamp,
        });
        effects.extend(self.low_balance_alert(&receipt.sender, " after transfer."));
        effects.push(SideEffect::Notify {
            account: receipt.sender.id,
            message: format!("You transferred ${} to {}", amount, receipt.recipient.username),
            kind: NotificationKind::Transaction,
            priority: Priority::Medium,
        });
        effects.push(SideEffect::Notify {
            account: receipt.recipient.id,
            message: format!("You received ${} from {}", amount, receipt.sender.username),
            kind: NotificationKind::Transaction,
            priority: Priority::Medium,
        });
        self.effects.dispatch_all(effects);
        Ok(receipt)
    }

    /// Transactions of an account matching every bound in `filter`
    ///
    /// Results are in commit order, so repeated calls against unchanged data
    /// return identical lists.
    pub fn search_transactions(
        &self,
        id: AccountId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.load(id)?;
        self.store
            .find_transactions(id, filter)
            .map_err(|e| self.storage_failure("search_transactions", e))
    }

    /// Every transaction of an account
    pub fn transaction_history(&self, id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        self.search_transactions(id, &TransactionFilter::default())
    }

    /// Compare the stored balance with the sum of signed transaction amounts
    ///
    /// Taken under the account lock, so no mutation can land between the two reads.
    pub fn reconcile(&self, id: AccountId) -> Result<Reconciliation, LedgerError> {
        self.locks.with_lock(id, || -> Result<Reconciliation, LedgerError> {
            let account = self.load(id)?;
            let derived = self
                .transaction_history(id)?
                .iter()
                .map(Transaction::signed_amount)
                .sum();
            Ok(Reconciliation {
                account: id,
                recorded: account.balance,
                derived,
            })
        })
    }

    /// Route one CSV operation to the matching ledger call
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if a deposit, withdrawal or transfer has no amount
    /// - `ParseError` if a transfer has no counterparty
    /// - Any error of the routed operation
    pub fn process(&self, operation: &LedgerOperation) -> Result<(), LedgerError> {
        let amount = || {
            operation
                .amount
                .ok_or_else(|| LedgerError::invalid_amount("", "missing amount"))
        };

        match operation.op {
            OperationType::Open => self.open_account(&operation.username, None).map(|_| ()),
            OperationType::Deposit => {
                let id = self.account_id(&operation.username)?;
                self.deposit(id, amount()?).map(|_| ())
            }
            OperationType::Withdrawal => {
                let id = self.account_id(&operation.username)?;
                self.withdraw(id, amount()?).map(|_| ())
            }
            OperationType::Transfer => {
                let recipient = operation
                    .counterparty
                    .as_deref()
                    .ok_or_else(|| LedgerError::parse("transfer requires a counterparty"))?;
                self.transfer(&operation.username, recipient, amount()?)
                    .map(|_| ())
            }
        }
    }

    fn load(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .get_account(id)
            .map_err(|e| self.storage_failure("get_account", e))?
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, LedgerError> {
        self.store
            .find_account_by_username(username.trim())
            .map_err(|e| self.storage_failure("find_account_by_username", e))
    }

    fn commit(&self, operation: &str, batch: WriteBatch) -> Result<Vec<Account>, LedgerError> {
        self.store
            .commit(batch)
            .map_err(|e| self.storage_failure(operation, e))
    }

    fn commit_one(&self, operation: &str, batch: WriteBatch) -> Result<Account, LedgerError> {
        self.commit(operation, batch)?
            .into_iter()
            .next()
            .ok_or_else(incomplete_commit)
    }

    fn storage_failure(&self, operation: &str, e: StoreError) -> LedgerError {
        error!(operation, error = %e, "storage failure");
        LedgerError::StorageFailure(e)
    }

    fn publish(&self, event: &LedgerEvent) -> Vec<SideEffect> {
        event_effect(&self.config.event_topic, event).into_iter().collect()
    }

    fn low_balance_alert(&self, account: &Account, suffix: &str) -> Option<SideEffect> {
        let threshold = self.config.low_balance_threshold;
        (account.balance < threshold).then(|| SideEffect::Notify {
            account: account.id,
            message: format!("Your account balance is below ${threshold}{suffix}"),
            kind: NotificationKind::Account,
            priority: Priority::High,
        })
    }
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("config", &self.config)
            .field("effects", &self.effects)
            .finish()
    }
}

/// Serialize `event` into a publish effect, logging and skipping on failure
pub(crate) fn event_effect(topic: &str, event: &LedgerEvent) -> Option<SideEffect> {
    match event.to_message() {
        Ok(message) => Some(SideEffect::Publish {
            topic: topic.to_string(),
            message,
        }),
        Err(e) => {
            warn!(event = event.name(), error = %e, "event not serializable, skipped");
            None
        }
    }
}

fn require_positive(amount: Money) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::invalid_amount(
            &amount.to_string(),
            "must be greater than zero",
        ))
    }
}

fn incomplete_commit() -> LedgerError {
    LedgerError::StorageFailure(StoreError::Unavailable(
        "commit returned fewer accounts than saved".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::events::InMemoryEventLog;
    use crate::core::inbox::NotificationInbox;
    use crate::core::store::InMemoryLedgerStore;
    use crate::types::TransactionType;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    struct Fixture {
        engine: LedgerEngine,
        inbox: Arc<NotificationInbox>,
        events: Arc<InMemoryEventLog>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap(),
        ));
        let inbox = Arc::new(NotificationInbox::with_clock(clock.clone()));
        let events = Arc::new(InMemoryEventLog::new());
        let engine = LedgerEngine::new(
            Arc::new(InMemoryLedgerStore::new()),
            EffectDispatcher::inline(inbox.clone(), events.clone()),
            clock,
            LedgerConfig::default(),
        );
        Fixture {
            engine,
            inbox,
            events,
        }
    }

    fn funded(engine: &LedgerEngine, username: &str, cents: i64) -> AccountId {
        let id = engine.open_account(username, None).unwrap().id;
        if cents > 0 {
            engine.deposit(id, Money::from_cents(cents)).unwrap();
        }
        id
    }

    #[test]
    fn test_open_account_starts_at_zero() {
        let f = fixture();
        let account = f.engine.open_account("  alice ", Some("hash".into())).unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.balance, Money::ZERO);
        assert_eq!(f.engine.account_id("alice").unwrap(), account.id);
        assert!(f.events.messages().is_empty());
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::inner_space("al ice")]
    #[case::comma("al,ice")]
    fn test_open_account_invalid_username(#[case] username: &str) {
        let f = fixture();
        assert!(matches!(
            f.engine.open_account(username, None),
            Err(LedgerError::InvalidUsername { .. })
        ));
    }

    #[test]
    fn test_open_account_duplicate() {
        let f = fixture();
        f.engine.open_account("alice", None).unwrap();
        assert_eq!(
            f.engine.open_account("alice", None),
            Err(LedgerError::UsernameTaken {
                username: "alice".to_string()
            })
        );
    }

    #[test]
    fn test_deposit_records_transaction_and_event() {
        let f = fixture();
        let id = f.engine.open_account("alice", None).unwrap().id;

        let receipt = f.engine.deposit(id, Money::from_cents(15_000)).unwrap();

        assert_eq!(receipt.account.balance, Money::from_cents(15_000));
        assert_eq!(receipt.transaction.kind, TransactionKind::Deposit);
        assert_eq!(f.engine.transaction_history(id).unwrap(), vec![receipt.transaction]);

        let messages = f.events.messages_on("transaction-events");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("\"event\":\"deposit\""));
        assert!(f.inbox.notifications_for(id).is_empty());
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-500)]
    fn test_non_positive_amounts_rejected(#[case] cents: i64) {
        let f = fixture();
        let id = funded(&f.engine, "alice", 10_000);
        let amount = Money::from_cents(cents);

        assert!(matches!(f.engine.deposit(id, amount), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(f.engine.withdraw(id, amount), Err(LedgerError::InvalidAmount { .. })));
        funded(&f.engine, "bob", 0);
        assert!(matches!(
            f.engine.transfer("alice", "bob", amount),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert_eq!(f.engine.transaction_history(id).unwrap().len(), 1);
    }

    #[test]
    fn test_deposit_unknown_account() {
        let f = fixture();
        assert!(matches!(
            f.engine.deposit(AccountId::new(), Money::from_cents(100)),
            Err(LedgerError::AccountNotFound { .. })
        ));
    }

    #[test]
    fn test_withdraw_insufficient_funds_leaves_state() {
        let f = fixture();
        let id = funded(&f.engine, "alice", 5_000);

        let err = f.engine.withdraw(id, Money::from_cents(5_001)).unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert!(err.is_business_rejection());
        assert_eq!(f.engine.get_account(id).unwrap().balance, Money::from_cents(5_000));
        assert_eq!(f.engine.transaction_history(id).unwrap().len(), 1);
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let f = fixture();
        let id = funded(&f.engine, "alice", 5_000);
        let receipt = f.engine.withdraw(id, Money::from_cents(5_000)).unwrap();
        assert_eq!(receipt.account.balance, Money::ZERO);
    }

    #[rstest]
    #[case::drops_below(15_000, 7_000, 1)]
    #[case::stays_above(50_000, 20_000, 0)]
    #[case::lands_on_threshold(15_000, 5_000, 0)]
    fn test_low_balance_alert(#[case] start: i64, #[case] withdraw: i64, #[case] alerts: usize) {
        let f = fixture();
        let id = funded(&f.engine, "alice", start);

        f.engine.withdraw(id, Money::from_cents(withdraw)).unwrap();

        let high: Vec<_> = f
            .inbox
            .notifications_for(id)
            .into_iter()
            .filter(|n| n.priority == Priority::High)
            .collect();
        assert_eq!(high.len(), alerts);
        if let Some(alert) = high.first() {
            assert_eq!(alert.kind, NotificationKind::Account);
            assert!(alert.message.contains("below $100.00"));
        }
    }

    #[test]
    fn test_transfer_moves_funds_and_notifies() {
        let f = fixture();
        let alice = funded(&f.engine, "alice", 50_000);
        let bob = funded(&f.engine, "bob", 10_000);

        let receipt = f
            .engine
            .transfer("alice", "bob", Money::from_cents(20_000))
            .unwrap();

        assert_eq!(receipt.sender.balance, Money::from_cents(30_000));
        assert_eq!(receipt.recipient.balance, Money::from_cents(30_000));
        assert_eq!(
            receipt.outgoing.kind,
            TransactionKind::TransferOut { to: "bob".into() }
        );
        assert_eq!(
            receipt.incoming.kind,
            TransactionKind::TransferIn { from: "alice".into() }
        );
        assert_eq!(receipt.outgoing.timestamp, receipt.incoming.timestamp);

        let alice_notes = f.inbox.notifications_for(alice);
        assert_eq!(alice_notes.len(), 1);
        assert_eq!(alice_notes[0].message, "You transferred $200.00 to bob");
        assert_eq!(alice_notes[0].priority, Priority::Medium);
        let bob_notes = f.inbox.notifications_for(bob);
        assert_eq!(bob_notes[0].message, "You received $200.00 from alice");
    }

    #[test]
    fn test_transfer_low_balance_alerts_sender_only() {
        let f = fixture();
        let alice = funded(&f.engine, "alice", 15_000);
        let bob = funded(&f.engine, "bob", 0);

        f.engine.transfer("alice", "bob", Money::from_cents(10_000)).unwrap();

        let alice_notes = f.inbox.notifications_for(alice);
        assert_eq!(alice_notes.len(), 2);
        assert_eq!(
            alice_notes.iter().filter(|n| n.priority == Priority::High).count(),
            1
        );
        assert!(f
            .inbox
            .notifications_for(bob)
            .iter()
            .all(|n| n.priority == Priority::Medium));
    }

    #[test]
    fn test_transfer_rejections_leave_both_sides() {
        let f = fixture();
        let alice = funded(&f.engine, "alice", 5_000);
        let bob = funded(&f.engine, "bob", 10_000);

        assert!(matches!(
            f.engine.transfer("alice", "bob", Money::from_cents(20_000)),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            f.engine.transfer("alice", "carol", Money::from_cents(100)),
            Err(LedgerError::RecipientNotFound { .. })
        ));
        assert!(matches!(
            f.engine.transfer("carol", "alice", Money::from_cents(100)),
            Err(LedgerError::AccountNotFound { .. })
        ));
        assert!(matches!(
            f.engine.transfer("alice", "alice", Money::from_cents(100)),
            Err(LedgerError::SameAccount { .. })
        ));

        assert_eq!(f.engine.get_account(alice).unwrap().balance, Money::from_cents(5_000));
        assert_eq!(f.engine.get_account(bob).unwrap().balance, Money::from_cents(10_000));
        assert_eq!(f.engine.transaction_history(alice).unwrap().len(), 1);
        assert_eq!(f.engine.transaction_history(bob).unwrap().len(), 1);
        assert!(f.inbox.notifications_for(alice).is_empty());
    }

    #[test]
    fn test_search_transactions_filters() {
        let f = fixture();
        let alice = funded(&f.engine, "alice", 100_000);
        f.engine.withdraw(alice, Money::from_cents(2_500)).unwrap();
        f.engine.withdraw(alice, Money::from_cents(40_000)).unwrap();

        let large_withdrawals = f
            .engine
            .search_transactions(
                alice,
                &TransactionFilter::default()
                    .kind(TransactionType::Withdrawal)
                    .min_amount(Money::from_cents(10_000)),
            )
            .unwrap();
        assert_eq!(large_withdrawals.len(), 1);
        assert_eq!(large_withdrawals[0].amount, Money::from_cents(40_000));

        let history = f.engine.transaction_history(alice).unwrap();
        assert_eq!(history, f.engine.transaction_history(alice).unwrap());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_reconcile_matches_balance() {
        let f = fixture();
        let alice = funded(&f.engine, "alice", 50_000);
        funded(&f.engine, "bob", 0);
        f.engine.withdraw(alice, Money::from_cents(1_234)).unwrap();
        f.engine.transfer("alice", "bob", Money::from_cents(10_000)).unwrap();

        let reconciliation = f.engine.reconcile(alice).unwrap();
        assert!(reconciliation.is_balanced());
        assert_eq!(reconciliation.derived, Money::from_cents(38_766));
    }

    #[test]
    fn test_process_routes_operations() {
        let f = fixture();
        let op = |op, username: &str, counterparty: Option<&str>, cents: Option<i64>| {
            LedgerOperation {
                op,
                username: username.to_string(),
                counterparty: counterparty.map(str::to_string),
                amount: cents.map(Money::from_cents),
            }
        };

        f.engine.process(&op(OperationType::Open, "alice", None, None)).unwrap();
        f.engine.process(&op(OperationType::Open, "bob", None, None)).unwrap();
        f.engine
            .process(&op(OperationType::Deposit, "alice", None, Some(10_000)))
            .unwrap();
        f.engine
            .process(&op(OperationType::Transfer, "alice", Some("bob"), Some(2_500)))
            .unwrap();
        f.engine
            .process(&op(OperationType::Withdrawal, "bob", None, Some(500)))
            .unwrap();

        assert!(matches!(
            f.engine.process(&op(OperationType::Deposit, "alice", None, None)),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(matches!(
            f.engine.process(&op(OperationType::Transfer, "alice", None, Some(1))),
            Err(LedgerError::ParseError { .. })
        ));

        let balances: Vec<_> = f
            .engine
            .list_accounts()
            .unwrap()
            .into_iter()
            .map(|a| (a.username, a.balance))
            .collect();
        assert_eq!(
            balances,
            vec![
                ("alice".to_string(), Money::from_cents(7_500)),
                ("bob".to_string(), Money::from_cents(2_000)),
            ]
        );
    }
}
