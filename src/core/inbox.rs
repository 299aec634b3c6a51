//! In-memory notification inbox
//!
//! [`NotificationInbox`] is the default [`NotificationSink`]: every call appends
//! one unread [`Notification`] to the account's inbox.

use dashmap::DashMap;
use std::sync::Arc;

use crate::core::clock::{Clock, SystemClock};
use crate::core::traits::NotificationSink;
use crate::types::{
    AccountId, DeliveryError, Notification, NotificationId, NotificationKind, Priority,
};

pub struct NotificationInbox {
    inboxes: DashMap<AccountId, Vec<Notification>>,
    clock: Arc<dyn Clock>,
}

impl Default for NotificationInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        NotificationInbox {
            inboxes: DashMap::new(),
            clock,
        }
    }

    /// Notifications for `account`, newest first
    pub fn notifications_for(&self, account: AccountId) -> Vec<Notification> {
        self.inboxes
            .get(&account)
            .map(|inbox| inbox.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Mark one notification as read
    ///
    /// # Returns
    ///
    /// `true` if the notification exists in this account's inbox
    pub fn mark_as_read(&self, account: AccountId, id: NotificationId) -> bool {
        let Some(mut inbox) = self.inboxes.get_mut(&account) else {
            return false;
        };
        match inbox.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Mark every notification of `account` as read, returning how many changed
    pub fn mark_all_as_read(&self, account: AccountId) -> usize {
        let Some(mut inbox) = self.inboxes.get_mut(&account) else {
            return 0;
        };
        let mut changed = 0;
        for notification in inbox.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub fn unread_count(&self, account: AccountId) -> usize {
        self.inboxes
            .get(&account)
            .map(|inbox| inbox.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }
}

impl NotificationSink for NotificationInbox {
    fn notify(
        &self,
        account: AccountId,
        message: &str,
        kind: NotificationKind,
        priority: Priority,
    ) -> Result<(), DeliveryError> {
        let notification = Notification::new(account, message, kind, priority, self.clock.now());
        self.inboxes.entry(account).or_default().push(notification);
        Ok(())
    }
}

impl std::fmt::Debug for NotificationInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationInbox")
            .field("accounts", &self.inboxes.len())
            .finish()
    }
}
