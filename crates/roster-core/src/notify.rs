//! Transient operator notifications.
//!
//! Every notification expires on its own `NOTIFICATION_TTL` after it was
//! pushed; the owner calls `tick()` periodically to drop expired entries.
//! Identical messages are not merged.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Local>,
    expires: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

pub struct NotificationQueue {
    items: VecDeque<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
            ttl,
        }
    }

    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    pub fn push_at(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push_back(Notification {
            id,
            kind,
            message: message.into(),
            created_at: Local::now(),
            expires: now + self.ttl,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, message)
    }

    /// Remove one notification early. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Dismiss the most recently pushed notification, if any is still live.
    pub fn dismiss_newest(&mut self) -> Option<u64> {
        self.items.pop_back().map(|n| n.id)
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Drop everything that has expired by `now`.
    pub fn tick_at(&mut self, now: Instant) {
        self.items.retain(|n| !n.is_expired(now));
    }

    /// Live notifications, oldest first.
    pub fn list(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}
