//! Ephemeral user-facing notifications.
//!
//! Each notification gets a deadline when it is pushed. Nothing fires by
//! itself: the host calls `expire(now)` from whatever tick it has, and
//! `dismiss` removes an entry early, which also cancels its deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a notification stays visible unless dismissed first.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    /// `None` for sticky notifications.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    ttl: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NotificationCenter {
    /// A zero `ttl` makes every notification sticky.
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            ttl,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, now: DateTime<Utc>) -> Uuid {
        let ttl = self.ttl;
        self.push_with_ttl(message, severity, now, ttl)
    }

    pub fn push_with_ttl(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Uuid {
        // Zero, or a deadline past the representable range, is sticky.
        let expires_at = if ttl.is_zero() {
            None
        } else {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl))
        };
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: now,
            expires_at,
        };
        let id = notification.id;
        tracing::debug!(%id, ?severity, message = %notification.message, "notification");
        self.items.push(notification);
        id
    }

    pub fn success(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Uuid {
        self.push(message, Severity::Success, now)
    }

    pub fn error(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Uuid {
        self.push(message, Severity::Error, now)
    }

    pub fn warning(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Uuid {
        self.push(message, Severity::Warning, now)
    }

    pub fn info(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Uuid {
        self.push(message, Severity::Info, now)
    }

    /// Remove one notification. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop every notification whose deadline is at or before `now`.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        self.items
            .retain(|n| n.expires_at.map_or(true, |deadline| deadline > now));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|n| n.severity == severity).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_expire_after_ttl() {
        let mut center = NotificationCenter::default();
        let now = Utc::now();
        center.success("saved", now);
        assert_eq!(center.expire(now + chrono::Duration::seconds(4)), 0);
        assert_eq!(center.expire(now + chrono::Duration::seconds(5)), 1);
        assert!(center.is_empty());
    }

    #[test]
    fn dismiss_removes_before_deadline() {
        let mut center = NotificationCenter::default();
        let now = Utc::now();
        let id = center.error("boom", now);
        center.info("fyi", now);
        assert!(center.dismiss(id));
        assert!(!center.dismiss(id));
        assert_eq!(center.items().len(), 1);
        assert_eq!(center.count(Severity::Error), 0);
    }

    #[test]
    fn zero_ttl_is_sticky() {
        let mut center = NotificationCenter::new(Duration::ZERO);
        let now = Utc::now();
        center.warning("careful", now);
        assert_eq!(center.expire(now + chrono::Duration::days(1)), 0);
        assert!(center.items()[0].expires_at.is_none());
    }

    #[test]
    fn out_of_range_ttl_is_sticky() {
        let mut center = NotificationCenter::new(Duration::from_secs(10_000_000_000_000));
        let now = Utc::now();
        center.info("forever", now);
        assert!(center.items()[0].expires_at.is_none());
        assert_eq!(center.expire(now + chrono::Duration::days(365)), 0);
    }

    #[test]
    fn ids_are_unique() {
        let mut center = NotificationCenter::default();
        let now = Utc::now();
        let a = center.info("a", now);
        let b = center.info("b", now);
        assert_ne!(a, b);
    }
}
