use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

const DEFAULT_TTL_SECS: i64 = 5;
const MAX_QUEUED: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Short-lived, non-blocking messages shown in the footer
#[derive(Debug, Clone)]
pub struct Notifications {
    queue: VecDeque<Notification>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl Notifications {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>, now: DateTime<Utc>) {
        if self.queue.len() == MAX_QUEUED {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            level,
            message: message.into(),
            created_at: now,
        });
    }

    /// Drop everything older than the ttl
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.queue.retain(|n| now - n.created_at < ttl);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_push_and_latest() {
        let mut n = Notifications::default();
        n.push(Level::Info, "one", t0());
        n.push(Level::Error, "two", t0());
        assert_eq!(n.queue.len(), 2);
        assert_eq!(n.latest().unwrap().message, "two");
        assert_eq!(n.latest().unwrap().level, Level::Error);
    }

    #[test]
    fn test_prune_expires_old_messages() {
        let mut n = Notifications::with_ttl(Duration::seconds(3));
        n.push(Level::Info, "old", t0());
        n.push(Level::Info, "new", t0() + Duration::seconds(2));
        n.prune(t0() + Duration::seconds(4));
        assert_eq!(n.queue.iter().map(|m| m.message.as_str()).collect::<Vec<_>>(), ["new"]);
        n.prune(t0() + Duration::seconds(10));
        assert!(n.latest().is_none());
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut n = Notifications::default();
        for i in 0..20 {
            n.push(Level::Info, format!("m{i}"), t0());
        }
        assert_eq!(n.queue.len(), MAX_QUEUED);
        assert_eq!(n.queue.front().unwrap().message, "m12");
    }
}
