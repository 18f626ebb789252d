use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

const MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// An ephemeral toast
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub level: Level,
    pub created_at: Instant,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Level::Info, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Level::Error, title, description)
    }

    fn new(level: Level, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            level,
            created_at: Instant::now(),
        }
    }
}

/// Toasts on screen, newest last, at most `MAX_VISIBLE`
#[derive(Debug)]
pub struct Notifications {
    ttl: Duration,
    visible: VecDeque<Notification>,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            visible: VecDeque::with_capacity(MAX_VISIBLE),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        debug!(
            level = ?notification.level,
            title = %notification.title,
            description = %notification.description,
            "notification raised"
        );
        self.visible.push_back(notification);
        while self.visible.len() > MAX_VISIBLE {
            self.visible.pop_front();
        }
    }

    /// Drop toasts older than the configured ttl
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.visible
            .retain(|n| now.saturating_duration_since(n.created_at) < ttl);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.visible.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_drops_expired() {
        let mut notifications = Notifications::new(Duration::from_secs(4));
        notifications.push(Notification::info("Exported", "chat-1.json"));

        let start = notifications
            .visible()
            .next()
            .map(|n| n.created_at)
            .unwrap_or_else(Instant::now);
        notifications.prune(start + Duration::from_secs(1));
        assert_eq!(notifications.visible().count(), 1);

        notifications.prune(start + Duration::from_secs(5));
        assert_eq!(notifications.visible().count(), 0);
    }

    #[test]
    fn test_visible_is_bounded() {
        let mut notifications = Notifications::new(Duration::from_secs(60));
        for i in 0..8 {
            notifications.push(Notification::error("Error", format!("failure {}", i)));
        }

        let descriptions: Vec<_> = notifications.visible().map(|n| n.description.as_str()).collect();
        assert_eq!(descriptions.len(), MAX_VISIBLE);
        assert_eq!(descriptions[0], "failure 3");
        assert_eq!(descriptions[MAX_VISIBLE - 1], "failure 7");
    }
}
