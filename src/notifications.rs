use std::{
    fmt,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Local};
use log::*;

/// Non-blocking toasts. Implementations must not fail; there is nothing a
/// form could do about it anyway.
pub trait Notifier: Send + Sync {
    fn show_success(&self, text: &str);
    fn show_error(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
    pub shown_at: DateTime<Local>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };

        write!(f, "[{} {marker}] {}", self.shown_at.format("%H:%M:%S"), self.text)
    }
}

/// Keeps every notification until drained, mirroring each one to the log.
#[derive(Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn entries(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    fn push(&self, level: NotificationLevel, text: &str) {
        self.lock().push(Notification {
            level,
            text: text.to_owned(),
            shown_at: Local::now(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for NotificationLog {
    fn show_success(&self, text: &str) {
        info!("Notification: {text}");
        self.push(NotificationLevel::Success, text);
    }

    fn show_error(&self, text: &str) {
        warn!("Error notification: {text}");
        self.push(NotificationLevel::Error, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_order_until_drained() {
        let log = NotificationLog::default();

        log.show_success("saved");
        log.show_error("boom");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, NotificationLevel::Success);
        assert_eq!(log.last().unwrap().text, "boom");

        let drained = log.drain();
        assert_eq!(drained, entries);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn display_marks_level() {
        let log = NotificationLog::default();
        log.show_error("boom");

        let shown = log.last().unwrap().to_string();
        assert!(shown.ends_with(" error] boom"), "{shown}");
    }
}
