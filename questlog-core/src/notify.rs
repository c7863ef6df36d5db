use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// Single message slot. A new message replaces the current one and restarts the window.
#[derive(Debug, Default)]
pub struct NotificationSlot {
    current: Option<(Notification, Instant)>,
    generation: u64,
}

impl NotificationSlot {
    /// Show `notification` from `now`. Returns the generation that owns the slot.
    pub fn show_at(&mut self, notification: Notification, now: Instant) -> u64 {
        self.generation += 1;
        self.current = Some((notification, now));
        self.generation
    }

    pub fn visible_at(&self, now: Instant) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|(_, shown_at)| now < *shown_at + NOTIFICATION_TTL)
            .map(|(notification, _)| notification)
    }

    /// Clear the slot if `generation` still owns it.
    pub fn clear_if(&mut self, generation: u64) -> bool {
        if self.generation != generation || self.current.is_none() {
            return false;
        }
        self.current = None;
        true
    }
}

/// Shared handle to the notification slot that also clears it on a timer.
#[derive(Clone, Debug)]
pub struct Notifier {
    slot: Arc<Mutex<NotificationSlot>>,
    updates: Arc<watch::Sender<Option<Notification>>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            slot: Arc::new(Mutex::new(NotificationSlot::default())),
            updates: Arc::new(updates),
        }
    }

    fn slot(&self) -> MutexGuard<'_, NotificationSlot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn show(&self, text: impl Into<String>, severity: Severity) {
        let notification = Notification::new(text, severity);
        debug!(text = %notification.text, ?severity, "notification");

        let generation = self.slot().show_at(notification.clone(), Instant::now());
        self.updates.send_replace(Some(notification));

        // Without a runtime the slot still expires through `current`.
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }

        let slot = Arc::clone(&self.slot);
        let updates = Arc::clone(&self.updates);
        tokio::spawn(async move {
            tokio::time::sleep(NOTIFICATION_TTL).await;
            let cleared = slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear_if(generation);
            if cleared {
                updates.send_replace(None);
            }
        });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.show(text, Severity::Info);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.show(text, Severity::Success);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.show(text, Severity::Error);
    }

    pub fn current(&self) -> Option<Notification> {
        self.slot().visible_at(Instant::now()).cloned()
    }

    /// Receiver that observes every show and clear.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.updates.subscribe()
    }
}
