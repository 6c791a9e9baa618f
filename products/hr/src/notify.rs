use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use serde::Serialize;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::debug;

pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    visible: Option<Notification>,
}

/// Transient toast. Showing a new message cancels the pending dismissal of
/// the previous one and schedules its own.
#[derive(Debug)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    pending: Option<JoinHandle<()>>,
    dismiss_after: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            slot: Arc::default(),
            pending: None,
            dismiss_after,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, NotificationLevel::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(message, NotificationLevel::Error);
    }

    pub fn show(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.cancel_pending();
        let notification = Notification {
            message: message.into(),
            level,
        };
        debug!(message = %notification.message, ?level, "notification shown");
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.visible = Some(notification);
            slot.generation
        };

        // Without a runtime the message simply stays until replaced.
        let Ok(handle) = Handle::try_current() else {
            return;
        };
        let slot = Arc::clone(&self.slot);
        let delay = self.dismiss_after;
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = lock(&slot);
            if slot.generation == generation {
                slot.visible = None;
            }
        }));
    }

    pub fn current(&self) -> Option<Notification> {
        lock(&self.slot).visible.clone()
    }

    pub fn dismiss(&mut self) {
        self.cancel_pending();
        lock(&self.slot).visible = None;
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn lock(slot: &Mutex<Slot>) -> std::sync::MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn dismisses_after_the_delay() {
        let mut notifier = Notifier::default();
        notifier.success("Employee added successfully!");

        sleep(Duration::from_millis(2_999)).await;
        assert_eq!(
            notifier.current().map(|n| n.level),
            Some(NotificationLevel::Success)
        );

        sleep(Duration::from_millis(2)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn second_message_restarts_the_timer() {
        let mut notifier = Notifier::default();
        notifier.success("first");
        sleep(Duration::from_secs(2)).await;

        notifier.error("Employee deleted.");
        sleep(Duration::from_millis(1_500)).await;
        let visible = notifier.current().unwrap();
        assert_eq!(visible.message, "Employee deleted.");
        assert_eq!(visible.level, NotificationLevel::Error);

        sleep(Duration::from_millis(1_600)).await;
        assert_eq!(notifier.current(), None);
    }

    #[test]
    fn without_runtime_message_stays_until_dismissed() {
        let mut notifier = Notifier::new(Duration::from_millis(1));
        notifier.success("saved");
        assert!(notifier.current().is_some());
        notifier.dismiss();
        assert!(notifier.current().is_none());
    }
}
