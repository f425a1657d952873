use crossbeam_queue::SegQueue;

use crate::models::{
    event_bridge::EventBridge,
    events::{EmitEvent, ToastNotificationRequest},
};

//
// TOAST Notifications (in app)
//

/// Toast notifications waiting to be forwarded to the adapter.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: SegQueue<ToastNotificationRequest>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a new toast notification.
    ///
    /// Toast notifications will be shown in the order they were enqueued.
    pub fn enqueue_toast_notification(&self, notification: ToastNotificationRequest) {
        self.pending.push(notification);
    }

    /// Forwards all pending notifications through the event bridge.
    /// Returns how many were sent.
    pub fn process_toast_notifications(&self, event_bridge: &EventBridge) -> usize {
        let mut sent = 0;
        while let Some(notif) = self.pending.pop() {
            event_bridge.emit(EmitEvent::ToastNotification(notif));
            sent += 1;
        }
        sent
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
