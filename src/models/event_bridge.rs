use tokio::sync::broadcast::{self, error::SendError};
use tracing::debug;

use crate::models::events::EmitEvent;

/// Lib -> adapter channel. Adapters that fall behind by more than `capacity`
/// events miss the oldest ones.
#[derive(Debug)]
pub struct EventBridge {
    sender: broadcast::Sender<EmitEvent>,
}

impl EventBridge {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<EmitEvent>) {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Forwards `event` to every listening adapter.
    /// Returns `false` if nobody was listening and the event was dropped.
    pub fn emit(&self, event: EmitEvent) -> bool {
        match self.sender.send(event) {
            Ok(_) => true,
            Err(SendError(event)) => {
                debug!("No adapter listening, dropping {event:?}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::{ToastNotificationRequest, ToastNotificationVariant};

    fn toast(message: &str) -> EmitEvent {
        EmitEvent::ToastNotification(ToastNotificationRequest::new(
            message.to_owned(),
            None,
            ToastNotificationVariant::Info,
        ))
    }

    #[test]
    fn events_without_listeners_are_dropped() {
        let (bridge, receiver) = EventBridge::new(0);
        let mut second = bridge.sender.subscribe();
        assert!(bridge.emit(toast("first")));
        drop(receiver);
        let EmitEvent::ToastNotification(first) = second.try_recv().unwrap();
        assert_eq!(first.message(), "first");

        drop(second);
        assert!(!bridge.emit(toast("unheard")));
    }
}
