use serde::{Deserialize, Serialize};

// Listen events

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ListenEvent {
    TimelineSetSources,
    TimelineRequestMore,
    TimelineReload,
}

impl ListenEvent {
    pub const ALL: [ListenEvent; 3] = [
        ListenEvent::TimelineSetSources,
        ListenEvent::TimelineRequestMore,
        ListenEvent::TimelineReload,
    ];

    /// The event name used by the frontend.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenEvent::TimelineSetSources => "setSources",
            ListenEvent::TimelineRequestMore => "requestMore",
            ListenEvent::TimelineReload => "reload",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

/// The frontend navigated to another feed, or the feed's watched streams changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSetSources {
    pub sources: Vec<String>,
}

// Emit events

#[derive(Debug, Clone)]
pub enum EmitEvent {
    ToastNotification(ToastNotificationRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastNotificationRequest {
    message: String,
    description: Option<String>,
    variant: ToastNotificationVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ToastNotificationVariant {
    Default,
    Description,
    Success,
    Info,
    Warning,
    Error,
}

impl ToastNotificationRequest {
    pub fn new(
        message: String,
        description: Option<String>,
        variant: ToastNotificationVariant,
    ) -> Self {
        if description.is_some() {
            // If there is a description, force the description variant.
            Self {
                message,
                description,
                variant: ToastNotificationVariant::Description,
            }
        } else {
            Self {
                message,
                description: None,
                variant,
            }
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn variant(&self) -> ToastNotificationVariant {
        self.variant
    }
}
