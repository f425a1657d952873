use std::sync::Arc;

use serde::{Serialize, ser::Serializer};
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{error, info};

use crate::{
    api::{StreamApi, http::HttpStreamApi},
    init::workers::ui_worker,
    models::{event_bridge::EventBridge, events::EmitEvent, state_updater::StateUpdater},
};

pub mod api;
pub(crate) mod events;
pub(crate) mod init;
pub mod models;
pub(crate) mod stores;
pub(crate) mod timeline;
pub(crate) mod utils;

pub type Result<T> = std::result::Result<T, Error>;

/// stream-timeline-sync Error enum
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

/// Required `mpsc:Receiver`s to listen to incoming events
pub struct EventReceivers {
    timeline_request_receiver: mpsc::Receiver<TimelineRequest>,
}

impl EventReceivers {
    pub fn new(timeline_request_receiver: mpsc::Receiver<TimelineRequest>) -> Self {
        Self {
            timeline_request_receiver,
        }
    }
}

/// The required configuration for this lib. Adapters must implement updaters and event_receivers.
pub struct LibConfig {
    /// The functions that will be in charge of updating the frontend states / stores
    /// from the backend state
    updaters: Box<dyn StateUpdater>,
    /// To listen to events coming from the frontend, we use channels.
    event_receivers: EventReceivers,
    /// The stream service and worker settings
    timeline: TimelineConfig,
    /// Overrides the HTTP stream API built from `timeline`
    stream_api: Option<Arc<dyn StreamApi>>,
    /// Overrides the wall clock used to stamp new items
    clock: Option<Arc<dyn Clock>>,
}

impl LibConfig {
    pub fn new(
        updaters: Box<dyn StateUpdater>,
        event_receivers: EventReceivers,
        timeline: TimelineConfig,
    ) -> Self {
        Self {
            updaters,
            event_receivers,
            timeline,
            stream_api: None,
            clock: None,
        }
    }

    pub fn with_stream_api(mut self, api: Arc<dyn StreamApi>) -> Self {
        self.stream_api = Some(api);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

/// Function to be called once your app is starting to init this lib.
/// This will start the workers and return a `Receiver` to forward outgoing events.
///
/// Must be called from within a tokio runtime.
pub fn init(config: LibConfig) -> Result<broadcast::Receiver<EmitEvent>> {
    let LibConfig {
        updaters,
        event_receivers,
        timeline,
        stream_api,
        clock,
    } = config;

    // Lib -> adapter events
    let (event_bridge, broadcast_receiver) = EventBridge::new(timeline.event_channel_capacity);

    let api = match stream_api {
        Some(api) => api,
        None => Arc::new(HttpStreamApi::new(&timeline)?),
    };
    let clock = clock.unwrap_or_else(|| Arc::new(SystemClock));
    let screen =
        TimelineScreen::new(api, clock).with_fresh_item_window(timeline.fresh_item_window_ms);

    info!("Starting timeline workers for {}", timeline.host);
    let refresh_debounce = timeline.refresh_debounce();
    let _ui_worker = Handle::current().spawn(async move {
        let result = ui_worker(
            screen,
            Arc::new(updaters),
            event_receivers.timeline_request_receiver,
            Arc::new(event_bridge),
            refresh_debounce,
        )
        .await;
        if let Err(e) = result {
            error!("Error: timeline UI worker task ended:\n\t{e:?}");
        }
    });

    // Return broadcast receiver for the adapter to forward outgoing events
    Ok(broadcast_receiver)
}

// Re-exports

pub use events::timeline::{FetchPhase, TimelineError, TimelineState};
pub use init::config::TimelineConfig;
pub use models::async_requests::TimelineRequest;
pub use stores::timeline_store::{TimelineItems, TimelineStore};
pub use timeline::{
    sources::SourceSet,
    timeline_screen::{RequestMoreOutcome, TimelineScreen},
};
pub use tokio::sync::mpsc;
pub use utils::{Clock, SystemClock};
