use std::sync::Arc;

use serde::{Serialize, Serializer, ser::SerializeStruct};
use tokio::{
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use tracing::{debug, info, warn};

use crate::{
    api::StreamApi,
    events::timeline::{FetchPhase, TimelineError, TimelineState, TimelineUpdate},
    init::workers::fetch_worker,
    models::{
        async_requests::{FetchRequest, TimelineRequest, submit_fetch_request},
        events::{ToastNotificationRequest, ToastNotificationVariant},
        stream_item::{DatedStreamItem, StreamItem, Timestamp},
    },
    stores::timeline_store::{TimelineItems, TimelineStore},
    timeline::{
        frontend_events::items_dto::to_frontend_timeline_item, notifications::ToastQueue,
        sources::SourceSet,
    },
    utils::Clock,
};

const DEFAULT_FRESH_ITEM_WINDOW_MS: u64 = 5_000;

/// What a call to [`TimelineScreen::request_more`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMoreOutcome {
    /// A backfill fetch was sent.
    Issued,
    /// A backfill is already in flight.
    AlreadyLoading,
    /// The last backfill found nothing new.
    Exhausted,
    /// No snapshot is loaded yet, or there is no cursor to backfill from.
    NotReady,
}

/// The state of a timeline showing the combined items of a set of streams.
///
/// All mutations happen through `&mut self` from a single task. Fetches run on the
/// fetch worker and come back as [`TimelineUpdate`]s, which are only applied if they
/// carry the current generation. The generation is bumped on every source change,
/// reload and unmount.
#[derive(Debug)]
pub struct TimelineScreen {
    /// The streams currently watched.
    sources: SourceSet,
    /// The items shown, oldest last.
    store: TimelineStore,
    state: TimelineState,
    /// The error of the last failed fetch, cleared by the next successful one.
    last_error: Option<TimelineError>,
    /// Token identifying the current set of sources. Results of older requests are dropped.
    generation: u64,
    clock: Arc<dyn Clock>,
    fresh_item_window_ms: u64,
    toasts: Arc<ToastQueue>,
    request_sender: UnboundedSender<FetchRequest>,
    update_receiver: UnboundedReceiver<TimelineUpdate>,
}

impl Drop for TimelineScreen {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl TimelineScreen {
    /// Creates an idle timeline and spawns the worker task that runs its fetches.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(api: Arc<dyn StreamApi>, clock: Arc<dyn Clock>) -> Self {
        let (request_sender, request_receiver) = unbounded_channel::<FetchRequest>();
        let (update_sender, update_receiver) = unbounded_channel::<TimelineUpdate>();
        let _fetch_worker =
            Handle::current().spawn(fetch_worker(api, request_receiver, update_sender));
        Self {
            sources: SourceSet::default(),
            store: TimelineStore::new(),
            state: TimelineState::Idle,
            last_error: None,
            generation: 0,
            clock,
            fresh_item_window_ms: DEFAULT_FRESH_ITEM_WINDOW_MS,
            toasts: Arc::new(ToastQueue::new()),
            request_sender,
            update_receiver,
        }
    }

    pub fn with_fresh_item_window(mut self, fresh_item_window_ms: u64) -> Self {
        self.fresh_item_window_ms = fresh_item_window_ms;
        self
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    /// Whether older items may still be available.
    pub fn has_more(&self) -> bool {
        match self.state {
            TimelineState::Ready { has_more } => has_more,
            TimelineState::Loading {
                phase: FetchPhase::Backfill,
            } => true,
            _ => false,
        }
    }

    pub fn last_error(&self) -> Option<&TimelineError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The items currently shown.
    pub fn items(&self) -> TimelineItems {
        self.store.items()
    }

    pub fn store(&self) -> &TimelineStore {
        &self.store
    }

    pub fn toasts(&self) -> &Arc<ToastQueue> {
        &self.toasts
    }

    pub fn handle_request(&mut self, request: TimelineRequest) {
        match request {
            TimelineRequest::SetSources { sources } => self.set_sources(sources),
            TimelineRequest::RequestMore => {
                self.request_more();
            }
            TimelineRequest::Reload => self.reload(),
        }
    }

    /// Watches the given streams.
    ///
    /// If the set differs from the current one (order and duplicates don't count),
    /// the timeline is cleared right away and a new snapshot is requested.
    /// Passing the same set again only reloads if the previous snapshot failed
    /// or the timeline was unmounted.
    pub fn set_sources<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources = SourceSet::new(sources);
        let snapshot_failed = matches!(
            self.last_error,
            Some(TimelineError::FetchFailed {
                phase: FetchPhase::Snapshot,
                ..
            })
        );
        if sources == self.sources && self.state != TimelineState::Idle && !snapshot_failed {
            debug!("Timeline sources unchanged, keeping {} items", self.store.len());
            return;
        }
        self.sources = sources;
        self.load_snapshot();
    }

    /// Drops the current items and loads a fresh snapshot for the current streams.
    pub fn reload(&mut self) {
        self.load_snapshot();
    }

    /// Asks for the next window of items older than the current tail.
    ///
    /// This is a no-op unless the timeline is ready with more items available
    /// and its last item has a timestamp to use as a cursor.
    pub fn request_more(&mut self) -> RequestMoreOutcome {
        match self.state {
            TimelineState::Ready { has_more: true } => {}
            TimelineState::Ready { has_more: false } => return RequestMoreOutcome::Exhausted,
            TimelineState::Loading {
                phase: FetchPhase::Backfill,
            } => return RequestMoreOutcome::AlreadyLoading,
            TimelineState::Loading {
                phase: FetchPhase::Snapshot,
            }
            | TimelineState::Idle => return RequestMoreOutcome::NotReady,
        }

        let cursor = match self.backfill_cursor() {
            Ok(cursor) => cursor,
            Err(e) => {
                debug!("Skipping backfill request: {e}");
                return RequestMoreOutcome::NotReady;
            }
        };

        debug!(
            "Requesting items older than {cursor} for {:?} (generation {})",
            self.sources, self.generation
        );
        self.state = TimelineState::Loading {
            phase: FetchPhase::Backfill,
        };
        submit_fetch_request(
            &self.request_sender,
            FetchRequest::Backfill {
                generation: self.generation,
                sources: self.sources.clone(),
                cursor,
            },
        );
        RequestMoreOutcome::Issued
    }

    /// Invalidates every in-flight request and returns to the idle state.
    /// The current items are left untouched.
    pub fn unmount(&mut self) {
        self.generation += 1;
        self.state = TimelineState::Idle;
    }

    /// Applies all the fetch results that arrived so far.
    /// Returns the number of results that weren't stale.
    pub fn process_timeline_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.update_receiver.try_recv() {
            if self.apply_update(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next fetch result and applies it.
    ///
    /// Returns whether it was applied, or `None` if the fetch worker is gone.
    /// Cancelling the returned future never loses an update.
    pub async fn process_next_update(&mut self) -> Option<bool> {
        let update = self.update_receiver.recv().await?;
        Some(self.apply_update(update))
    }

    fn backfill_cursor(&self) -> Result<Timestamp, TimelineError> {
        self.store
            .last()
            .and_then(|item| item.timestamp())
            .ok_or(TimelineError::PreconditionNotMet)
    }

    fn load_snapshot(&mut self) {
        self.generation += 1;
        self.store.clear();
        self.last_error = None;

        if self.sources.is_empty() {
            debug!("No timeline sources to load");
            self.state = TimelineState::Idle;
            return;
        }

        info!(
            "Loading recent items for {:?} (generation {})",
            self.sources, self.generation
        );
        self.state = TimelineState::Loading {
            phase: FetchPhase::Snapshot,
        };
        submit_fetch_request(
            &self.request_sender,
            FetchRequest::Snapshot {
                generation: self.generation,
                sources: self.sources.clone(),
            },
        );
    }

    fn apply_update(&mut self, update: TimelineUpdate) -> bool {
        if update.generation() != self.generation {
            debug!(
                "Discarding stale timeline update from generation {} (current is {})",
                update.generation(),
                self.generation
            );
            return false;
        }

        match update {
            TimelineUpdate::SnapshotLoaded {
                result: Ok(items), ..
            } => {
                let now = self.clock.now();
                let kept = self.store.set(date_items(items, now));
                debug!("Loaded {kept} recent items for {:?}", self.sources);
                self.last_error = None;
                self.state = TimelineState::Ready { has_more: true };
            }
            TimelineUpdate::SnapshotLoaded {
                result: Err(error), ..
            } => {
                warn!("Failed to load the timeline for {:?}: {error}", self.sources);
                self.store.clear();
                self.state = TimelineState::Ready { has_more: false };
                self.report_error(error);
            }
            TimelineUpdate::BackfillLoaded {
                cursor,
                result: Ok(items),
                ..
            } => {
                let new_items: Vec<StreamItem> = items
                    .into_iter()
                    .filter(|item| !self.store.contains(&item.id))
                    .collect();
                self.last_error = None;
                if new_items.is_empty() {
                    info!(
                        "No items older than {cursor} left for {:?}, timeline fully paginated",
                        self.sources
                    );
                    self.state = TimelineState::Ready { has_more: false };
                } else {
                    let now = self.clock.now();
                    let appended = self.store.append(date_items(new_items, now));
                    debug!("Appended {appended} items older than {cursor}");
                    self.state = TimelineState::Ready { has_more: true };
                }
            }
            TimelineUpdate::BackfillLoaded {
                cursor,
                result: Err(error),
                ..
            } => {
                warn!("Failed to load items older than {cursor}: {error}");
                self.state = TimelineState::Ready { has_more: true };
                self.report_error(error);
            }
        }
        true
    }

    fn report_error(&mut self, error: TimelineError) {
        let message = match &error {
            TimelineError::FetchFailed {
                phase: FetchPhase::Snapshot,
                ..
            } => "Couldn't load the timeline.",
            _ => "Couldn't load older items.",
        };
        self.toasts
            .enqueue_toast_notification(ToastNotificationRequest::new(
                message.to_owned(),
                Some(error.to_string()),
                ToastNotificationVariant::Error,
            ));
        self.last_error = Some(error);
    }
}

fn date_items(items: Vec<StreamItem>, now: Timestamp) -> Vec<DatedStreamItem> {
    items.into_iter().map(|item| item.dated(now)).collect()
}

impl Serialize for TimelineScreen {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let now = self.clock.now();
        let items: Vec<_> = self
            .store
            .iter()
            .map(|item| to_frontend_timeline_item(item, now, self.fresh_item_window_ms))
            .collect();

        let mut state = serializer.serialize_struct("TimelineScreen", 5)?;
        state.serialize_field("sources", &self.sources)?;
        state.serialize_field("items", &items)?;
        state.serialize_field("state", &self.state)?;
        state.serialize_field("hasMore", &self.has_more())?;
        state.serialize_field("lastError", &self.last_error)?;
        state.end()
    }
}
