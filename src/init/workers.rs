use std::{sync::Arc, time::Duration};

use anyhow::bail;
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::{Instant, sleep_until},
};
use tracing::{debug, error, info, warn};

use crate::{
    api::StreamApi,
    events::timeline::{FetchPhase, TimelineError, TimelineUpdate},
    models::{
        async_requests::{FetchRequest, TimelineRequest},
        event_bridge::EventBridge,
        events::{ToastNotificationRequest, ToastNotificationVariant},
        state_updater::StateUpdater,
    },
    timeline::timeline_screen::TimelineScreen,
};

/// The entry point for the async worker task that runs a timeline's fetches.
///
/// All this task does is wait for [`FetchRequest`]s from the timeline and run each of them
/// in its own task, so that a slow fetch never holds back a newer one.
/// Results are sent back tagged with the generation of the request; the timeline decides
/// whether they're still relevant. The task ends once the timeline is dropped.
pub async fn fetch_worker(
    api: Arc<dyn StreamApi>,
    mut request_receiver: UnboundedReceiver<FetchRequest>,
    update_sender: UnboundedSender<TimelineUpdate>,
) {
    debug!("Started fetch_worker task.");
    while let Some(request) = request_receiver.recv().await {
        let api = api.clone();
        let sender = update_sender.clone();

        // Spawn a new async task that will make the actual fetch request.
        let _fetch_task = Handle::current().spawn(async move {
            let update = match request {
                FetchRequest::Snapshot {
                    generation,
                    sources,
                } => {
                    debug!("Fetching recent items for {sources:?} (generation {generation})...");
                    let result = api
                        .fetch_recent(sources.as_slice())
                        .await
                        .map_err(|e| TimelineError::fetch_failed(FetchPhase::Snapshot, e));
                    match &result {
                        Ok(items) => debug!(
                            "Fetched {} recent items for {sources:?} (generation {generation})",
                            items.len()
                        ),
                        Err(e) => warn!("Error fetching recent items for {sources:?}: {e}"),
                    }
                    TimelineUpdate::SnapshotLoaded { generation, result }
                }
                FetchRequest::Backfill {
                    generation,
                    sources,
                    cursor,
                } => {
                    debug!(
                        "Fetching items older than {cursor} for {sources:?} (generation {generation})..."
                    );
                    let result = api
                        .fetch_before(sources.as_slice(), cursor)
                        .await
                        .map_err(|e| TimelineError::fetch_failed(FetchPhase::Backfill, e));
                    match &result {
                        Ok(items) => debug!(
                            "Fetched {} items older than {cursor} for {sources:?} (generation {generation})",
                            items.len()
                        ),
                        Err(e) => warn!("Error fetching items older than {cursor} for {sources:?}: {e}"),
                    }
                    TimelineUpdate::BackfillLoaded {
                        generation,
                        cursor,
                        result,
                    }
                }
            };
            if sender.send(update).is_err() {
                debug!("Timeline was dropped before its fetch completed");
            }
        });
    }
    debug!("fetch_worker task ended: timeline dropped.");
}

/// Drives a timeline from the frontend requests and the fetch results,
/// and keeps the frontend store up to date.
///
/// Request handling is pushed to the frontend right away, so that clearing the timeline
/// on a source change is never delayed. Fetch results are batched within `refresh_debounce`.
pub async fn ui_worker(
    mut screen: TimelineScreen,
    state_updaters: Arc<Box<dyn StateUpdater>>,
    mut request_receiver: mpsc::Receiver<TimelineRequest>,
    event_bridge: Arc<EventBridge>,
    refresh_debounce: Duration,
) -> anyhow::Result<()> {
    let mut refresh_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            // Handle incoming requests from the frontend
            request = request_receiver.recv() => {
                let Some(request) = request else {
                    info!("Timeline request channel closed, stopping the UI worker.");
                    screen.unmount();
                    return Ok(());
                };
                debug!("Handling timeline request {request:?}");
                screen.handle_request(request);
                refresh_deadline = None;
                update_frontend_state(&screen, &state_updaters);
            }

            // Apply fetch results
            applied = screen.process_next_update() => {
                match applied {
                    Some(true) => {
                        refresh_deadline.get_or_insert_with(|| Instant::now() + refresh_debounce);
                    }
                    Some(false) => {}
                    None => bail!("fetch worker task ended unexpectedly"),
                }
            }

            _ = sleep_until(refresh_deadline.unwrap_or_else(Instant::now)), if refresh_deadline.is_some() => {
                refresh_deadline = None;
                update_frontend_state(&screen, &state_updaters);
            }
        }

        screen.toasts().process_toast_notifications(&event_bridge);
    }
}

fn update_frontend_state(screen: &TimelineScreen, state_updaters: &Arc<Box<dyn StateUpdater>>) {
    if let Err(e) = state_updaters.update_timeline(screen) {
        error!("Couldn't update the frontend timeline store: {e:?}");
        screen
            .toasts()
            .enqueue_toast_notification(ToastNotificationRequest::new(
                format!("Cannot update timeline. Error: {e}"),
                None,
                ToastNotificationVariant::Error,
            ));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        api::testing::{Scripted, ScriptedApi, message},
        models::{
            events::EmitEvent, state_updater::StateUpdaterFunctions, stream_item::Timestamp,
        },
        timeline::sources::SourceSet,
        utils::ManualClock,
    };

    /// Records the serialized timeline on every update.
    #[derive(Debug, Default)]
    struct RecordingUpdater {
        pushed: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    impl StateUpdater for RecordingUpdater {}

    impl StateUpdaterFunctions for RecordingUpdater {
        fn update_timeline(&self, timeline: &TimelineScreen) -> anyhow::Result<()> {
            self.pushed
                .lock()
                .unwrap()
                .push(serde_json::to_value(timeline)?);
            Ok(())
        }
    }

    async fn wait_for<F: Fn(&[serde_json::Value]) -> bool>(
        pushed: &Arc<Mutex<Vec<serde_json::Value>>>,
        condition: F,
    ) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if condition(&pushed.lock().unwrap()) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for a frontend update");
    }

    #[tokio::test]
    async fn fetch_worker_reports_tagged_results_and_stops_with_its_timeline() {
        let api = Arc::new(ScriptedApi::default());
        api.push_before("t1", Scripted::Items(vec![message("m1", 10)]));
        let (request_sender, request_receiver) = mpsc::unbounded_channel();
        let (update_sender, mut update_receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(fetch_worker(api, request_receiver, update_sender));

        request_sender
            .send(FetchRequest::Backfill {
                generation: 7,
                sources: SourceSet::new(["t1"]),
                cursor: Timestamp(20),
            })
            .unwrap();
        let update = tokio::time::timeout(Duration::from_secs(5), update_receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            update,
            TimelineUpdate::BackfillLoaded { generation: 7, cursor: Timestamp(20), result: Ok(ref items) }
                if items.len() == 1
        ));

        drop(request_sender);
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .expect("fetch worker kept running after its timeline was dropped")
            .unwrap();
    }

    #[tokio::test]
    async fn ui_worker_pushes_requests_and_results() {
        let api = Arc::new(ScriptedApi::default());
        api.push_recent("t1", Scripted::Items(vec![message("m2", 20)]));
        api.push_before("t1", Scripted::Fail("timeout"));
        let clock = Arc::new(ManualClock::new(1_000));
        let screen = TimelineScreen::new(api.clone(), clock);

        let pushed = Arc::new(Mutex::new(Vec::new()));
        let updater: Box<dyn StateUpdater> = Box::new(RecordingUpdater {
            pushed: pushed.clone(),
        });
        let (bridge, mut events) = EventBridge::new(8);
        let (sender, receiver) = mpsc::channel(8);
        let worker = tokio::spawn(ui_worker(
            screen,
            Arc::new(updater),
            receiver,
            Arc::new(bridge),
            Duration::from_millis(10),
        ));

        sender
            .send(TimelineRequest::SetSources {
                sources: vec!["t1".to_owned()],
            })
            .await
            .unwrap();
        // The cleared, loading timeline is pushed first.
        wait_for(&pushed, |p| !p.is_empty()).await;
        assert_eq!(pushed.lock().unwrap()[0]["state"]["state"], "loading");

        wait_for(&pushed, |p| p.last().is_some_and(|v| v["state"]["state"] == "ready")).await;
        assert_eq!(pushed.lock().unwrap().last().unwrap()["items"][0]["id"], "m2");

        sender.send(TimelineRequest::RequestMore).await.unwrap();
        wait_for(&pushed, |p| {
            p.last().is_some_and(|v| v["lastError"]["kind"] == "fetchFailed")
        })
        .await;
        let last = pushed.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last["hasMore"], true);
        assert_eq!(last["items"].as_array().unwrap().len(), 1);

        let EmitEvent::ToastNotification(toast) =
            tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
        assert_eq!(toast.message(), "Couldn't load older items.");

        drop(sender);
        assert!(worker.await.unwrap().is_ok());
    }
}
