use crate::timeline::timeline_screen::TimelineScreen;

pub trait StateUpdater: StateUpdaterFunctions + std::fmt::Debug + Send + Sync {}

pub trait StateUpdaterFunctions {
    /// Pushes the current timeline view to the frontend store.
    fn update_timeline(&self, timeline: &TimelineScreen) -> anyhow::Result<()>;
}
