use std::sync::Arc;

use eyeball::{SharedObservable, Subscriber};
use indexmap::IndexMap;

use crate::models::stream_item::{DatedStreamItem, StreamItemId};

/// An immutable view of the timeline contents, as published to observers.
pub type TimelineItems = Arc<[DatedStreamItem]>;

/// The ordered list of items a timeline currently shows.
///
/// Items keep their insertion order and each id is present at most once:
/// inserting an id that is already stored is a no-op, the first copy wins.
/// Every mutation publishes a single new [`TimelineItems`] snapshot, so a subscriber
/// never observes a half-applied change.
#[derive(Debug)]
pub struct TimelineStore {
    entries: IndexMap<StreamItemId, DatedStreamItem>,
    observable: SharedObservable<TimelineItems>,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineStore {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            observable: SharedObservable::new(Arc::from(Vec::new())),
        }
    }

    /// Replaces the whole contents with `items`. Returns the number of items kept.
    pub fn set(&mut self, items: Vec<DatedStreamItem>) -> usize {
        self.entries.clear();
        let inserted = self.insert_new(items);
        self.publish();
        inserted
    }

    /// Appends the items whose id isn't stored yet after the current tail.
    /// Returns the number of items actually appended.
    pub fn append(&mut self, items: Vec<DatedStreamItem>) -> usize {
        let inserted = self.insert_new(items);
        if inserted > 0 {
            self.publish();
        }
        inserted
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.publish();
    }

    pub fn contains(&self, id: &StreamItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The oldest item loaded so far, whose timestamp anchors the next backfill.
    pub fn last(&self) -> Option<&DatedStreamItem> {
        self.entries.last().map(|(_, item)| item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatedStreamItem> {
        self.entries.values()
    }

    /// The current contents.
    pub fn items(&self) -> TimelineItems {
        self.observable.get()
    }

    /// Subscribes to the contents of this store.
    /// The subscriber yields a new snapshot after every mutation.
    pub fn subscribe(&self) -> Subscriber<TimelineItems> {
        self.observable.subscribe()
    }

    fn insert_new(&mut self, items: Vec<DatedStreamItem>) -> usize {
        let before = self.entries.len();
        for item in items {
            self.entries.entry(item.id().clone()).or_insert(item);
        }
        self.entries.len() - before
    }

    fn publish(&self) {
        let snapshot: TimelineItems = self.entries.values().cloned().collect();
        self.observable.set(snapshot);
    }
}
