use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::{
    api::StreamApi,
    models::stream_item::{StreamItem, StreamItemKind, Timestamp},
};

pub(crate) fn message(id: &str, ts: u64) -> StreamItem {
    StreamItem::new(id, StreamItemKind::Message, Some(Timestamp(ts)))
}

/// A canned answer of the [`ScriptedApi`].
#[derive(Debug)]
pub(crate) enum Scripted {
    Items(Vec<StreamItem>),
    Fail(&'static str),
    /// Answers with the items once the paired sender fires (or is dropped).
    Gated(oneshot::Receiver<()>, Vec<StreamItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Recent(Vec<String>),
    Before(Vec<String>, Timestamp),
}

type Script = Mutex<HashMap<String, VecDeque<Scripted>>>;

/// A [`StreamApi`] answering from queues of scripted responses,
/// one queue per comma-joined set of sources.
/// An exhausted queue answers with an empty page.
#[derive(Debug, Default)]
pub(crate) struct ScriptedApi {
    recent: Script,
    before: Script,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub(crate) fn push_recent(&self, sources: &str, answer: Scripted) {
        Self::push(&self.recent, sources, answer);
    }

    pub(crate) fn push_before(&self, sources: &str, answer: Scripted) {
        Self::push(&self.before, sources, answer);
    }

    fn push(script: &Script, sources: &str, answer: Scripted) {
        script
            .lock()
            .unwrap()
            .entry(sources.to_owned())
            .or_default()
            .push_back(answer);
    }

    fn pop(script: &Script, sources: &[String]) -> Option<Scripted> {
        script
            .lock()
            .unwrap()
            .get_mut(&sources.join(","))
            .and_then(VecDeque::pop_front)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(next: Option<Scripted>) -> anyhow::Result<Vec<StreamItem>> {
        match next {
            None => Ok(Vec::new()),
            Some(Scripted::Items(items)) => Ok(items),
            Some(Scripted::Fail(reason)) => Err(anyhow!(reason)),
            Some(Scripted::Gated(gate, items)) => {
                let _ = gate.await;
                Ok(items)
            }
        }
    }
}

#[async_trait]
impl StreamApi for ScriptedApi {
    async fn fetch_recent(&self, sources: &[String]) -> anyhow::Result<Vec<StreamItem>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Recent(sources.to_vec()));
        let next = Self::pop(&self.recent, sources);
        Self::answer(next).await
    }

    async fn fetch_before(
        &self,
        sources: &[String],
        cursor: Timestamp,
    ) -> anyhow::Result<Vec<StreamItem>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Before(sources.to_vec(), cursor));
        let next = Self::pop(&self.before, sources);
        Self::answer(next).await
    }
}
