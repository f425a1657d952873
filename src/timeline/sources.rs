use std::collections::BTreeSet;

use serde::Serialize;

/// The set of stream identifiers whose combined activity a timeline shows.
///
/// The order given by the frontend is kept for outgoing requests,
/// but two sets are equal whenever they contain the same identifiers.
#[derive(Debug, Clone, Default, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceSet(Vec<String>);

impl SourceSet {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let ids = sources
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        Self(ids)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    fn contents(&self) -> BTreeSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl PartialEq for SourceSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.contents() == other.contents()
    }
}
