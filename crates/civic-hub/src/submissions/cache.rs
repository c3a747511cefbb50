//! Read-through cache for query results.
//!
//! Reads are keyed by [`QueryKey`]. Every write goes through a [`Mutation`], which
//! declares the keys it makes stale; those entries are dropped and the next read
//! re-fetches from the repository. Cached values are never patched in place.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use super::domain::{Submission, SubmissionId};
use super::filter::SubmissionFilter;
use super::matching::MatchSuggestion;
use super::stats::DashboardStats;

/// Identity of a cacheable read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Submissions(SubmissionFilter),
    Submission(SubmissionId),
    Stats,
    MatchSuggestions,
}

/// A write and the reads it invalidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update(SubmissionId),
    Match {
        need: SubmissionId,
        offer: SubmissionId,
    },
}

impl Mutation {
    pub fn invalidates(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::Submissions(_) | QueryKey::Stats | QueryKey::MatchSuggestions => true,
            QueryKey::Submission(id) => match self {
                // A brand new id cannot have been read before.
                Mutation::Create => false,
                Mutation::Update(updated) => updated == id,
                Mutation::Match { need, offer } => need == id || offer == id,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedQuery {
    Submissions(Vec<Submission>),
    Submission(Submission),
    Stats(DashboardStats),
    MatchSuggestions(Vec<MatchSuggestion>),
}

/// Query result cache shared across request handlers.
///
/// `generation` advances on every invalidation. A fetch that started under an older
/// generation never leaves its result behind in the map.
#[derive(Debug)]
pub struct QueryCache {
    enabled: bool,
    entries: DashMap<QueryKey, CachedQuery>,
    generation: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl QueryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Return the cached value for `key`, or run `fetch` and remember its result.
    ///
    /// `extract` projects the cached variant back to the caller's type; a mismatch is
    /// treated as a miss. Fetch errors are returned and not cached, and neither is a
    /// result whose fetch overlapped an invalidation.
    pub fn get_or_fetch<T, E>(
        &self,
        key: QueryKey,
        extract: impl Fn(&CachedQuery) -> Option<T>,
        wrap: impl FnOnce(&T) -> CachedQuery,
        fetch: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if !self.enabled {
            return fetch();
        }

        if let Some(hit) = self.entries.get(&key).and_then(|entry| extract(entry.value())) {
            debug!(?key, "query cache hit");
            return Ok(hit);
        }
        debug!(?key, "query cache miss");

        let generation = self.generation.load(Ordering::SeqCst);
        let value = fetch()?;
        if self.generation.load(Ordering::SeqCst) == generation {
            self.entries.insert(key.clone(), wrap(&value));
            // An invalidation may have landed between the check and the insert.
            if self.generation.load(Ordering::SeqCst) != generation {
                self.entries.remove(&key);
            }
        } else {
            debug!(?key, "query cache skipped stale result");
        }
        Ok(value)
    }

    /// Drop every entry `mutation` makes stale.
    pub fn invalidate(&self, mutation: &Mutation) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.retain(|key, _| !mutation.invalidates(key));
    }
}
