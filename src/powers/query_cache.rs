//! Exact-match query result cache with TTL and insertion-order eviction.

use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::document::SearchHit;
use crate::powers::{Power, SearchContext};

struct Entry {
    hits: Vec<SearchHit>,
    expires_at: Instant,
}

/// Caches `search` results by exact query string.
///
/// Not a semantic cache: "alpha beta" and "Alpha Beta" are distinct keys.
/// Freshness is bounded only by the TTL and by [`Power::on_clear`] — the
/// cache does not observe `add`/`delete`, so it can serve stale hits for up
/// to `ttl` after the underlying corpus changes (spec §4.5.1).
pub struct QueryCache {
    max_size: usize,
    ttl: Duration,
    entries: IndexMap<String, Entry>,
}

impl QueryCache {
    /// Default max entries (100) and TTL (60s).
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(100, Duration::from_millis(60_000))
    }

    /// Creates a cache with a custom capacity and TTL.
    #[must_use]
    pub fn with_params(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size,
            ttl,
            entries: IndexMap::new(),
        }
    }

    /// Number of entries currently cached (including any not yet expired).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Power for QueryCache {
    fn name(&self) -> &str {
        "QueryCache"
    }

    fn before_search(&mut self, mut ctx: SearchContext) -> anyhow::Result<SearchContext> {
        if let Some(entry) = self.entries.get(&ctx.query) {
            if entry.expires_at > Instant::now() {
                ctx.short_circuit = Some(entry.hits.clone());
            } else {
                self.entries.shift_remove(&ctx.query);
            }
        }
        Ok(ctx)
    }

    fn after_search(
        &mut self,
        ctx: &SearchContext,
        hits: Vec<SearchHit>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        if !self.entries.contains_key(&ctx.query) && self.entries.len() >= self.max_size {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(
            ctx.query.clone(),
            Entry {
                hits: hits.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(hits)
    }

    fn on_clear(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        Ok(())
    }
}
