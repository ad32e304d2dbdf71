//! Drops results whose metadata fails a caller-supplied predicate.

use crate::document::SearchHit;
use crate::powers::{Power, SearchContext};

/// Filters `afterSearch` results by a predicate over `metadata`.
///
/// Surviving results keep their relative order; the total returned may be
/// fewer than the requested `topK` (spec §4.5.2).
pub struct MetadataFilter {
    predicate: Box<dyn Fn(&serde_json::Value) -> bool + Send + Sync>,
}

impl MetadataFilter {
    /// Creates a filter from a predicate over a result's `metadata` field.
    pub fn new(predicate: impl Fn(&serde_json::Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl Power for MetadataFilter {
    fn name(&self) -> &str {
        "MetadataFilter"
    }

    fn after_search(
        &mut self,
        _ctx: &SearchContext,
        hits: Vec<SearchHit>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        Ok(hits
            .into_iter()
            .filter(|h| (self.predicate)(&h.metadata))
            .collect())
    }
}
