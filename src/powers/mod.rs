//! The extension pipeline ("Powers"): hooks around add/search/delete/clear
//! and the embedder-swap seam.
//!
//! A [`Power`] is a plain trait with no-op default methods rather than a
//! virtual-dispatch hierarchy of marker types — the registry just iterates
//! a `Vec<Box<dyn Power>>` and calls whichever hooks are present, mirroring
//! the source's "plain record of optional callbacks" design (spec §9).

mod embedding_swap;
mod hybrid_search;
mod metadata_filter;
mod query_cache;

pub use embedding_swap::EmbeddingSwap;
pub use hybrid_search::HybridSearch;
pub use metadata_filter::MetadataFilter;
pub use query_cache::QueryCache;

use crate::document::{Document, SearchHit};
use crate::embedder::Embedder;
use crate::error::{Error, Result};

/// Context threaded through the `beforeSearch` hook chain.
#[derive(Debug, Clone)]
pub struct SearchContext {
    /// The query string, possibly rewritten by an earlier hook.
    pub query: String,
    /// Requested result count.
    pub top_k: usize,
    /// Set by a `beforeSearch` hook to skip embedding and core retrieval
    /// entirely; the engine returns this list unchanged.
    pub short_circuit: Option<Vec<SearchHit>>,
}

/// A hook registered with the engine.
///
/// Every method has a no-op default so a concrete Power only overrides the
/// hooks it actually uses. Hooks run with the engine's write lock held, so
/// `&mut self` is sufficient for hooks that carry their own state (no
/// interior mutability needed).
pub trait Power: Send + Sync {
    /// Stable name; unique within one registry.
    fn name(&self) -> &str;

    /// Runs before documents are embedded and written to the store. May
    /// transform the list; the result feeds the next `beforeAdd` hook (or,
    /// for the last one, the engine itself).
    fn before_add(&mut self, docs: Vec<Document>) -> anyhow::Result<Vec<Document>> {
        Ok(docs)
    }

    /// Runs after documents (with their resolved embeddings) have been
    /// written to the store and HNSW.
    fn after_add(&mut self, _docs: &[(Document, Vec<f32>)]) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before the query is embedded. May rewrite the query or set
    /// [`SearchContext::short_circuit`] to bypass retrieval altogether.
    fn before_search(&mut self, ctx: SearchContext) -> anyhow::Result<SearchContext> {
        Ok(ctx)
    }

    /// Runs after core retrieval (or after a short-circuit). Receives the
    /// current result list and returns the next one, e.g. to filter,
    /// re-rank, or fuse with a second ranking.
    fn after_search(
        &mut self,
        _ctx: &SearchContext,
        hits: Vec<SearchHit>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        Ok(hits)
    }

    /// Returns an embedder this Power provides, if any. Registry resolution
    /// scans in reverse registration order and takes the first Power that
    /// returns `Some` here (last-writer-wins).
    fn embedder(&self) -> Option<&dyn Embedder> {
        None
    }

    /// Runs after a document is removed from the store and HNSW.
    fn on_delete(&mut self, _id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the store and HNSW are wiped.
    fn on_clear(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ordered sequence of registered Powers. Names are unique within a
/// registry (spec §3's Powers registry invariant).
#[derive(Default)]
pub struct PowerRegistry {
    powers: Vec<Box<dyn Power>>,
}

impl PowerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { powers: Vec::new() }
    }

    /// Registers `power`. Fails with [`Error::DuplicatePower`] if a Power
    /// with the same name is already present.
    pub fn use_power(&mut self, power: Box<dyn Power>) -> Result<()> {
        let name = power.name().to_string();
        if self.powers.iter().any(|p| p.name() == name) {
            return Err(Error::DuplicatePower(name));
        }
        self.powers.push(power);
        Ok(())
    }

    /// Removes the Power named `name`. Returns `true` if one was removed.
    pub fn eject(&mut self, name: &str) -> bool {
        let before = self.powers.len();
        self.powers.retain(|p| p.name() != name);
        self.powers.len() != before
    }

    /// Names of registered Powers, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.powers.iter().map(|p| p.name().to_string()).collect()
    }

    fn hook_error(power: &str, hook: &'static str, source: anyhow::Error) -> Error {
        Error::Hook {
            power: power.to_string(),
            hook,
            source,
        }
    }

    /// Runs every `beforeAdd` hook, in registration order, folding the
    /// document list through each.
    pub fn run_before_add(&mut self, mut docs: Vec<Document>) -> Result<Vec<Document>> {
        for power in &mut self.powers {
            let name = power.name().to_string();
            docs = power
                .before_add(docs)
                .map_err(|e| Self::hook_error(&name, "beforeAdd", e))?;
        }
        Ok(docs)
    }

    /// Runs every `afterAdd` hook, in registration order.
    pub fn run_after_add(&mut self, docs: &[(Document, Vec<f32>)]) -> Result<()> {
        for power in &mut self.powers {
            let name = power.name().to_string();
            power
                .after_add(docs)
                .map_err(|e| Self::hook_error(&name, "afterAdd", e))?;
        }
        Ok(())
    }

    /// Runs `beforeSearch` hooks in registration order, stopping as soon as
    /// one sets [`SearchContext::short_circuit`].
    pub fn run_before_search(&mut self, mut ctx: SearchContext) -> Result<SearchContext> {
        for power in &mut self.powers {
            let name = power.name().to_string();
            ctx = power
                .before_search(ctx)
                .map_err(|e| Self::hook_error(&name, "beforeSearch", e))?;
            if ctx.short_circuit.is_some() {
                break;
            }
        }
        Ok(ctx)
    }

    /// Runs every `afterSearch` hook, in registration order, folding the
    /// result list through each.
    pub fn run_after_search(
        &mut self,
        ctx: &SearchContext,
        mut hits: Vec<SearchHit>,
    ) -> Result<Vec<SearchHit>> {
        for power in &mut self.powers {
            let name = power.name().to_string();
            hits = power
                .after_search(ctx, hits)
                .map_err(|e| Self::hook_error(&name, "afterSearch", e))?;
        }
        Ok(hits)
    }

    /// Runs every `onDelete` hook, in registration order.
    pub fn run_on_delete(&mut self, id: &str) -> Result<()> {
        for power in &mut self.powers {
            let name = power.name().to_string();
            power
                .on_delete(id)
                .map_err(|e| Self::hook_error(&name, "onDelete", e))?;
        }
        Ok(())
    }

    /// Runs every `onClear` hook, in registration order.
    pub fn run_on_clear(&mut self) -> Result<()> {
        for power in &mut self.powers {
            let name = power.name().to_string();
            power
                .on_clear()
                .map_err(|e| Self::hook_error(&name, "onClear", e))?;
        }
        Ok(())
    }

    /// Resolves the active embedder: the last-registered Power (scanning in
    /// reverse) that provides one, or `None` if no Power overrides it.
    #[must_use]
    pub fn resolve_embedder(&self) -> Option<&dyn Embedder> {
        self.powers.iter().rev().find_map(|p| p.embedder())
    }
}
