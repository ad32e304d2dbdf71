//! The retrieval coordinator: routes `add`/`search`/`delete`/`clear` across
//! the document store, HNSW index, and Powers pipeline.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::bm25::Bm25Index;
use crate::config::{EngineConfig, DIMENSION};
use crate::document::{Document, DocumentStore, ExportedDocument, SearchHit, StoredDocument};
use crate::embedder::{Embedder, HashEmbedder};
use crate::error::{Error, Result};
use crate::hnsw::HnswIndex;
use crate::powers::{Power, PowerRegistry, SearchContext};

struct EngineState {
    store: DocumentStore,
    hnsw: HnswIndex,
    /// Companion BM25 index the coordinator itself maintains, independent
    /// of any BM25 state a `HybridSearch` Power keeps (spec §3). Currently
    /// exposed only for invariant checks (spec §8.9) — ranking fusion is
    /// the `HybridSearch` Power's responsibility.
    bm25: Bm25Index,
    powers: PowerRegistry,
}

/// A process-resident semantic search engine: HNSW dense retrieval,
/// optionally fused with BM25 keyword ranking through the Powers pipeline.
///
/// Implementations SHOULD allow multiple independent engines (spec §9); an
/// `Engine` is a plain value, not a process-wide singleton — wrap it in an
/// `Arc` to share it across threads, which the internal `RwLock` makes safe.
pub struct Engine {
    config: EngineConfig,
    default_embedder: HashEmbedder,
    state: RwLock<EngineState>,
}

impl Engine {
    /// Creates an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let state = EngineState {
            store: DocumentStore::new(),
            hnsw: HnswIndex::new(DIMENSION, config.m, config.ef_construction),
            bm25: Bm25Index::new(),
            powers: PowerRegistry::new(),
        };
        Self {
            config,
            default_embedder: HashEmbedder,
            state: RwLock::new(state),
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    fn embed(&self, state: &EngineState, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embedder: &dyn Embedder = state
            .powers
            .resolve_embedder()
            .unwrap_or(&self.default_embedder);
        embedder.embed(texts).map_err(Error::Embedder)
    }

    /// Adds documents to the store.
    ///
    /// Runs `beforeAdd` hooks, embeds the (possibly hook-transformed)
    /// content in a single batch call, writes each `(doc, vector)` pair to
    /// the store and, when `useAnn` is enabled, into the HNSW index
    /// (silently skipping ids already present there so re-import is
    /// idempotent), then runs `afterAdd` hooks. Adding an id that already
    /// exists overwrites the document-store entry; the HNSW node, if any,
    /// keeps the old vector (spec §9 open question (a)).
    ///
    /// # Errors
    ///
    /// Returns an error if a `beforeAdd`/`afterAdd` hook fails, the
    /// embedder fails, or a resolved vector has the wrong dimension.
    #[tracing::instrument(skip(self, docs), fields(count = docs.len()))]
    pub fn add(&self, docs: Vec<Document>) -> Result<()> {
        let mut state = self.state.write();
        let docs = state.powers.run_before_add(docs)?;

        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        let vectors = self.embed(&state, &contents)?;

        let mut with_vectors: Vec<(Document, Vec<f32>)> = Vec::with_capacity(docs.len());
        for (doc, vector) in docs.into_iter().zip(vectors) {
            let embedding: Arc<[f32]> = Arc::from(vector.clone());
            state.store.insert(
                doc.id.clone(),
                StoredDocument {
                    content: doc.content.clone(),
                    metadata: doc.metadata.clone(),
                    embedding: Arc::clone(&embedding),
                },
            );
            state.bm25.add_document(&doc.id, &doc.content);
            if self.config.use_ann && !state.hnsw.contains(&doc.id) {
                state.hnsw.insert(&doc.id, embedding)?;
            }
            with_vectors.push((doc, vector));
        }

        state.powers.run_after_add(&with_vectors)?;
        tracing::debug!(added = with_vectors.len(), "add complete");
        Ok(())
    }

    /// Exact brute-force search: scores every stored vector against `query`
    /// in parallel (spec §4.4's adaptive-routing fallback below
    /// `annThreshold`, or always when `useAnn` is disabled).
    fn brute_force(state: &EngineState, query: &[f32], k: usize) -> Vec<(String, f32)> {
        use rayon::prelude::*;

        let entries: Vec<(&String, &StoredDocument)> = state.store.iter().collect();
        let mut scored: Vec<(String, f32)> = entries
            .par_iter()
            .map(|(id, doc)| ((*id).clone(), crate::vector::dot(query, &doc.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }

    fn hydrate(state: &EngineState, ranked: Vec<(String, f32)>) -> Vec<SearchHit> {
        ranked
            .into_iter()
            .filter_map(|(id, score)| {
                state.store.get(&id).map(|doc| SearchHit {
                    id,
                    content: doc.content.clone(),
                    metadata: doc.metadata.clone(),
                    score,
                })
            })
            .collect()
    }

    /// Searches for the `k` nearest documents to `query`.
    ///
    /// Runs `beforeSearch` hooks (any of which may short-circuit retrieval
    /// entirely), embeds the query, routes to HNSW or brute-force
    /// depending on store size and configuration, then runs `afterSearch`
    /// hooks. Returns an empty list when the store is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a hook fails or the embedder fails.
    #[tracing::instrument(skip(self, query), fields(k))]
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let mut state = self.state.write();

        let ctx = SearchContext {
            query: query.to_string(),
            top_k: k,
            short_circuit: None,
        };
        let ctx = state.powers.run_before_search(ctx)?;
        if let Some(hits) = ctx.short_circuit.clone() {
            tracing::trace!("search short-circuited by a Power");
            return Ok(hits);
        }

        let qvec = self.embed(&state, &[ctx.query.as_str()])?.remove(0);

        let use_hnsw = self.config.use_ann && state.store.len() > self.config.ann_threshold;
        let ranked = if use_hnsw {
            state.hnsw.search(&qvec, k, self.config.ef_search)
        } else {
            Self::brute_force(&state, &qvec, k)
        };
        tracing::trace!(use_hnsw, "routed search");

        let hits = Self::hydrate(&state, ranked);
        let hits = state.powers.run_after_search(&ctx, hits)?;
        Ok(hits)
    }

    /// Removes a document by id. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if an `onDelete` hook fails.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write();
        let Some(_) = state.store.remove(id) else {
            return Ok(false);
        };
        state.bm25.remove_document(id);
        if self.config.use_ann {
            state.hnsw.delete(id);
        }
        state.powers.run_on_delete(id)?;
        Ok(true)
    }

    /// Removes every document.
    ///
    /// # Errors
    ///
    /// Returns an error if an `onClear` hook fails.
    #[tracing::instrument(skip(self))]
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write();
        state.store.clear();
        state.hnsw.clear();
        state.bm25.clear();
        state.powers.run_on_clear()?;
        Ok(())
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn size(&self) -> usize {
        self.state.read().store.len()
    }

    /// Looks up a document by id, without its embedding.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Document> {
        self.state.read().store.get(id).map(|doc| Document {
            id: id.to_string(),
            content: doc.content.clone(),
            metadata: doc.metadata.clone(),
        })
    }

    /// Exports every document as an ordered `(id, content, metadata,
    /// embedding)` sequence, in store (insertion) order.
    #[must_use]
    pub fn export(&self) -> Vec<ExportedDocument> {
        self.state
            .read()
            .store
            .iter()
            .map(|(id, doc)| ExportedDocument {
                id: id.clone(),
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                embedding: doc.embedding.to_vec(),
            })
            .collect()
    }

    /// Replaces all current state with `docs`.
    ///
    /// Clears the document store, HNSW index, and every Power's own state
    /// (via `onClear`), writes each entry into the store and HNSW (skipping
    /// `beforeAdd`), then runs `afterAdd` hooks so Powers such as
    /// `HybridSearch` rebuild their own state from the imported documents.
    /// Imported embeddings are trusted to already be unit-norm.
    ///
    /// # Errors
    ///
    /// Returns an error if an `onClear`/`afterAdd` hook fails or an
    /// embedding has the wrong dimension.
    #[tracing::instrument(skip(self, docs), fields(count = docs.len()))]
    pub fn import(&self, docs: Vec<ExportedDocument>) -> Result<()> {
        let mut state = self.state.write();
        state.store.clear();
        state.hnsw.clear();
        state.bm25.clear();
        state.powers.run_on_clear()?;

        let mut with_vectors: Vec<(Document, Vec<f32>)> = Vec::with_capacity(docs.len());
        for entry in docs {
            let embedding: Arc<[f32]> = Arc::from(entry.embedding.clone());
            state.store.insert(
                entry.id.clone(),
                StoredDocument {
                    content: entry.content.clone(),
                    metadata: entry.metadata.clone(),
                    embedding: Arc::clone(&embedding),
                },
            );
            state.bm25.add_document(&entry.id, &entry.content);
            if self.config.use_ann && !state.hnsw.contains(&entry.id) {
                state.hnsw.insert(&entry.id, embedding)?;
            }
            with_vectors.push((
                Document {
                    id: entry.id,
                    content: entry.content,
                    metadata: entry.metadata,
                },
                entry.embedding,
            ));
        }

        state.powers.run_after_add(&with_vectors)?;
        tracing::debug!(imported = with_vectors.len(), "import complete");
        Ok(())
    }

    /// Registers a Power.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePower`] if a Power with the same name is
    /// already registered.
    pub fn use_power(&self, power: impl Power + 'static) -> Result<()> {
        let result = self.state.write().powers.use_power(Box::new(power));
        if let Err(e) = &result {
            tracing::warn!(error = %e, "rejected duplicate Power registration");
        }
        result
    }

    /// Removes a Power by name. Returns `true` if one was removed.
    pub fn eject(&self, name: &str) -> bool {
        self.state.write().powers.eject(name)
    }

    /// Names of registered Powers, in registration order.
    #[must_use]
    pub fn powers(&self) -> Vec<String> {
        self.state.read().powers.names()
    }

    /// Sum of all document lengths in the coordinator's companion BM25
    /// index. Exposed for invariant checks (spec §8.9).
    #[must_use]
    pub fn bm25_total_doc_length(&self) -> u64 {
        self.state.read().bm25.total_doc_length()
    }

    /// Document frequency of `term` in the coordinator's companion BM25
    /// index. Exposed for invariant checks (spec §8.9).
    #[must_use]
    pub fn bm25_doc_freq(&self, term: &str) -> usize {
        self.state.read().bm25.doc_freq(term)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
