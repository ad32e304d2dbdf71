//! Fuses dense (semantic) and BM25 (keyword) rankings via Reciprocal Rank
//! Fusion.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::bm25::{Bm25Index, Bm25Params};
use crate::document::{Document, SearchHit};
use crate::powers::{Power, SearchContext};

/// Reciprocal-rank-fusion constant (spec §4.5.4, §9).
const K_RRF: f32 = 60.0;

/// Maintains an independent BM25 index and fuses its keyword ranking with
/// the engine's semantic (dense) ranking via RRF.
///
/// `alpha` controls the blend: `alpha = 1.0` reduces to the semantic
/// ranking, `alpha = 0.0` reduces to the keyword ranking.
pub struct HybridSearch {
    alpha: f32,
    bm25: Bm25Index,
    /// `(content, metadata)` captured at `afterAdd`, used to hydrate
    /// results that BM25 surfaces but the semantic ranking did not.
    captured: IndexMap<String, (String, Value)>,
}

impl HybridSearch {
    /// Creates a `HybridSearch` with the given fusion weight and default
    /// BM25 parameters (`k1 = 1.5`, `b = 0.75`).
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self::with_params(alpha, Bm25Params::default())
    }

    /// Creates a `HybridSearch` with a custom fusion weight and BM25
    /// parameters.
    #[must_use]
    pub fn with_params(alpha: f32, bm25_params: Bm25Params) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            bm25: Bm25Index::with_params(bm25_params),
            captured: IndexMap::new(),
        }
    }

    /// The configured fusion weight.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    fn candidate_k(top_k: usize) -> usize {
        top_k.max(10) * 3
    }

    fn fuse(&self, ctx: &SearchContext, semantic: &[SearchHit]) -> Vec<SearchHit> {
        let candidate_k = Self::candidate_k(ctx.top_k);
        let keyword = self.bm25.search(&ctx.query, candidate_k);

        let mut fused: FxHashMap<&str, f32> = FxHashMap::default();
        let mut order: Vec<&str> = Vec::new();

        for (rank, hit) in semantic.iter().enumerate() {
            let score = self.alpha / (K_RRF + (rank + 1) as f32);
            if fused.insert(hit.id.as_str(), score).is_none() {
                order.push(hit.id.as_str());
            }
        }
        for (rank, (id, _)) in keyword.iter().enumerate() {
            let contribution = (1.0 - self.alpha) / (K_RRF + (rank + 1) as f32);
            let entry = fused.entry(id.as_str()).or_insert(0.0);
            *entry += contribution;
            if !order.contains(&id.as_str()) {
                order.push(id.as_str());
            }
        }

        let mut ranked: Vec<(&str, f32)> = order.into_iter().map(|id| (id, fused[id])).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(ctx.top_k);

        ranked
            .into_iter()
            .filter_map(|(id, score)| self.hydrate(id, score, semantic))
            .collect()
    }

    fn hydrate(&self, id: &str, score: f32, semantic: &[SearchHit]) -> Option<SearchHit> {
        if let Some(hit) = semantic.iter().find(|h| h.id == id) {
            return Some(SearchHit {
                score,
                ..hit.clone()
            });
        }
        self.captured.get(id).map(|(content, metadata)| SearchHit {
            id: id.to_string(),
            content: content.clone(),
            metadata: metadata.clone(),
            score,
        })
    }
}

impl Power for HybridSearch {
    fn name(&self) -> &str {
        "HybridSearch"
    }

    fn after_add(&mut self, docs: &[(Document, Vec<f32>)]) -> anyhow::Result<()> {
        for (doc, _embedding) in docs {
            self.bm25.add_document(&doc.id, &doc.content);
            self.captured
                .insert(doc.id.clone(), (doc.content.clone(), doc.metadata.clone()));
        }
        Ok(())
    }

    fn on_delete(&mut self, id: &str) -> anyhow::Result<()> {
        self.bm25.remove_document(id);
        self.captured.shift_remove(id);
        Ok(())
    }

    fn on_clear(&mut self) -> anyhow::Result<()> {
        self.bm25.clear();
        self.captured.clear();
        Ok(())
    }

    fn after_search(
        &mut self,
        ctx: &SearchContext,
        hits: Vec<SearchHit>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        Ok(self.fuse(ctx, &hits))
    }
}
