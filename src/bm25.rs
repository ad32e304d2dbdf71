//! BM25 inverted index.
//!
//! Okapi BM25 scoring over a lowercase word-token index, shared by the
//! retrieval coordinator's companion index and by [`crate::powers::HybridSearch`],
//! which keeps its own independent instance.

use rustc_hash::FxHashMap;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term frequency saturation (default: 1.5).
    pub k1: f32,
    /// Document length normalization (default: 0.75).
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Tokenizes text into lowercase word-tokens.
///
/// Lowercases, replaces runs of non-word/non-whitespace characters with
/// spaces, splits on whitespace, discards tokens of length <= 1. Stateless.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    normalized
        .split_whitespace()
        .filter(|s| s.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
struct DocEntry {
    term_freqs: FxHashMap<String, u32>,
    length: u32,
}

/// Inverted index over tokenized document text, scored with BM25.
#[derive(Debug, Default)]
pub struct Bm25Index {
    params: Bm25Params,
    /// term -> (docId -> term frequency)
    term_index: FxHashMap<String, FxHashMap<String, u32>>,
    /// docId -> unique terms (fast removal)
    doc_terms: FxHashMap<String, Vec<String>>,
    /// docId -> token count
    doc_lengths: FxHashMap<String, u32>,
    /// term -> number of documents containing it
    doc_freq: FxHashMap<String, u32>,
    total_doc_length: u64,
}

impl Bm25Index {
    /// Creates an empty index with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Bm25Params::default())
    }

    /// Creates an empty index with custom parameters.
    #[must_use]
    pub fn with_params(params: Bm25Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Number of documents currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Returns `true` if the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Indexes (or re-indexes) a document's text under `id`.
    pub fn add_document(&mut self, id: &str, text: &str) {
        // Re-indexing an existing id: drop the old postings first so
        // term frequencies and totals stay consistent (spec invariant 9).
        if self.doc_terms.contains_key(id) {
            self.remove_document(id);
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return;
        }

        let mut term_freqs: FxHashMap<String, u32> = FxHashMap::default();
        for token in &tokens {
            *term_freqs.entry(token.clone()).or_insert(0) += 1;
        }

        let doc_length = tokens.len() as u32;
        let terms: Vec<String> = term_freqs.keys().cloned().collect();

        for (term, tf) in &term_freqs {
            let postings = self.term_index.entry(term.clone()).or_default();
            postings.insert(id.to_string(), *tf);
            *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
        }

        self.doc_terms.insert(id.to_string(), terms);
        self.doc_lengths.insert(id.to_string(), doc_length);
        self.total_doc_length += u64::from(doc_length);
    }

    /// Removes a document from the index. Returns `true` if it was present.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(terms) = self.doc_terms.remove(id) else {
            return false;
        };

        for term in &terms {
            if let Some(postings) = self.term_index.get_mut(term) {
                postings.remove(id);
                if postings.is_empty() {
                    self.term_index.remove(term);
                }
            }
            if let Some(df) = self.doc_freq.get_mut(term) {
                *df = df.saturating_sub(1);
                if *df == 0 {
                    self.doc_freq.remove(term);
                }
            }
        }

        if let Some(len) = self.doc_lengths.remove(id) {
            self.total_doc_length = self.total_doc_length.saturating_sub(u64::from(len));
        }

        true
    }

    /// Drops every document.
    pub fn clear(&mut self) {
        self.term_index.clear();
        self.doc_terms.clear();
        self.doc_lengths.clear();
        self.doc_freq.clear();
        self.total_doc_length = 0;
    }

    /// Scores `query` against every indexed document and returns the top
    /// `k` ids by descending BM25 score.
    #[must_use]
    pub fn search(&self, query: &str, k: usize) -> Vec<(String, f32)> {
        let query_terms = tokenize(query);
        let n = self.doc_lengths.len();
        if query_terms.is_empty() || n == 0 {
            return Vec::new();
        }

        let avg_dl = (self.total_doc_length as f32 / n as f32).max(1.0);
        let k1 = self.params.k1;
        let b = self.params.b;

        let idf = |term: &str| -> f32 {
            let df = self.doc_freq.get(term).copied().unwrap_or(0);
            if df == 0 {
                return 0.0;
            }
            let df_f = df as f32;
            let n_f = n as f32;
            ((n_f - df_f + 0.5) / (df_f + 0.5) + 1.0).ln()
        };

        let mut scores: FxHashMap<&str, f32> = FxHashMap::default();
        for term in &query_terms {
            let Some(postings) = self.term_index.get(term) else {
                continue;
            };
            let term_idf = idf(term);
            if term_idf == 0.0 {
                continue;
            }
            for (doc_id, &tf) in postings {
                let dl = self.doc_lengths.get(doc_id).copied().unwrap_or(0) as f32;
                let tf_f = tf as f32;
                let norm = tf_f * (k1 + 1.0) / (tf_f + k1 * (1.0 - b + b * dl / avg_dl));
                *scores.entry(doc_id.as_str()).or_insert(0.0) += term_idf * norm;
            }
        }

        let mut ranked: Vec<(String, f32)> =
            scores.into_iter().map(|(id, s)| (id.to_string(), s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }

    /// Sum of all document lengths. Exposed for invariant checks (spec §8.9).
    #[must_use]
    pub fn total_doc_length(&self) -> u64 {
        self.total_doc_length
    }

    /// Document frequency of `term`. Exposed for invariant checks.
    #[must_use]
    pub fn doc_freq(&self, term: &str) -> usize {
        self.term_index.get(term).map_or(0, std::collections::HashMap::len)
    }
}
