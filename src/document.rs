//! Document store: `id -> (content, metadata, embedding)`.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

/// A document as presented to [`crate::Engine::add`].
#[derive(Debug, Clone)]
pub struct Document {
    /// Caller-supplied id, unique across the store.
    pub id: String,
    /// Document text.
    pub content: String,
    /// Arbitrary metadata.
    pub metadata: Value,
}

impl Document {
    /// Creates a document with empty metadata (`{}`).
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Value::Object(serde_json::Map::new()),
        }
    }

    /// Sets the metadata, builder-style.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A document plus its resolved embedding, as held by the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Document text.
    pub content: String,
    /// Arbitrary metadata.
    pub metadata: Value,
    /// Unit-norm embedding, shared by reference with the HNSW graph.
    pub embedding: Arc<[f32]>,
}

/// A single search result surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Document id.
    pub id: String,
    /// Document text.
    pub content: String,
    /// Arbitrary metadata.
    pub metadata: Value,
    /// Similarity score; higher is better, in `[-1, 1]`.
    pub score: f32,
}

/// An exported `(id, content, metadata, embedding)` tuple — the unit of
/// `export`/`import` round-tripping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportedDocument {
    /// Document id.
    pub id: String,
    /// Document text.
    pub content: String,
    /// Arbitrary metadata.
    pub metadata: Value,
    /// Embedding serialized as a plain float list (transport-agnostic).
    pub embedding: Vec<f32>,
}

/// Maps document id to its stored content, metadata and embedding.
///
/// Uses an [`IndexMap`] so iteration order follows insertion order, which
/// keeps `export` deterministic and matches the teacher crate's preference
/// for order-preserving maps over plain hashmaps wherever iteration order
/// is externally observable.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: IndexMap<String, StoredDocument>,
}

impl DocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            docs: IndexMap::new(),
        }
    }

    /// Number of documents in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns `true` if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Inserts or overwrites a document. Returns the replaced entry, if any.
    pub fn insert(&mut self, id: String, doc: StoredDocument) -> Option<StoredDocument> {
        self.docs.insert(id, doc)
    }

    /// Looks up a document by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoredDocument> {
        self.docs.get(id)
    }

    /// Returns `true` if `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }

    /// Removes a document, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<StoredDocument> {
        // shift_remove preserves the relative order of the remaining
        // documents, matching the spec's export-order determinism.
        self.docs.shift_remove(id)
    }

    /// Drops every document.
    pub fn clear(&mut self) {
        self.docs.clear();
    }

    /// Iterates `(id, doc)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoredDocument)> {
        self.docs.iter()
    }
}
