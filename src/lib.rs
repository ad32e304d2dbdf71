//! In-memory semantic search engine: HNSW dense retrieval, adaptively
//! blended with BM25 keyword ranking via Reciprocal Rank Fusion, behind a
//! small extension pipeline ("Powers").
//!
//! ```
//! use lucerna::{Document, Engine};
//!
//! let engine = Engine::new();
//! engine
//!     .add(vec![Document::new("1", "reset your password")])
//!     .unwrap();
//! let hits = engine.search("forgot my login", 5).unwrap();
//! assert_eq!(hits[0].id, "1");
//! ```
//!
//! The engine is a library, not a service: no listener, no wire protocol,
//! no persisted on-disk layout. Callers own the process boundary; the
//! embedding application is expected to install its own `tracing`
//! subscriber if it wants logs.

pub mod bm25;
pub mod config;
pub mod document;
pub mod embedder;
mod engine;
pub mod error;
mod hnsw;
pub mod powers;
pub mod vector;

pub use config::EngineConfig;
pub use document::{Document, ExportedDocument, SearchHit};
pub use embedder::{Embedder, HashEmbedder};
pub use engine::Engine;
pub use error::{Error, Result};
pub use powers::{EmbeddingSwap, HybridSearch, MetadataFilter, Power, QueryCache};
