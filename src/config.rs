//! Engine configuration.
//!
//! The five knobs the engine recognizes at construction time, taken as a
//! plain struct rather than layered from a file or the environment — once
//! the HTTP/transport layer is gone there is nothing left upstream to
//! source configuration from.

/// Dimension of every embedding the engine works with.
pub const DIMENSION: usize = 384;

/// Configuration accepted by [`crate::Engine::with_config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Whether the engine may route search through the HNSW index at all.
    /// When `false`, every search is brute-force regardless of size.
    pub use_ann: bool,
    /// Store size above which search routes through HNSW instead of
    /// brute-force, when `use_ann` is true.
    pub ann_threshold: usize,
    /// HNSW `M`: max neighbors per node above layer 0.
    pub m: usize,
    /// HNSW `efConstruction`: candidate pool width during insertion.
    pub ef_construction: usize,
    /// HNSW `efSearch`: candidate pool width during search.
    pub ef_search: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_ann: true,
            ann_threshold: 2000,
            m: 16,
            ef_construction: 40,
            ef_search: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert!(cfg.use_ann);
        assert_eq!(cfg.ann_threshold, 2000);
        assert_eq!(cfg.m, 16);
        assert_eq!(cfg.ef_construction, 40);
        assert_eq!(cfg.ef_search, 64);
    }
}
