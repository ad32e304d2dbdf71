//! Structural and statistical invariants from the core specification's
//! testable-properties section, driven through the public `lucerna` API.

use lucerna::{Document, Engine, EngineConfig};

fn doc(id: &str, content: &str) -> Document {
    Document::new(id, content)
}

fn seeded_docs(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| doc(&i.to_string(), &format!("synthetic document body number {i} with filler text")))
        .collect()
}

/// Invariant 1: store size tracks `size()`, and HNSW stays in lockstep
/// with the store when `useAnn` is enabled.
#[test]
fn size_matches_document_store() {
    let engine = Engine::new();
    for d in seeded_docs(30) {
        engine.add(vec![d]).unwrap();
    }
    assert_eq!(engine.size(), 30);

    engine.delete("5").unwrap();
    assert_eq!(engine.size(), 29);

    engine.clear().unwrap();
    assert_eq!(engine.size(), 0);
}

/// Invariant 6 + 8: scores are bounded in `[-1, 1]` and sorted descending.
#[test]
fn scores_are_bounded_and_sorted_descending() {
    let engine = Engine::new();
    engine.add(seeded_docs(50)).unwrap();

    let hits = engine.search("synthetic document body number 7", 10).unwrap();
    assert!(!hits.is_empty());
    for w in hits.windows(2) {
        assert!(w[0].score >= w[1].score);
    }
    for h in &hits {
        assert!((-1.0..=1.0).contains(&h.score), "score {} out of range", h.score);
    }
}

/// Invariant 7: self-recall — searching for an indexed document's own
/// content returns that document first with a near-1.0 score.
#[test]
fn self_recall_holds_with_and_without_ann() {
    for use_ann in [true, false] {
        let engine = Engine::with_config(EngineConfig {
            use_ann,
            ann_threshold: 20,
            ..EngineConfig::default()
        });
        engine.add(seeded_docs(100)).unwrap();

        for i in [0, 33, 77, 99] {
            let query = format!("synthetic document body number {i} with filler text");
            let hits = engine.search(&query, 1).unwrap();
            assert_eq!(hits[0].id, i.to_string());
            assert!(hits[0].score > 0.99, "score was {}", hits[0].score);
        }
    }
}

/// Invariant 9: BM25 bookkeeping stays consistent across add/delete churn.
#[test]
fn bm25_consistency_survives_churn() {
    let engine = Engine::new();
    engine.add(seeded_docs(40)).unwrap();
    for i in (0..40).step_by(3) {
        engine.delete(&i.to_string()).unwrap();
    }
    engine.add(vec![doc("new-1", "freshly added content after churn")]).unwrap();

    // No direct accessor for per-doc-length sums from the public API beyond
    // the aggregate; exercise it indirectly via repeated search stability.
    let hits_a = engine.search("freshly added content after churn", 1).unwrap();
    let hits_b = engine.search("freshly added content after churn", 1).unwrap();
    assert_eq!(hits_a, hits_b);
}

/// Invariant 10: `export` -> `clear` -> `import` round-trips size, ids, and
/// search results for a fixed query.
#[test]
fn roundtrip_preserves_size_ids_and_search_results() {
    let engine = Engine::new();
    engine.add(seeded_docs(25)).unwrap();

    let before = engine.search("synthetic document body number 12", 5).unwrap();
    let exported = engine.export();

    engine.clear().unwrap();
    engine.import(exported).unwrap();

    let after = engine.search("synthetic document body number 12", 5).unwrap();
    assert_eq!(engine.size(), 25);
    assert_eq!(before, after);
}

/// Invariant 11: determinism — a fixed insertion order and the
/// deterministic default embedder reproduce identical top-1 results.
#[test]
fn retrieval_is_deterministic_across_independent_engines() {
    let engine_a = Engine::new();
    let engine_b = Engine::new();
    for d in seeded_docs(60) {
        engine_a.add(vec![d.clone()]).unwrap();
        engine_b.add(vec![d]).unwrap();
    }

    let hits_a = engine_a.search("synthetic document body number 41", 5).unwrap();
    let hits_b = engine_b.search("synthetic document body number 41", 5).unwrap();
    assert_eq!(hits_a, hits_b);
}

/// Invariant 12 (reduced scale for fast CI): recall@10 versus exact
/// brute-force stays high for a moderate corpus. The full 5000-doc / 20
/// query benchmark lives in `benches/recall_benchmark.rs` and the
/// `#[ignore]`-gated test below.
#[test]
fn recall_at_10_is_high_for_moderate_corpus() {
    let hnsw_engine = Engine::with_config(EngineConfig {
        ann_threshold: 10,
        ..EngineConfig::default()
    });
    let exact_engine = Engine::with_config(EngineConfig {
        use_ann: false,
        ..EngineConfig::default()
    });

    let docs = seeded_docs(800);
    hnsw_engine.add(docs.clone()).unwrap();
    exact_engine.add(docs).unwrap();

    let mut total_recall = 0.0;
    let queries = 20;
    for i in 0..queries {
        let idx = i * 37 % 800;
        let query = format!("synthetic document body number {idx} with filler text");
        let approx = hnsw_engine.search(&query, 10).unwrap();
        let exact = exact_engine.search(&query, 10).unwrap();

        let exact_ids: std::collections::HashSet<&str> = exact.iter().map(|h| h.id.as_str()).collect();
        let hit_count = approx.iter().filter(|h| exact_ids.contains(h.id.as_str())).count();
        total_recall += hit_count as f64 / 10.0;
    }

    let avg_recall = total_recall / f64::from(queries as u32);
    assert!(avg_recall >= 0.85, "average recall@10 was {avg_recall}");
}

/// Invariant 12, full scale: 5000 documents, 20 queries, matching spec §8
/// exactly. Gated behind `--ignored` since it is slow for routine CI.
#[test]
#[ignore = "slow: 5000-document recall benchmark, run explicitly"]
fn recall_at_10_full_scale() {
    let hnsw_engine = Engine::with_config(EngineConfig {
        ann_threshold: 50,
        ..EngineConfig::default()
    });
    let exact_engine = Engine::with_config(EngineConfig {
        use_ann: false,
        ..EngineConfig::default()
    });

    let docs = seeded_docs(5000);
    hnsw_engine.add(docs.clone()).unwrap();
    exact_engine.add(docs).unwrap();

    let mut total_recall = 0.0;
    let queries = 20;
    for i in 0..queries {
        let idx = i * 233 % 5000;
        let query = format!("synthetic document body number {idx} with filler text");
        let approx = hnsw_engine.search(&query, 10).unwrap();
        let exact = exact_engine.search(&query, 10).unwrap();

        let exact_ids: std::collections::HashSet<&str> = exact.iter().map(|h| h.id.as_str()).collect();
        let hit_count = approx.iter().filter(|h| exact_ids.contains(h.id.as_str())).count();
        total_recall += hit_count as f64 / 10.0;
    }

    let avg_recall = total_recall / f64::from(queries as u32);
    assert!(avg_recall >= 0.92, "average recall@10 was {avg_recall}");
}
