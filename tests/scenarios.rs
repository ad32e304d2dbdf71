//! Black-box end-to-end scenarios S1-S7 from the core specification,
//! driven entirely through the public `lucerna` API.

use lucerna::{Document, EmbeddingSwap, Engine, EngineConfig, HybridSearch, MetadataFilter, QueryCache};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn doc(id: &str, content: &str) -> Document {
    Document::new(id, content)
}

/// S1: small-corpus exact search.
#[test]
fn s1_small_corpus_exact_search() {
    let engine = Engine::new();
    engine
        .add(vec![
            doc("1", "How to reset your password"),
            doc("2", "Changing your account email address"),
            doc("3", "Setting up two-factor authentication"),
            doc("4", "Deleting your account permanently"),
            doc("5", "Updating your billing and payment info"),
        ])
        .unwrap();

    let hits = engine.search("forgot my login credentials", 3).unwrap();
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores must be non-increasing");
    }

    let valid: HashSet<&str> = ["1", "2", "3", "4", "5"].into_iter().collect();
    for hit in &hits {
        assert!(valid.contains(hit.id.as_str()));
    }
}

/// S2: deletion removes the document from ANN results.
#[test]
fn s2_deletion_removes_from_ann() {
    let engine = Engine::with_config(EngineConfig {
        ann_threshold: 5,
        ..EngineConfig::default()
    });

    for i in 0..20 {
        engine
            .add(vec![doc(&format!("d{i}"), &format!("unique content piece number {i}"))])
            .unwrap();
    }

    assert!(engine.delete("d5").unwrap());
    assert_eq!(engine.size(), 19);

    let hits = engine.search("unique content piece number 5", 20).unwrap();
    assert!(!hits.iter().any(|h| h.id == "d5"));
}

/// S3: export/clear/import round-trips size and search behavior.
#[test]
fn s3_export_clear_import_roundtrip() {
    let engine = Engine::new();
    for i in 0..20 {
        engine
            .add(vec![doc(&format!("{i}"), &format!("sample document number {i}"))])
            .unwrap();
    }

    let exported = engine.export();
    assert_eq!(exported.len(), 20);
    let exported_ids: HashSet<String> = exported.iter().map(|d| d.id.clone()).collect();

    engine.clear().unwrap();
    assert_eq!(engine.size(), 0);

    engine.import(exported).unwrap();
    assert_eq!(engine.size(), 20);

    let roundtrip_ids: HashSet<String> = (0..20).map(|i| engine.get(&i.to_string()).unwrap().id).collect();
    assert_eq!(exported_ids, roundtrip_ids);

    let hits = engine.search("sample document number 5", 5).unwrap();
    assert_eq!(hits.len(), 5);
}

/// S4: pure-keyword ranking via `HybridSearch(alpha=0)`.
#[test]
fn s4_pure_keyword_with_hybrid_search() {
    let engine = Engine::new();
    engine.use_power(HybridSearch::new(0.0)).unwrap();
    engine
        .add(vec![
            doc("match", "zygote cell biology embryo fertilisation"),
            doc("nomatch", "machine learning neural network transformer"),
        ])
        .unwrap();

    let hits = engine.search("zygote", 2).unwrap();
    assert_eq!(hits[0].id, "match");
}

/// S5: `QueryCache` short-circuits a repeated query before it reaches the
/// embedder.
#[test]
fn s5_cache_short_circuit_skips_embedder() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);

    let engine = Engine::new();
    engine
        .use_power(EmbeddingSwap::new(move |texts| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|_| {
                    let mut v = vec![0.0_f32; lucerna::config::DIMENSION];
                    v[0] = 1.0;
                    v
                })
                .collect())
        }))
        .unwrap();
    engine.use_power(QueryCache::new()).unwrap();

    engine
        .add(vec![doc("1", "alpha beta"), doc("2", "gamma delta")])
        .unwrap();

    engine.search("alpha beta", 5).unwrap();
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first > 0);

    engine.search("alpha beta", 5).unwrap();
    let after_second = calls.load(Ordering::SeqCst);
    assert_eq!(after_first, after_second, "second search must not call the embedder");
}

/// S6: `MetadataFilter` excludes unpublished documents.
#[test]
fn s6_metadata_filter_excludes_unpublished() {
    let engine = Engine::new();
    engine
        .use_power(MetadataFilter::new(|m| {
            m.get("published").and_then(|v| v.as_bool()) == Some(true)
        }))
        .unwrap();

    engine
        .add(vec![
            doc("1", "document one").with_metadata(json!({"published": true})),
            doc("2", "document two").with_metadata(json!({"published": true})),
            doc("3", "document three").with_metadata(json!({"published": false})),
        ])
        .unwrap();

    let hits = engine.search("document", 10).unwrap();
    assert!(!hits.is_empty());
    for hit in &hits {
        assert_eq!(hit.metadata["published"], json!(true));
    }
}

/// S7: adaptive routing switches to HNSW above `annThreshold`; both paths
/// must still find a document by exact content match.
#[test]
fn s7_adaptive_routing_both_paths_find_matches() {
    let hnsw_engine = Engine::with_config(EngineConfig {
        ann_threshold: 50,
        ..EngineConfig::default()
    });
    let brute_force_engine = Engine::with_config(EngineConfig {
        use_ann: false,
        ..EngineConfig::default()
    });

    for i in 0..200 {
        let content = format!("distinctive content marker number {i}");
        hnsw_engine.add(vec![doc(&i.to_string(), &content)]).unwrap();
        brute_force_engine.add(vec![doc(&i.to_string(), &content)]).unwrap();
    }

    assert!(hnsw_engine.size() > hnsw_engine.config().ann_threshold);

    for i in [0, 50, 150, 199] {
        let query = format!("distinctive content marker number {i}");
        let hnsw_hits = hnsw_engine.search(&query, 1).unwrap();
        let bf_hits = brute_force_engine.search(&query, 1).unwrap();
        assert_eq!(hnsw_hits[0].id, i.to_string());
        assert_eq!(bf_hits[0].id, i.to_string());
    }
}

#[test]
fn search_on_empty_store_returns_empty() {
    let engine = Engine::new();
    assert!(engine.search("anything", 10).unwrap().is_empty());
}

#[test]
fn delete_of_missing_id_returns_false() {
    let engine = Engine::new();
    assert!(!engine.delete("missing").unwrap());
}

#[test]
fn eject_of_missing_name_returns_false() {
    let engine = Engine::new();
    assert!(!engine.eject("NeverRegistered"));
}
