//! Hierarchical Navigable Small World index.
//!
//! A multi-layer proximity graph over unit-norm vectors supporting
//! approximate nearest-neighbor search, following Malkov & Yashunin. Nodes
//! live in an arena keyed by an internal [`NodeId`]; edges are plain id
//! lists rather than pointers, so deletion is a symmetric set operation
//! with no cycle-aware reclamation to worry about.

mod node;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use rustc_hash::FxHashSet;

pub(crate) use node::NodeId;
use node::{HnswNode, OrderedFloat};

use crate::error::{Error, Result};
use crate::vector::cosine_distance;

/// Hierarchical Navigable Small World index over unit-norm vectors of a
/// fixed dimension, keyed by caller-supplied string ids.
pub struct HnswIndex {
    dimension: usize,
    m: usize,
    m_max0: usize,
    ef_construction: usize,
    level_mult: f64,

    nodes: rustc_hash::FxHashMap<NodeId, HnswNode>,
    id_to_node: rustc_hash::FxHashMap<String, NodeId>,
    node_to_id: rustc_hash::FxHashMap<NodeId, String>,
    next_node_id: NodeId,

    entry_point: Option<NodeId>,
    max_layer: usize,
    rng_state: u64,
}

impl HnswIndex {
    /// Creates a new index for vectors of dimension `dimension`.
    #[must_use]
    pub fn new(dimension: usize, m: usize, ef_construction: usize) -> Self {
        Self {
            dimension,
            m,
            m_max0: m * 2,
            ef_construction,
            level_mult: 1.0 / (m as f64).ln(),
            nodes: rustc_hash::FxHashMap::default(),
            id_to_node: rustc_hash::FxHashMap::default(),
            node_to_id: rustc_hash::FxHashMap::default(),
            next_node_id: 0,
            entry_point: None,
            max_layer: 0,
            // Fixed non-zero seed: insertion order, not wall-clock entropy,
            // is what should make layer assignment reproducible (spec §8.11).
            rng_state: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Number of vectors currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `id` is present in the index.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.id_to_node.contains_key(id)
    }

    /// The current entry point's external id, or `None` when empty.
    #[must_use]
    pub fn entry_point_id(&self) -> Option<&str> {
        self.entry_point
            .and_then(|n| self.node_to_id.get(&n))
            .map(String::as_str)
    }

    /// The current max layer (0 when empty).
    #[must_use]
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Returns the neighbor ids of `id` at `layer`, for invariant checks.
    #[must_use]
    pub fn neighbors_of(&self, id: &str, layer: usize) -> Vec<String> {
        let Some(&node_id) = self.id_to_node.get(id) else {
            return Vec::new();
        };
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };
        node.neighbors
            .get(layer)
            .into_iter()
            .flatten()
            .filter_map(|n| self.node_to_id.get(n).cloned())
            .collect()
    }

    /// The level assigned to `id`, if present.
    #[must_use]
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.id_to_node
            .get(id)
            .and_then(|n| self.nodes.get(n))
            .map(|n| n.level)
    }

    /// Draws a random layer: `floor(-ln(U) * mL)` with `U` uniform on `(0, 1]`.
    fn random_level(&mut self) -> usize {
        // xorshift64: simple, deterministic, reproducible from a fixed seed.
        let mut state = self.rng_state;
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state = state;

        // Map to (0, 1]: avoid exact 0 so ln() stays finite.
        let uniform = ((state >> 11) as f64 + 1.0) / ((1u64 << 53) as f64 + 1.0);
        (-uniform.ln() * self.level_mult).floor() as usize
    }

    fn distance(&self, query: &[f32], node_id: NodeId) -> f32 {
        cosine_distance(query, &self.nodes[&node_id].vector)
    }

    /// SEARCH-LAYER: up to `ef` nearest neighbors to `query` within `layer`,
    /// seeded from `entry_points`, sorted by distance ascending.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[NodeId],
        ef: usize,
        layer: usize,
    ) -> Vec<(NodeId, f32)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, u64, NodeId)>> = BinaryHeap::new();
        let mut found: BinaryHeap<(OrderedFloat, u64, NodeId)> = BinaryHeap::new();
        let mut seq: u64 = 0;

        for &ep in entry_points {
            if !self.nodes.contains_key(&ep) || !visited.insert(ep) {
                continue;
            }
            let dist = self.distance(query, ep);
            candidates.push(Reverse((OrderedFloat(dist), seq, ep)));
            found.push((OrderedFloat(dist), seq, ep));
            seq += 1;
        }

        while let Some(Reverse((OrderedFloat(c_dist), _, c_node))) = candidates.pop() {
            let worst = found.peek().map_or(f32::INFINITY, |(d, _, _)| d.0);
            if c_dist > worst && found.len() >= ef {
                break;
            }

            let Some(node) = self.nodes.get(&c_node) else {
                continue;
            };
            let layer_neighbors = node.neighbors.get(layer).cloned().unwrap_or_default();

            for neighbor in layer_neighbors {
                if !visited.insert(neighbor) {
                    continue;
                }
                let dist = self.distance(query, neighbor);
                let worst = found.peek().map_or(f32::INFINITY, |(d, _, _)| d.0);
                if found.len() < ef || dist < worst {
                    candidates.push(Reverse((OrderedFloat(dist), seq, neighbor)));
                    found.push((OrderedFloat(dist), seq, neighbor));
                    seq += 1;
                    if found.len() > ef {
                        found.pop();
                    }
                }
            }
        }

        let mut result: Vec<(NodeId, f32)> =
            found.into_iter().map(|(d, _, n)| (n, d.0)).collect();
        result.sort_by(|a, b| a.1.total_cmp(&b.1));
        result
    }

    fn top1(&self, query: &[f32], entry: NodeId, layer: usize) -> NodeId {
        self.search_layer(query, &[entry], 1, layer)
            .first()
            .map_or(entry, |(id, _)| *id)
    }

    /// Selects the `max_conn` closest candidates (simple nearest-first
    /// selector; no diversity heuristic, per spec).
    fn select_neighbors(candidates: &[(NodeId, f32)], max_conn: usize) -> Vec<NodeId> {
        candidates.iter().take(max_conn).map(|(id, _)| *id).collect()
    }

    /// Connects `neighbor` back to `new_node` at `layer`, pruning to
    /// `max_conn` nearest if the cap is exceeded.
    fn connect_back(&mut self, new_node: NodeId, neighbor: NodeId, layer: usize, max_conn: usize) {
        let Some(n) = self.nodes.get_mut(&neighbor) else {
            return;
        };
        if n.neighbors.len() <= layer {
            n.neighbors.resize(layer + 1, Vec::new());
        }
        if !n.neighbors[layer].contains(&new_node) {
            n.neighbors[layer].push(new_node);
        }

        if n.neighbors[layer].len() > max_conn {
            let neighbor_vec = Arc::clone(&n.vector);
            let candidates = n.neighbors[layer].clone();
            let mut with_dist: Vec<(NodeId, f32)> = candidates
                .iter()
                .map(|&c| (c, cosine_distance(&neighbor_vec, &self.nodes[&c].vector)))
                .collect();
            with_dist.sort_by(|a, b| a.1.total_cmp(&b.1));
            with_dist.truncate(max_conn);
            let pruned: Vec<NodeId> = with_dist.into_iter().map(|(id, _)| id).collect();
            self.nodes.get_mut(&neighbor).unwrap().neighbors[layer] = pruned;
        }
    }

    /// Inserts `(id, vector)`. Fails with [`Error::DuplicateId`] if `id` is
    /// already present, and with [`Error::DimensionMismatch`] if `vector`
    /// is not of length `dimension`.
    pub fn insert(&mut self, id: &str, vector: Arc<[f32]>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if self.id_to_node.contains_key(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }

        let node_id = self.next_node_id;
        self.next_node_id += 1;
        let level = self.random_level();

        self.id_to_node.insert(id.to_string(), node_id);
        self.node_to_id.insert(node_id, id.to_string());

        if self.entry_point.is_none() {
            self.nodes.insert(node_id, HnswNode::new(vector, level));
            self.entry_point = Some(node_id);
            self.max_layer = level;
            return Ok(());
        }

        let query_vec = Arc::clone(&vector);
        self.nodes.insert(node_id, HnswNode::new(vector, level));

        let l = self.max_layer;
        let mut ep = self.entry_point.expect("checked above");

        for layer in ((level + 1)..=l).rev() {
            ep = self.top1(&query_vec, ep, layer);
        }

        let mut ep_set = vec![ep];
        for layer in (0..=level.min(l)).rev() {
            let candidates = self.search_layer(&query_vec, &ep_set, self.ef_construction, layer);
            let max_conn = if layer == 0 { self.m_max0 } else { self.m };
            let selected = Self::select_neighbors(&candidates, max_conn);

            self.nodes.get_mut(&node_id).unwrap().neighbors[layer] = selected.clone();
            for &neighbor in &selected {
                self.connect_back(node_id, neighbor, layer, max_conn);
            }

            // Spec §4.2.3: "set ep = selected for the next layer down" — carry
            // the whole selected set as entry points, not just its closest
            // member, so the next layer's SEARCH-LAYER keeps full breadth.
            if !selected.is_empty() {
                ep_set = selected;
            }
        }

        if level > l {
            self.entry_point = Some(node_id);
            self.max_layer = level;
        }

        Ok(())
    }

    /// Searches for the `k` nearest neighbors of `query`.
    ///
    /// Returns `(id, score)` pairs with `score = 1 - distance`, sorted by
    /// score descending. Empty when the index is empty.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Vec<(String, f32)> {
        let Some(entry) = self.entry_point else {
            return Vec::new();
        };

        let mut ep = entry;
        for layer in (1..=self.max_layer).rev() {
            ep = self.top1(query, ep, layer);
        }

        let candidates = self.search_layer(query, &[ep], ef_search.max(k), 0);
        candidates
            .into_iter()
            .take(k)
            .map(|(id, dist)| (self.node_to_id[&id].clone(), 1.0 - dist))
            .collect()
    }

    /// Removes `id` from the graph. Returns `true` if it was present.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(node_id) = self.id_to_node.remove(id) else {
            return false;
        };
        self.node_to_id.remove(&node_id);
        let Some(node) = self.nodes.remove(&node_id) else {
            return false;
        };

        for (layer, layer_neighbors) in node.neighbors.iter().enumerate() {
            for &neighbor in layer_neighbors {
                if let Some(n) = self.nodes.get_mut(&neighbor) {
                    if let Some(list) = n.neighbors.get_mut(layer) {
                        list.retain(|&x| x != node_id);
                    }
                }
            }
        }

        if self.entry_point == Some(node_id) {
            self.entry_point = self
                .nodes
                .iter()
                .max_by_key(|(nid, n)| (n.level, Reverse(**nid)))
                .map(|(nid, _)| *nid);
            self.max_layer = self
                .entry_point
                .map_or(0, |ep| self.nodes[&ep].level);
        }

        true
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.id_to_node.clear();
        self.node_to_id.clear();
        self.next_node_id = 0;
        self.entry_point = None;
        self.max_layer = 0;
    }
}
