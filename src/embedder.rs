//! The embedding seam and a deterministic default implementation.
//!
//! spec.md treats the real embedder as an external collaborator and only
//! specifies the capability the core consumes: given texts, produce
//! unit-norm vectors of dimension [`crate::config::DIMENSION`]. `HashEmbedder`
//! is a toy, deterministic default so the crate is usable and testable
//! without wiring up a model; production callers are expected to replace it
//! via [`crate::powers::EmbeddingSwap`] or a custom [`Embedder`].

use crate::config::DIMENSION;
use crate::error::Result;

/// Capability the engine consumes to turn text into unit-norm vectors.
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts in one call, returning one vector per input
    /// in the same order. Every returned vector must have dimension
    /// [`DIMENSION`] and be unit-norm.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic hash-based bag-of-words embedder.
///
/// Tokenizes on whitespace/punctuation (same rule as [`crate::bm25`]),
/// hashes each token with FNV-1a into one of `DIMENSION` buckets, sums the
/// per-token contributions, then L2-normalizes the result. Two calls with
/// the same input always produce the same vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    fn embed_one(text: &str) -> Vec<f32> {
        let mut acc = vec![0.0_f32; DIMENSION];
        for token in crate::bm25::tokenize(text) {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
            for byte in token.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3); // FNV prime
            }
            let bucket = (hash as usize) % DIMENSION;
            // Sign bit spreads mass across +/- so near-duplicate tokens
            // don't all pile onto the same positive corner.
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            acc[bucket] += sign;
        }

        let norm = acc.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut acc {
                *x /= norm;
            }
        } else {
            // Empty/degenerate text: fall back to a fixed unit vector so
            // the unit-norm invariant holds even for "".
            acc[0] = 1.0;
        }
        acc
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}
