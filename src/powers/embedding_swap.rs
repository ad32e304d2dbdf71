//! Wraps a caller-supplied embedding function as a Power.

use crate::embedder::Embedder;
use crate::error::Result;
use crate::powers::Power;

struct FnEmbedder<F>(F);

impl<F> Embedder for FnEmbedder<F>
where
    F: Fn(&[&str]) -> Result<Vec<Vec<f32>>> + Send + Sync,
{
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (self.0)(texts)
    }
}

/// Overrides the engine's embedder with a caller-supplied function.
///
/// Registered under a fixed name so a given `EmbeddingSwap` instance is a
/// single-valued resource: two `EmbeddingSwap`s need distinct
/// [`EmbeddingSwap::named`] names, and whichever is registered last (by
/// registry position, scanned in reverse) wins embedder resolution (spec
/// §4.5.3, §9).
pub struct EmbeddingSwap {
    name: String,
    embedder: Box<dyn Embedder>,
}

impl EmbeddingSwap {
    /// Creates an `EmbeddingSwap` under the default name `"EmbeddingSwap"`.
    pub fn new(f: impl Fn(&[&str]) -> Result<Vec<Vec<f32>>> + Send + Sync + 'static) -> Self {
        Self::named("EmbeddingSwap", f)
    }

    /// Creates an `EmbeddingSwap` under a caller-chosen name, allowing
    /// multiple simultaneous embedder overrides in one registry.
    pub fn named(
        name: impl Into<String>,
        f: impl Fn(&[&str]) -> Result<Vec<Vec<f32>>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            embedder: Box::new(FnEmbedder(f)),
        }
    }
}

impl Power for EmbeddingSwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn embedder(&self) -> Option<&dyn Embedder> {
        Some(self.embedder.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powers::PowerRegistry;

    #[test]
    fn last_registered_embedder_wins() {
        let mut reg = PowerRegistry::new();
        reg.use_power(Box::new(EmbeddingSwap::named("first", |texts| {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        })))
        .unwrap();
        reg.use_power(Box::new(EmbeddingSwap::named("second", |texts| {
            Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
        })))
        .unwrap();

        let embedder = reg.resolve_embedder().unwrap();
        let v = embedder.embed(&["x"]).unwrap();
        assert_eq!(v[0], vec![0.0, 1.0]);
    }

    #[test]
    fn no_embedder_power_resolves_to_none() {
        let reg = PowerRegistry::new();
        assert!(reg.resolve_embedder().is_none());
    }
}
