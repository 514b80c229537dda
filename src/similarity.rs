//! Similarity collaborator interface and the shared candidate prefilter.
//!
//! Embedding lookups are an injected capability so the engine can run
//! against a real vector index in production and a deterministic stub in
//! tests. The nearest-neighbor prefilter keeps the duplicate and
//! contradiction rules sub-quadratic: it is built once per validation run
//! and shared by both rules.

use std::collections::{BTreeSet, HashSet};

use crate::block::SpecBlock;

/// Similarity scores supplied by the embedding collaborator.
///
/// Scores are expected in `[0, 1]`. `nearest` returns up to `k` neighbors
/// ordered by descending score and may include stale identifiers; the
/// prefilter drops anything not present in the current corpus snapshot.
pub trait SimilarityProvider: Send + Sync {
    fn similarity(&self, a: &SpecBlock, b: &SpecBlock) -> f32;
    fn nearest(&self, block: &SpecBlock, k: usize) -> Vec<(String, f32)>;
}

/// One unordered candidate pair; `a < b` by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub a: String,
    pub b: String,
    pub score: f32,
}

/// Deduplicated candidate pairs from the nearest-neighbor prefilter.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    pairs: Vec<CandidatePair>,
}

impl CandidateIndex {
    /// Run the prefilter over the corpus snapshot. Each block contributes its
    /// `k` nearest neighbors; pairs are canonically ordered by identifier so
    /// `(a, b)` and `(b, a)` collapse into one entry.
    pub fn build(blocks: &[SpecBlock], provider: &dyn SimilarityProvider, k: usize) -> Self {
        let known: HashSet<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        let mut seen = BTreeSet::new();
        let mut pairs = Vec::new();

        for block in blocks {
            for (other_id, score) in provider.nearest(block, k) {
                if other_id == block.id || !known.contains(other_id.as_str()) {
                    continue;
                }
                let (a, b) = if block.id < other_id {
                    (block.id.clone(), other_id)
                } else {
                    (other_id, block.id.clone())
                };
                if seen.insert((a.clone(), b.clone())) {
                    pairs.push(CandidatePair { a, b, score });
                }
            }
        }

        pairs.sort_by(|x, y| (&x.a, &x.b).cmp(&(&y.a, &y.b)));
        Self { pairs }
    }

    pub fn pairs(&self) -> &[CandidatePair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Deterministic token-overlap similarity over block content.
///
/// Default provider so the engine works without an external embedding
/// service; also the stub used throughout the test suite.
pub struct JaccardProvider {
    corpus: Vec<(String, HashSet<String>)>,
}

impl JaccardProvider {
    pub fn new(blocks: &[SpecBlock]) -> Self {
        Self {
            corpus: blocks
                .iter()
                .map(|b| (b.id.clone(), tokenize(&b.content)))
                .collect(),
        }
    }
}

impl SimilarityProvider for JaccardProvider {
    fn similarity(&self, a: &SpecBlock, b: &SpecBlock) -> f32 {
        jaccard(&tokenize(&a.content), &tokenize(&b.content))
    }

    fn nearest(&self, block: &SpecBlock, k: usize) -> Vec<(String, f32)> {
        let target = tokenize(&block.content);
        let mut scored: Vec<(String, f32)> = self
            .corpus
            .iter()
            .filter(|(id, _)| *id != block.id)
            .map(|(id, tokens)| (id.clone(), jaccard(&target, tokens)))
            .collect();

        // Descending score, identifier as the deterministic tiebreak.
        scored.sort_by(|x, y| {
            y.1.partial_cmp(&x.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| x.0.cmp(&y.0))
        });
        scored.truncate(k);
        scored
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f32;
    let union = a.union(b).count() as f32;
    intersection / union
}
