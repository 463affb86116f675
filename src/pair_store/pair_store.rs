use rustc_hash::FxHashSet;
use tracing::{info, warn};

use crate::{
    graph::association_graph::AssociationGraph,
    pair_store::{
        normalizer::PairNormalizer,
        registry::LanguageRegistry,
        sources::{PairSource, RawPair},
    },
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub failed_sources: usize,
}

// Normalized, deduplicated (word, lemma) pairs. Order carries no meaning.
pub struct PairStore {
    normalizer: PairNormalizer,
    pairs: FxHashSet<(String, String)>,
    stats: IngestStats,
}

impl PairStore {
    pub fn new(normalizer: PairNormalizer) -> Self {
        Self {
            normalizer,
            pairs: FxHashSet::default(),
            stats: IngestStats::default(),
        }
    }

    pub fn add_pair(&mut self, word: &str, lemma: &str) -> bool {
        match self.normalizer.normalize(word, lemma) {
            Ok(pair) => {
                if self.pairs.insert(pair) {
                    self.stats.accepted += 1;
                    true
                } else {
                    self.stats.duplicates += 1;
                    false
                }
            }
            Err(_) => {
                self.stats.rejected += 1;
                false
            }
        }
    }

    pub fn extend<I: IntoIterator<Item = RawPair>>(&mut self, pairs: I) -> usize {
        let mut added = 0;
        for (word, lemma) in pairs {
            if self.add_pair(&word, &lemma) {
                added += 1;
            }
        }
        added
    }

    /// A source that cannot be read contributes nothing; the failure is
    /// logged and the rest of the corpus is still ingested.
    pub fn add_source(&mut self, source: &dyn PairSource) -> usize {
        match source.read_pairs() {
            Ok(pairs) => {
                let read = pairs.len();
                let added = self.extend(pairs);
                info!(
                    "{}: {} pairs read, {} new pairs kept",
                    source.name(),
                    read,
                    added
                );
                added
            }
            Err(e) => {
                self.stats.failed_sources += 1;
                warn!("{}", e);
                0
            }
        }
    }

    pub fn add_language_seeds(&mut self, registry: &LanguageRegistry, language: &str) -> usize {
        match registry.supplier(language) {
            Some(supplier) => {
                let added = self.extend(supplier());
                info!("{} seed pairs kept for language {}", added, language);
                added
            }
            None => {
                warn!("no seed pairs registered for language {}", language);
                0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn contains(&self, word: &str, lemma: &str) -> bool {
        self.pairs.contains(&(word.to_string(), lemma.to_string()))
    }

    pub fn into_graph(self) -> AssociationGraph {
        AssociationGraph::from_pairs(self.pairs)
    }
}
