use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::graph::association_graph::AssociationGraph;

// Enough for the chain depth seen in the French lexicons
pub const DEFAULT_REDUCTION_PASSES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionConfig {
    pub passes: usize,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            passes: DEFAULT_REDUCTION_PASSES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionReport {
    pub passes: usize,
    pub unstable_words: Vec<String>,
}

impl ReductionReport {
    pub fn is_converged(&self) -> bool {
        self.unstable_words.is_empty()
    }
}

pub struct ReductionEngine {
    config: ReductionConfig,
}

impl ReductionEngine {
    pub fn new(config: ReductionConfig) -> Self {
        Self { config }
    }

    /// Runs the configured number of passes, then one extra pass whose
    /// result is only used to report words that are not fully reduced.
    pub fn reduce(&self, graph: AssociationGraph) -> (AssociationGraph, ReductionReport) {
        let mut graph = graph;
        for pass in 0..self.config.passes {
            graph = reduce_once(&graph);
            debug!("reduction pass {} done, {} words", pass + 1, graph.len());
        }
        let next = reduce_once(&graph);
        let report = ReductionReport {
            passes: self.config.passes,
            unstable_words: unstable_words(&graph, &next),
        };
        info!(
            "reduced {} words in {} passes, {} still unstable",
            graph.len(),
            report.passes,
            report.unstable_words.len()
        );
        (graph, report)
    }
}

// c and its only candidate point at nothing but each other
fn is_closed_pair(graph: &AssociationGraph, candidate: &str) -> bool {
    let Some(partners) = graph.candidates(candidate) else {
        return false;
    };
    if partners.len() != 1 {
        return false;
    }
    partners.iter().all(|partner| {
        graph
            .candidates(partner)
            .is_some_and(|back| back.len() == 1 && back.contains(candidate))
    })
}

/// Dereferences one hop for every word.
///
/// A candidate that is not itself a word is a root and is kept. Otherwise it
/// is replaced by its own candidates minus the word being reduced. A
/// candidate on a closed pair (`a -> b`, `b -> a`, nothing else) is kept as
/// well, so such pairs are stable. When every candidate only leads back to
/// the word, the word keeps its current candidates.
pub fn reduce_once(graph: &AssociationGraph) -> AssociationGraph {
    let mut next: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for (word, candidates) in graph.iter() {
        let mut reduced: FxHashSet<String> = FxHashSet::default();
        for candidate in candidates {
            match graph.candidates(candidate) {
                Some(roots) => {
                    reduced.extend(roots.iter().filter(|root| *root != word).cloned());
                    if is_closed_pair(graph, candidate) {
                        reduced.insert(candidate.clone());
                    }
                }
                None => {
                    reduced.insert(candidate.clone());
                }
            }
        }
        if reduced.is_empty() {
            reduced = candidates.clone();
        }
        next.insert(word.clone(), reduced);
    }
    AssociationGraph::from_entries(next)
}

pub fn unstable_words(before: &AssociationGraph, after: &AssociationGraph) -> Vec<String> {
    let mut words: Vec<String> = before
        .iter()
        .filter(|(word, lemmas)| after.candidates(word) != Some(*lemmas))
        .map(|(word, _)| word.clone())
        .collect();
    words.sort_unstable();
    words
}
