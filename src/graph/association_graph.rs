use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use rustc_hash::{FxHashMap, FxHashSet};

/// word -> candidate lemmas.
///
/// A word never maps to itself and a word without candidates is absent, so
/// every stored set is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationGraph {
    entries: FxHashMap<String, FxHashSet<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStatistics {
    pub total: usize,
    pub unambiguous: usize,
    pub ambiguous: usize,
}

impl GraphStatistics {
    pub fn ambiguity_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.ambiguous as f64 / self.total as f64 * 100.0
    }
}

impl AssociationGraph {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut graph = Self::new();
        for (word, lemma) in pairs {
            graph.insert(word, lemma);
        }
        graph
    }

    // Only the reduction engine builds graphs wholesale; it upholds the
    // non-empty and no-self-mapping invariants itself.
    pub(crate) fn from_entries(entries: FxHashMap<String, FxHashSet<String>>) -> Self {
        debug_assert!(
            entries
                .iter()
                .all(|(word, lemmas)| !lemmas.is_empty() && !lemmas.contains(word))
        );
        Self { entries }
    }

    pub fn insert(&mut self, word: String, lemma: String) -> bool {
        if word == lemma {
            return false;
        }
        self.entries.entry(word).or_default().insert(lemma)
    }

    pub fn candidates(&self, word: &str) -> Option<&FxHashSet<String>> {
        self.entries.get(word)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FxHashSet<String>)> {
        self.entries.iter()
    }

    pub fn unambiguous(&self) -> Vec<(&str, &str)> {
        let mut unambiguous: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter(|(_, lemmas)| lemmas.len() == 1)
            .filter_map(|(word, lemmas)| {
                lemmas
                    .iter()
                    .next()
                    .map(|lemma| (word.as_str(), lemma.as_str()))
            })
            .collect();
        unambiguous.sort_unstable();
        unambiguous
    }

    pub fn ambiguous(&self) -> Vec<(&str, Vec<&str>)> {
        let mut ambiguous: Vec<(&str, Vec<&str>)> = self
            .entries
            .iter()
            .filter(|(_, lemmas)| lemmas.len() > 1)
            .map(|(word, lemmas)| {
                let mut lemmas: Vec<&str> = lemmas.iter().map(String::as_str).collect();
                lemmas.sort_unstable();
                (word.as_str(), lemmas)
            })
            .collect();
        ambiguous.sort_unstable();
        ambiguous
    }

    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .entries
            .iter()
            .flat_map(|(word, lemmas)| {
                lemmas
                    .iter()
                    .map(move |lemma| (word.clone(), lemma.clone()))
            })
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub fn statistics(&self) -> GraphStatistics {
        let total = self.entries.len();
        let unambiguous = self
            .entries
            .values()
            .filter(|lemmas| lemmas.len() == 1)
            .count();
        GraphStatistics {
            total,
            unambiguous,
            ambiguous: total - unambiguous,
        }
    }

    pub fn save_json<W: Write>(&self, writer: W) -> io::Result<()> {
        let sorted: BTreeMap<&str, BTreeSet<&str>> = self
            .entries
            .iter()
            .map(|(word, lemmas)| {
                (
                    word.as_str(),
                    lemmas.iter().map(String::as_str).collect::<BTreeSet<&str>>(),
                )
            })
            .collect();
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, &sorted)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> io::Result<()> {
        self.save_json(File::create(path)?)
    }

    /// Entries that would break the graph invariants (self-mappings, empty
    /// candidate lists) are dropped on load.
    pub fn load_from_path(path: &Path) -> io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_reader(reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut graph = Self::new();
        for (word, lemmas) in raw {
            for lemma in lemmas {
                graph.insert(word.clone(), lemma);
            }
        }
        Ok(graph)
    }
}
