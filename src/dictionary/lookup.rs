use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("dictionary file {0:?} doesn't exist")]
    Missing(PathBuf),
    #[error("dictionary file {path:?} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("dictionary file {path:?} is not valid: line {line} has no tab")]
    InvalidLine { path: PathBuf, line: usize },
}

#[derive(Debug, Clone, Default)]
pub struct DictionaryLookup {
    lemmas: FxHashMap<String, FxHashSet<String>>,
}

impl DictionaryLookup {
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        if !path.is_file() {
            return Err(LookupError::Missing(path.to_path_buf()));
        }
        let io_error = |source| LookupError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_error)?);
        let mut lookup = Self::default();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.is_empty() {
                continue;
            }
            let Some((word, lemma)) = line.split_once('\t') else {
                return Err(LookupError::InvalidLine {
                    path: path.to_path_buf(),
                    line: i + 1,
                });
            };
            lookup
                .lemmas
                .entry(word.to_string())
                .or_default()
                .insert(lemma.to_string());
        }
        Ok(lookup)
    }

    pub fn get(&self, word: &str) -> Option<&FxHashSet<String>> {
        self.lemmas.get(word)
    }

    pub fn lemmatize(&self, word: &str) -> Option<&str> {
        let lemmas = self.lemmas.get(word)?;
        if lemmas.len() == 1 {
            lemmas.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}
