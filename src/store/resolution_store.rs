use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resolution store {0:?} does not exist")]
    Missing(PathBuf),
    #[error("resolution store {path:?} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("resolution store {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("resolution store {path:?} could not be written: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(usize),
    Missing,
    Discarded(StoreError),
}

/// word -> the one lemma chosen for it, mirrored to a JSON file.
#[derive(Debug)]
pub struct ResolutionStore {
    path: PathBuf,
    resolutions: BTreeMap<String, String>,
}

impl ResolutionStore {
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            resolutions: BTreeMap::new(),
        }
    }

    /// Never fails: a missing file gives an empty store, an unreadable or
    /// corrupt one gives an empty store plus the reason it was discarded.
    pub fn open(path: PathBuf) -> (Self, LoadOutcome) {
        match Self::load(&path) {
            Ok(resolutions) => {
                let outcome = LoadOutcome::Loaded(resolutions.len());
                (Self { path, resolutions }, outcome)
            }
            Err(StoreError::Missing(_)) => (Self::empty(path), LoadOutcome::Missing),
            Err(e) => {
                warn!("{}; starting with an empty store", e);
                (Self::empty(path), LoadOutcome::Discarded(e))
            }
        }
    }

    pub fn load(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(path.to_path_buf()));
            }
            Err(e) => {
                return Err(StoreError::Unreadable {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Replaces the file with the full current mapping. The data goes to a
    /// sibling temporary file first and is renamed over the target, so the
    /// file on disk is always either the previous or the new mapping.
    pub fn save(&self) -> Result<(), StoreError> {
        self.write_atomically().map_err(|e| StoreError::Unwritable {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(
            "saved {} resolutions to {:?}",
            self.resolutions.len(),
            self.path
        );
        Ok(())
    }

    fn write_atomically(&self) -> io::Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(directory)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            serde_json::to_writer(&mut writer, &self.resolutions)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn insert(&mut self, word: String, lemma: String) -> Option<String> {
        self.resolutions.insert(word, lemma)
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.resolutions.get(word).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.resolutions.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.resolutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolutions.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
