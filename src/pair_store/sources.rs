use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use bzip2::read::BzDecoder;
use thiserror::Error;
use tracing::{debug, warn};

pub type RawPair = (String, String);

const MLEX_CLITIC_TAGS: &[&str] = &["cla", "cln", "cld", "clr", "clar", "cldr", "çaimp"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source {path:?} is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source {path:?} could not be parsed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait PairSource {
    fn name(&self) -> String;
    fn read_pairs(&self) -> Result<Vec<RawPair>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `lemma<TAB>text` per line
    Lemmatization,
    Mlex,
    /// JSON object `text -> lemma`
    JsonMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Bzip2,
    Zstd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
    format: SourceFormat,
    compression: Compression,
}

impl FileSource {
    pub fn new(path: PathBuf, format: SourceFormat, compression: Compression) -> Self {
        Self {
            path,
            format,
            compression,
        }
    }

    /// Picks the adapter from the file name, e.g. `lexicon.mlex.bz2`.
    /// Returns `None` for files no adapter understands.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let (stem, compression) = if let Some(stem) = file_name.strip_suffix(".bz2") {
            (stem, Compression::Bzip2)
        } else if let Some(stem) = file_name.strip_suffix(".zst") {
            (stem, Compression::Zstd)
        } else {
            (file_name, Compression::None)
        };
        let format = match stem.rsplit_once('.')?.1 {
            "txt" => SourceFormat::Lemmatization,
            "mlex" => SourceFormat::Mlex,
            "json" => SourceFormat::JsonMap,
            _ => return None,
        };
        Some(Self::new(path.to_path_buf(), format, compression))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_reader(&self) -> io::Result<Box<dyn BufRead>> {
        let file = File::open(&self.path)?;
        Ok(match self.compression {
            Compression::None => Box::new(BufReader::new(file)),
            Compression::Bzip2 => Box::new(BufReader::new(BzDecoder::new(file))),
            Compression::Zstd => Box::new(BufReader::new(zstd::stream::read::Decoder::new(file)?)),
        })
    }

    fn unavailable(&self, source: io::Error) -> SourceError {
        SourceError::Unavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl PairSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_pairs(&self) -> Result<Vec<RawPair>, SourceError> {
        let reader = self.open_reader().map_err(|e| self.unavailable(e))?;
        match self.format {
            SourceFormat::Lemmatization => {
                parse_lemmatization_rows(reader).map_err(|e| self.unavailable(e))
            }
            SourceFormat::Mlex => parse_mlex_rows(reader).map_err(|e| self.unavailable(e)),
            SourceFormat::JsonMap => {
                let map: BTreeMap<String, String> =
                    serde_json::from_reader(reader).map_err(|e| SourceError::Parse {
                        path: self.path.clone(),
                        source: e,
                    })?;
                Ok(map
                    .into_iter()
                    .map(|(text, lemma)| (text.trim().to_string(), lemma.trim().to_string()))
                    .collect())
            }
        }
    }
}

// Feeds every line that is valid UTF-8 to `on_row`; undecodable lines are
// skipped one by one instead of failing the file.
fn for_each_row<R: BufRead>(mut reader: R, mut on_row: impl FnMut(&str)) -> io::Result<()> {
    let mut buffer = Vec::new();
    let mut line_no = 0usize;
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        line_no += 1;
        match std::str::from_utf8(&buffer) {
            Ok(line) => on_row(line.trim_end_matches(['\n', '\r'])),
            Err(_) => debug!("skipping line {} which is not valid utf-8", line_no),
        }
    }
}

pub fn parse_lemmatization_rows<R: BufRead>(reader: R) -> io::Result<Vec<RawPair>> {
    let mut pairs = Vec::new();
    for_each_row(reader, |line| {
        if line.is_empty() {
            return;
        }
        if let Some((lemma, text)) = line.split_once('\t') {
            pairs.push((text.trim().to_string(), lemma.trim().to_string()));
        }
    })?;
    Ok(pairs)
}

pub fn parse_mlex_rows<R: BufRead>(reader: R) -> io::Result<Vec<RawPair>> {
    let mut pairs = Vec::new();
    for_each_row(reader, |line| {
        let columns: Vec<&str> = line.trim().split('\t').collect();
        let candidates = match columns.len() {
            n if n >= 5 => vec![(columns[0], columns[4]), (columns[2], columns[4])],
            3 | 4 => vec![(columns[0], columns[2])],
            _ => return,
        };
        for (word, lemma) in candidates {
            if word.starts_with(['_', '-'])
                || word.contains('_')
                || MLEX_CLITIC_TAGS.contains(&lemma)
            {
                continue;
            }
            pairs.push((word.trim().to_string(), lemma.trim().to_string()));
        }
    })?;
    Ok(pairs)
}

/// Recursively lists every file under `dir_path` that a source adapter
/// understands, in path order.
pub fn collect_directory_sources(dir_path: &Path) -> Result<Vec<FileSource>, SourceError> {
    let mut sources = Vec::new();
    let mut entries: Vec<PathBuf> = fs::read_dir(dir_path)
        .map_err(|e| SourceError::Unavailable {
            path: dir_path.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            match collect_directory_sources(&path) {
                Ok(mut nested) => sources.append(&mut nested),
                Err(e) => warn!("{}", e),
            }
        } else if let Some(source) = FileSource::from_path(&path) {
            sources.push(source);
        } else {
            debug!("ignoring {:?}: no adapter for this file type", path);
        }
    }
    Ok(sources)
}
