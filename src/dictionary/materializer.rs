use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    graph::association_graph::AssociationGraph,
    utils::paths::{get_lemma_word_dictionary_path, get_word_lemma_dictionary_path},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedDictionary {
    pub lemma_word_path: PathBuf,
    pub word_lemma_path: PathBuf,
    pub rows: usize,
}

/// The pairs to publish: every stored decision, plus all remaining
/// candidates of graph words nobody has decided on yet.
pub fn final_pairs(
    graph: &AssociationGraph,
    resolutions: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = resolutions
        .iter()
        .map(|(word, lemma)| (word.clone(), lemma.clone()))
        .collect();
    pairs.extend(
        graph
            .flatten()
            .into_iter()
            .filter(|(word, _)| !resolutions.contains_key(word)),
    );
    pairs
}

// lowercase, deduplicate and sort tab-separated rows
fn sorted_rows<'a, I>(pairs: I, lemma_first: bool) -> Vec<String>
where
    I: Iterator<Item = &'a (String, String)>,
{
    let mut rows: Vec<String> = pairs
        .map(|(word, lemma)| {
            let (word, lemma) = (word.to_lowercase(), lemma.to_lowercase());
            if lemma_first {
                format!("{}\t{}", lemma, word)
            } else {
                format!("{}\t{}", word, lemma)
            }
        })
        .collect();
    rows.sort_unstable();
    rows.dedup();
    rows
}

pub fn write_rows<W: Write>(writer: W, rows: &[String]) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for row in rows {
        writer.write_all(row.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `dictionary-<lang>-lemma-txt.txt` (`lemma<TAB>word`) and
/// `dictionary-<lang>-txt-lemma.txt` (`word<TAB>lemma`), each sorted on its
/// own.
pub fn materialize(
    output_directory: &Path,
    language: &str,
    pairs: &[(String, String)],
) -> io::Result<MaterializedDictionary> {
    let lemma_word_path = get_lemma_word_dictionary_path(output_directory, language);
    let word_lemma_path = get_word_lemma_dictionary_path(output_directory, language);

    let lemma_word_rows = sorted_rows(pairs.iter(), true);
    let word_lemma_rows = sorted_rows(pairs.iter(), false);
    write_rows(File::create(&lemma_word_path)?, &lemma_word_rows)?;
    write_rows(File::create(&word_lemma_path)?, &word_lemma_rows)?;

    info!(
        "wrote {} rows to {:?} and {:?}",
        word_lemma_rows.len(),
        lemma_word_path,
        word_lemma_path
    );
    Ok(MaterializedDictionary {
        lemma_word_path,
        word_lemma_path,
        rows: word_lemma_rows.len(),
    })
}
