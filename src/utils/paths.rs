use std::path::{Path, PathBuf};

pub fn get_dataset_path<P: AsRef<Path>>(path: P, dataset: &str) -> PathBuf {
    path.as_ref().join(format!("{}.json", dataset))
}

// the resolution store lives next to its dataset so several datasets can
// keep independent review progress
pub fn get_resolved_store_path<P: AsRef<Path>>(path: P, dataset: &str) -> PathBuf {
    path.as_ref().join(format!("{}_resolved.json", dataset))
}

pub fn get_lemma_word_dictionary_path<P: AsRef<Path>>(path: P, language: &str) -> PathBuf {
    path.as_ref()
        .join(format!("dictionary-{}-lemma-txt.txt", language))
}
pub fn get_word_lemma_dictionary_path<P: AsRef<Path>>(path: P, language: &str) -> PathBuf {
    path.as_ref()
        .join(format!("dictionary-{}-txt-lemma.txt", language))
}
