use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, atomic::AtomicBool},
};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::config::{Config, ConfigError},
    dictionary::{
        lookup::{DictionaryLookup, LookupError},
        materializer::{MaterializedDictionary, final_pairs, materialize},
    },
    graph::{
        association_graph::{AssociationGraph, GraphStatistics},
        reduction::{ReductionEngine, ReductionReport},
    },
    pair_store::{
        normalizer::PairNormalizer,
        pair_store::{IngestStats, PairStore},
        registry::LanguageRegistry,
        sources::collect_directory_sources,
    },
    resolver::{
        key_source::KeySource,
        session::{DisambiguationSession, SessionSummary},
        view::SessionView,
    },
    store::resolution_store::{LoadOutcome, ResolutionStore},
    utils::paths::{get_dataset_path, get_resolved_store_path, get_word_lemma_dictionary_path},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("dataset {path:?} is not available, run build first: {source}")]
    DatasetUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub ingest: IngestStats,
    pub pairs: usize,
    pub statistics: GraphStatistics,
    pub reduction: ReductionReport,
    pub dataset_path: PathBuf,
}

pub struct LemmaPipeline {
    config: Config,
    normalizer: PairNormalizer,
    registry: LanguageRegistry,
    reduced: Option<AssociationGraph>,
}

impl LemmaPipeline {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let normalizer = config.normalization.build_normalizer()?;
        Ok(Self {
            config,
            normalizer,
            registry: LanguageRegistry::default(),
            reduced: None,
        })
    }

    pub fn with_registry(mut self, registry: LanguageRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn dataset_path(&self) -> PathBuf {
        get_dataset_path(&self.config.data_dir, &self.config.dataset)
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        get_resolved_store_path(&self.config.data_dir, &self.config.dataset)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        get_word_lemma_dictionary_path(&self.config.output_dir, &self.config.language)
    }

    /// Reads every source file of the configured language plus its
    /// registered seed pairs.
    pub fn ingest(&self) -> PairStore {
        let mut store = PairStore::new(self.normalizer.clone());
        let language_dir = Path::new(&self.config.source_dir).join(&self.config.language);
        match collect_directory_sources(&language_dir) {
            Ok(sources) => {
                for source in &sources {
                    info!("processing {:?}", source.path());
                    store.add_source(source);
                }
            }
            Err(e) => warn!("{}", e),
        }
        store.add_language_seeds(&self.registry, &self.config.language);
        store
    }

    pub fn build(&mut self) -> Result<BuildReport, PipelineError> {
        let pair_store = self.ingest();
        let ingest = pair_store.stats();
        let pairs = pair_store.len();
        let graph = pair_store.into_graph();

        let engine = ReductionEngine::new(self.config.reduction());
        let (reduced, reduction) = engine.reduce(graph);
        if !reduction.is_converged() {
            warn!(
                "{} words are not fully reduced after {} passes, e.g. {:?}",
                reduction.unstable_words.len(),
                reduction.passes,
                &reduction.unstable_words[..reduction.unstable_words.len().min(10)]
            );
        }

        let dataset_path = self.dataset_path();
        fs::create_dir_all(&self.config.data_dir)
            .and_then(|_| reduced.save_to_path(&dataset_path))
            .map_err(|e| PipelineError::Write {
                path: dataset_path.clone(),
                source: e,
            })?;
        info!("saved reduced dataset to {:?}", dataset_path);

        let report = BuildReport {
            ingest,
            pairs,
            statistics: reduced.statistics(),
            reduction,
            dataset_path,
        };
        self.reduced = Some(reduced);
        Ok(report)
    }

    pub fn reduced_graph(&mut self) -> Result<&AssociationGraph, PipelineError> {
        if self.reduced.is_none() {
            let path = self.dataset_path();
            let graph = AssociationGraph::load_from_path(&path)
                .map_err(|e| PipelineError::DatasetUnavailable { path, source: e })?;
            self.reduced = Some(graph);
        }
        self.reduced
            .as_ref()
            .ok_or_else(|| PipelineError::DatasetUnavailable {
                path: self.dataset_path(),
                source: io::Error::new(io::ErrorKind::NotFound, "no dataset loaded"),
            })
    }

    pub fn statistics(&mut self) -> Result<GraphStatistics, PipelineError> {
        Ok(self.reduced_graph()?.statistics())
    }

    pub fn open_store(&self, view: &mut dyn SessionView) -> ResolutionStore {
        let (store, outcome) = ResolutionStore::open(self.resolved_store_path());
        match outcome {
            LoadOutcome::Loaded(count) => info!("{} earlier resolutions loaded", count),
            LoadOutcome::Missing => info!("no earlier resolutions, starting fresh"),
            LoadOutcome::Discarded(e) => view.show_warning(&format!(
                "Could not load {:?} ({}), starting with empty data.",
                store.path(),
                e
            )),
        }
        store
    }

    pub fn resolve<K: KeySource, V: SessionView>(
        &mut self,
        keys: &mut K,
        view: &mut V,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SessionSummary, PipelineError> {
        let graph = self.reduced_graph()?.clone();
        let store = self.open_store(view);
        let mut session = DisambiguationSession::new(graph, store);
        if let Some(flag) = cancel {
            session = session.with_cancel_flag(flag);
        }
        Ok(session.run(keys, view))
    }

    pub fn export(&mut self) -> Result<MaterializedDictionary, PipelineError> {
        let resolutions = match ResolutionStore::load(&self.resolved_store_path()) {
            Ok(resolutions) => resolutions,
            Err(e) => {
                warn!("{}; exporting unresolved candidates only", e);
                Default::default()
            }
        };
        let pairs = final_pairs(self.reduced_graph()?, &resolutions);
        let output_dir = PathBuf::from(&self.config.output_dir);
        fs::create_dir_all(&output_dir)
            .and_then(|_| materialize(&output_dir, &self.config.language, &pairs))
            .map_err(|e| PipelineError::Write {
                path: output_dir.clone(),
                source: e,
            })
    }

    pub fn lookup(&self) -> Result<DictionaryLookup, PipelineError> {
        Ok(DictionaryLookup::load(&self.dictionary_path())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{
        key_source::{InputToken, ScriptedKeySource},
        session::SessionExit,
        view::TerminalView,
    };
    use tempfile::TempDir;

    fn config_in(root: &Path) -> Config {
        Config {
            source_dir: root.join("sources").display().to_string(),
            data_dir: root.join("data").display().to_string(),
            output_dir: root.join("out").display().to_string(),
            ..Config::default()
        }
    }

    fn write_sources(root: &Path) {
        let fr = root.join("sources").join("fr");
        fs::create_dir_all(&fr).unwrap();
        fs::write(
            fr.join("lemmas.txt"),
            "chien\tchiens\nchienne\tchien\nchien\tchienne\nsuivre\tsuis\nêtre\tsuis\n",
        )
        .unwrap();
        fs::write(fr.join("broken.json"), "{").unwrap();
    }

    #[test]
    fn test_end_to_end_build_resolve_export_lookup() {
        let root = TempDir::new().unwrap();
        write_sources(root.path());
        let mut pipeline = LemmaPipeline::new(config_in(root.path())).unwrap();

        let report = pipeline.build().unwrap();
        assert_eq!(report.ingest.failed_sources, 1);
        assert!(report.reduction.is_converged());
        assert!(report.dataset_path.exists());
        // chiennes and chiens point into the chien/chienne pair, suis has two roots
        assert_eq!(report.statistics.ambiguous, 3);

        let mut keys = ScriptedKeySource::new([
            InputToken::Enter,
            InputToken::Enter,
            InputToken::Char('2'),
            InputToken::Enter,
        ]);
        let mut view = TerminalView::new(Vec::new(), false);
        let summary = pipeline.resolve(&mut keys, &mut view, None).unwrap();
        assert_eq!(summary.exit, SessionExit::Completed);
        assert_eq!(summary.progress.resolved, 3);

        let written = pipeline.export().unwrap();
        let lookup = pipeline.lookup().unwrap();
        assert_eq!(written.word_lemma_path, pipeline.dictionary_path());
        assert_eq!(lookup.lemmatize("chiens"), Some("chien"));
        assert_eq!(lookup.lemmatize("suis"), Some("être"));
        assert_eq!(lookup.lemmatize("baux"), Some("bail"));
    }

    #[test]
    fn test_later_process_loads_saved_dataset() {
        let root = TempDir::new().unwrap();
        write_sources(root.path());
        LemmaPipeline::new(config_in(root.path()))
            .unwrap()
            .build()
            .unwrap();

        let mut fresh = LemmaPipeline::new(config_in(root.path())).unwrap();
        let stats = fresh.statistics().unwrap();
        assert_eq!(stats.ambiguous, 3);
    }

    #[test]
    fn test_resolve_without_dataset_fails() {
        let root = TempDir::new().unwrap();
        let mut pipeline = LemmaPipeline::new(config_in(root.path())).unwrap();
        let mut keys = ScriptedKeySource::default();
        let mut view = TerminalView::new(Vec::new(), false);
        assert!(matches!(
            pipeline.resolve(&mut keys, &mut view, None),
            Err(PipelineError::DatasetUnavailable { .. })
        ));
    }

    #[test]
    fn test_corrupt_store_is_reported_to_reviewer() {
        let root = TempDir::new().unwrap();
        write_sources(root.path());
        let mut pipeline = LemmaPipeline::new(config_in(root.path())).unwrap();
        pipeline.build().unwrap();
        fs::write(pipeline.resolved_store_path(), "garbage").unwrap();

        let mut keys = ScriptedKeySource::new([InputToken::Char('q')]);
        let mut view = TerminalView::new(Vec::new(), false);
        let summary = pipeline.resolve(&mut keys, &mut view, None).unwrap();
        assert_eq!(summary.exit, SessionExit::Quit);
        let text = String::from_utf8(view.into_inner()).unwrap();
        assert!(text.contains("starting with empty data"));
    }

    #[test]
    fn test_custom_registry_supplies_seed_pairs() {
        let root = TempDir::new().unwrap();
        let mut registry = LanguageRegistry::new();
        registry.register(
            "en",
            Box::new(|| {
                vec![
                    ("mice".to_string(), "mouse".to_string()),
                    ("geese".to_string(), "goose".to_string()),
                ]
            }),
        );
        let config = Config {
            language: "en".to_string(),
            dataset: "en".to_string(),
            ..config_in(root.path())
        };
        let mut pipeline = LemmaPipeline::new(config).unwrap().with_registry(registry);

        let report = pipeline.build().unwrap();
        assert_eq!(report.pairs, 2);
        assert_eq!(report.statistics.unambiguous, 2);
        assert!(report.dataset_path.ends_with("en.json"));
    }

    #[test]
    fn test_lookup_before_export_is_missing() {
        let root = TempDir::new().unwrap();
        let pipeline = LemmaPipeline::new(config_in(root.path())).unwrap();
        assert!(matches!(
            pipeline.lookup(),
            Err(PipelineError::Lookup(LookupError::Missing(_)))
        ));
    }
}
